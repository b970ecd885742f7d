//! Binary blob for a [`FlatIndex`].
//!
//! Layout (little endian):
//! `magic[8] | metric u8 | dim u32 | len u64 | build_id[32] | rows f32 * dim * len | blake3[32]`
//! The trailing digest covers every preceding byte.

use ragsearch_core::types::Metric;
use ragsearch_core::{Error, Result};

use crate::flat::FlatIndex;

const MAGIC: &[u8; 8] = b"RAGFLAT1";
const HEADER_LEN: usize = 8 + 1 + 4 + 8 + 32;
const DIGEST_LEN: usize = 32;

pub fn persist(index: &FlatIndex, build_id: &blake3::Hash) -> Result<Vec<u8>> {
    let dim = header_dim(index.dim())?;
    let len = u64::try_from(index.len()).map_err(|_| Error::InvalidArgument(format!("{} vectors do not fit the blob header", index.len())))?;
    let raw = index.raw();
    let mut out = Vec::with_capacity(HEADER_LEN + raw.len() * 4 + DIGEST_LEN);
    out.extend_from_slice(MAGIC);
    out.push(metric_tag(index.metric()));
    out.extend_from_slice(&dim.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(build_id.as_bytes());
    for x in raw { out.extend_from_slice(&x.to_le_bytes()); }
    let digest = blake3::hash(&out);
    out.extend_from_slice(digest.as_bytes());
    Ok(out)
}

/// The dimension as stored in the header. Dimensions beyond `u32::MAX` cannot be persisted.
pub fn header_dim(dim: usize) -> Result<u32> {
    u32::try_from(dim).map_err(|_| Error::InvalidArgument(format!("dimension {dim} does not fit the blob header")))
}

pub fn restore(bytes: &[u8]) -> Result<(FlatIndex, blake3::Hash)> {
    if bytes.len() < HEADER_LEN + DIGEST_LEN || &bytes[..8] != MAGIC {
        return Err(corrupt("not a flat index blob"));
    }
    let (body, digest) = bytes.split_at(bytes.len() - DIGEST_LEN);
    if blake3::hash(body).as_bytes() != digest {
        return Err(corrupt("checksum mismatch"));
    }
    let metric = metric_from_tag(body[8])?;
    let dim = u32::from_le_bytes(array(&body[9..13])) as usize;
    let len = u64::from_le_bytes(array(&body[13..21])) as usize;
    let build_id = blake3::Hash::from_bytes(array(&body[21..HEADER_LEN]));
    let payload = &body[HEADER_LEN..];
    let expected = dim.checked_mul(len).and_then(|n| n.checked_mul(4));
    if expected != Some(payload.len()) {
        return Err(corrupt("payload size does not match header"));
    }
    let data = payload.chunks_exact(4).map(|b| f32::from_le_bytes(array(b))).collect();
    Ok((FlatIndex::from_raw(metric, dim, data)?, build_id))
}

fn metric_tag(metric: Metric) -> u8 {
    match metric {
        Metric::L2 => 0,
        Metric::Cosine => 1,
    }
}

fn metric_from_tag(tag: u8) -> Result<Metric> {
    match tag {
        0 => Ok(Metric::L2),
        1 => Ok(Metric::Cosine),
        other => Err(corrupt(&format!("unknown metric tag {other}"))),
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

fn corrupt(what: &str) -> Error {
    Error::ArtifactMismatch(format!("index blob: {what}"))
}
