//! A flat index and its metadata, built, stored and loaded as one unit.
//!
//! On disk a pair is `flat_<metric>.idx` + `meta_<metric>.json`. Both carry a
//! `build_id`: the blake3 digest of the vectors and the identity records.
//! Loading recomputes the digest and refuses a blob and metadata file that do
//! not come from the same build.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ragsearch_core::types::{ChunkIdentity, Metric, SearchResult};
use ragsearch_core::{Error, Result};

use crate::blob;
use crate::flat::FlatIndex;
use crate::metadata::MetadataStore;

#[derive(Debug, Serialize, Deserialize)]
struct MetadataFile {
    build_id: String,
    metric: Metric,
    dim: usize,
    built_at: String,
    entries: BTreeMap<usize, ChunkIdentity>,
}

#[derive(Debug, Clone)]
pub struct IndexPair {
    index: FlatIndex,
    metadata: MetadataStore,
    build_id: blake3::Hash,
    built_at: String,
}

impl IndexPair {
    pub fn new(index: FlatIndex, metadata: MetadataStore) -> Result<Self> {
        if index.len() != metadata.len() {
            return Err(Error::ArtifactMismatch(format!("index holds {} vectors but metadata holds {} records", index.len(), metadata.len())));
        }
        let build_id = digest(&index, &metadata);
        Ok(Self { index, metadata, build_id, built_at: chrono::Utc::now().to_rfc3339() })
    }

    pub fn metric(&self) -> Metric { self.index.metric() }
    pub fn dim(&self) -> usize { self.index.dim() }
    pub fn len(&self) -> usize { self.index.len() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }
    pub fn build_id(&self) -> String { self.build_id.to_hex().to_string() }
    pub fn built_at(&self) -> &str { &self.built_at }
    pub fn index(&self) -> &FlatIndex { &self.index }
    pub fn metadata(&self) -> &MetadataStore { &self.metadata }

    /// Nearest neighbours of `query_vec`, resolved to chunk identities.
    ///
    /// A position without metadata means the pair is corrupt; it is logged and
    /// fails the whole query.
    pub fn query(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let neighbors = self.index.query(query_vec, top_k)?;
        let mut results = Vec::with_capacity(neighbors.len());
        for n in neighbors {
            let info = self.metadata.get(n.position).map_err(|e| {
                tracing::error!(metric = %self.metric(), build_id = %self.build_id.to_hex(), position = n.position, error = %e, "vector index and metadata out of step");
                e
            })?;
            results.push(SearchResult {
                chunk_id: info.chunk_id.clone(),
                parent_id: info.parent_id.clone(),
                chunk_index: info.chunk_index,
                title: info.title.clone(),
                score: n.score,
            });
        }
        Ok(results)
    }

    pub fn index_path(dir: &Path, metric: Metric) -> PathBuf { dir.join(format!("flat_{metric}.idx")) }
    pub fn metadata_path(dir: &Path, metric: Metric) -> PathBuf { dir.join(format!("meta_{metric}.json")) }

    /// Write both files through temp files in `dir`, then rename them into place.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let meta = MetadataFile {
            build_id: self.build_id(),
            metric: self.metric(),
            dim: self.dim(),
            built_at: self.built_at.clone(),
            entries: self.metadata.to_mapping(),
        };
        let mut blob_tmp = tempfile::NamedTempFile::new_in(dir)?;
        blob_tmp.write_all(&blob::persist(&self.index, &self.build_id)?)?;
        blob_tmp.as_file().sync_all()?;
        let mut meta_tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut meta_tmp, &meta)?;
        meta_tmp.as_file().sync_all()?;

        let metric = self.metric();
        blob_tmp.persist(Self::index_path(dir, metric)).map_err(|e| Error::Io(e.error))?;
        meta_tmp.persist(Self::metadata_path(dir, metric)).map_err(|e| Error::Io(e.error))?;
        tracing::info!(metric = %metric, build_id = %self.build_id.to_hex(), vectors = self.len(), dir = %dir.display(), "saved index pair");
        Ok(())
    }

    pub fn load(dir: &Path, metric: Metric) -> Result<Self> {
        let index_path = Self::index_path(dir, metric);
        let meta_path = Self::metadata_path(dir, metric);
        match (index_path.exists(), meta_path.exists()) {
            (true, true) => {}
            (false, false) => return Err(Error::IndexNotBuilt(metric)),
            (has_blob, _) => {
                let missing = if has_blob { &meta_path } else { &index_path };
                return Err(Error::ArtifactMismatch(format!("half of the {metric} pair is missing: {}", missing.display())));
            }
        }
        let (index, blob_build_id) = blob::restore(&fs::read(&index_path)?)?;
        let meta: MetadataFile = serde_json::from_slice(&fs::read(&meta_path)?)?;
        if index.metric() != metric || meta.metric != metric {
            return Err(Error::ArtifactMismatch(format!("expected {metric} artifacts, found blob={} metadata={}", index.metric(), meta.metric)));
        }
        if meta.build_id != blob_build_id.to_hex().as_str() {
            return Err(Error::ArtifactMismatch(format!("blob build {} does not match metadata build {}", blob_build_id.to_hex(), meta.build_id)));
        }
        if meta.dim != index.dim() {
            return Err(Error::ArtifactMismatch(format!("metadata says dim {} but blob has {}", meta.dim, index.dim())));
        }
        let metadata = MetadataStore::from_mapping(meta.entries)?;
        if metadata.len() != index.len() {
            return Err(Error::ArtifactMismatch(format!("index holds {} vectors but metadata holds {} records", index.len(), metadata.len())));
        }
        let build_id = digest(&index, &metadata);
        if build_id != blob_build_id {
            return Err(Error::ArtifactMismatch(format!("content digest {} does not match stamped build {}", build_id.to_hex(), meta.build_id)));
        }
        tracing::info!(metric = %metric, build_id = %build_id.to_hex(), vectors = index.len(), "loaded index pair");
        Ok(Self { index, metadata, build_id, built_at: meta.built_at })
    }
}

fn digest(index: &FlatIndex, metadata: &MetadataStore) -> blake3::Hash {
    let mut h = blake3::Hasher::new();
    h.update(index.metric().as_str().as_bytes());
    h.update(&(index.dim() as u64).to_le_bytes());
    h.update(&(index.len() as u64).to_le_bytes());
    for x in index.raw() { h.update(&x.to_le_bytes()); }
    for rec in metadata.iter() {
        for field in [rec.chunk_id.as_str(), rec.parent_id.as_str(), rec.title.as_str()] {
            h.update(&(field.len() as u64).to_le_bytes());
            h.update(field.as_bytes());
        }
        h.update(&(rec.chunk_index as u64).to_le_bytes());
    }
    h.finalize()
}
