use std::collections::BTreeMap;

use ragsearch_core::types::ChunkIdentity;
use ragsearch_core::{Error, Result};

/// Position → chunk identity, built in the same order as the paired [`crate::FlatIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    records: Vec<ChunkIdentity>,
}

impl MetadataStore {
    pub fn build(records: Vec<ChunkIdentity>) -> Self {
        Self { records }
    }

    /// Accept a mapping keyed by ordinal. Keys must be exactly `0..len`.
    pub fn from_mapping(mapping: BTreeMap<usize, ChunkIdentity>) -> Result<Self> {
        let mut records = Vec::with_capacity(mapping.len());
        for (expected, (position, record)) in mapping.into_iter().enumerate() {
            if position != expected {
                return Err(Error::ArtifactMismatch(format!("metadata has a gap: expected position {expected}, found {position}")));
            }
            records.push(record);
        }
        Ok(Self { records })
    }

    pub fn to_mapping(&self) -> BTreeMap<usize, ChunkIdentity> {
        self.records.iter().cloned().enumerate().collect()
    }

    pub fn get(&self, position: usize) -> Result<&ChunkIdentity> {
        self.records.get(position).ok_or(Error::Lookup { position, len: self.records.len() })
    }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &ChunkIdentity> { self.records.iter() }
}
