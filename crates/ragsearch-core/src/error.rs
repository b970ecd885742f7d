use thiserror::Error;

use crate::types::Metric;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot build an index from zero vectors")]
    EmptyIndex,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unknown metric '{0}' (expected 'l2' or 'cosine')")]
    UnknownMetric(String),

    #[error("No index has been built for metric '{0}'")]
    IndexNotBuilt(Metric),

    /// A vector position with no metadata record. Always a consistency bug.
    #[error("Metadata lookup failed: position {position} outside 0..{len}")]
    Lookup { position: usize, len: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Full-text sync transaction failed: {0}")]
    SyncTransaction(String),

    #[error("Index artifacts do not belong together: {0}")]
    ArtifactMismatch(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Text index error: {0}")]
    TextIndex(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
