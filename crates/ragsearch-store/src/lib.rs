//! ragsearch-store
//!
//! Canonical SQLite chunk collection (`documents` + `chunks`) and the
//! consistency hook that keeps the full-text index in step with it.

pub mod records;
pub mod schema;
pub mod store;
pub mod sync;

pub use records::{DocumentRecord, StoredChunk, SyncReport};
pub use store::ChunkStore;
pub use sync::ConsistencySync;

use ragsearch_core::Error;

pub(crate) fn storage_err(e: rusqlite::Error) -> Error {
    Error::Storage(e.to_string())
}
