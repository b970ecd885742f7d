use serde::{Deserialize, Serialize};

use ragsearch_core::types::{Chunk, ChunkId, DocId, Document};

/// A row of the `documents` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: DocId,
    pub filename: String,
    pub doc_type: String,
    pub category: Option<String>,
    pub created_at: String,
    pub metadata_json: Option<String>,
}

impl DocumentRecord {
    pub fn new(doc_id: impl Into<DocId>, filename: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            filename: filename.into(),
            doc_type: doc_type.into(),
            category: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            metadata_json: None,
        }
    }

    /// Record for a prepared text document. Tags go into `metadata_json`.
    pub fn from_document(doc: &Document) -> Self {
        let mut record = Self::new(doc.doc_id.clone(), doc.title.clone(), "txt");
        if !doc.tags.is_empty() {
            record.metadata_json = serde_json::to_string(&serde_json::json!({ "tags": doc.tags })).ok();
        }
        record
    }
}

/// A row of the `chunks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk_id: ChunkId,
    pub doc_id: DocId,
    pub chunk_index: usize,
    pub text: String,
}

impl From<&Chunk> for StoredChunk {
    fn from(c: &Chunk) -> Self {
        Self { chunk_id: c.chunk_id.clone(), doc_id: c.parent_id.clone(), chunk_index: c.chunk_index, text: c.text.clone() }
    }
}

/// Canonical row count against full-text document count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub canonical_chunks: u64,
    pub indexed_chunks: u64,
}

impl SyncReport {
    pub fn is_consistent(&self) -> bool { self.canonical_chunks == self.indexed_chunks }
}
