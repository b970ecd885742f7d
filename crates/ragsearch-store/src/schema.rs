use rusqlite::Connection;

use ragsearch_core::Result;

use crate::storage_err;

/// Create the canonical tables if they do not exist yet.
///
/// Chunk text lives only here; the full-text index is derived from it.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS documents (
            doc_id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            doc_type TEXT NOT NULL,
            category TEXT,
            created_at TEXT NOT NULL,
            metadata_json TEXT
        );
        CREATE TABLE IF NOT EXISTS chunks (
            chunk_id TEXT PRIMARY KEY,
            doc_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            FOREIGN KEY (doc_id) REFERENCES documents(doc_id)
        );
        CREATE INDEX IF NOT EXISTS idx_chunks_doc ON chunks(doc_id, chunk_index);",
    )
    .map_err(storage_err)
}
