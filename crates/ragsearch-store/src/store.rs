use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use ragsearch_core::traits::TextIndexer;
use ragsearch_core::types::{Chunk, Document, SyncEvent, TextHit};
use ragsearch_core::{Error, Result};

use crate::records::{DocumentRecord, StoredChunk, SyncReport};
use crate::sync::{self, ConsistencySync};
use crate::{schema, storage_err};

/// Canonical chunk collection in SQLite, with the full-text index kept in step.
///
/// All writes go through one connection mutex, so an update's remove + add
/// can never interleave with another write.
pub struct ChunkStore {
    conn: Mutex<Connection>,
    sync: ConsistencySync,
}

impl ChunkStore {
    pub fn open(db_path: &Path, text: Arc<dyn TextIndexer>) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path).map_err(storage_err)?;
        tracing::debug!(path = %db_path.display(), "opened chunk store");
        Self::with_connection(conn, text)
    }

    pub fn open_in_memory(text: Arc<dyn TextIndexer>) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(storage_err)?, text)
    }

    fn with_connection(conn: Connection, text: Arc<dyn TextIndexer>) -> Result<Self> {
        schema::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn), sync: ConsistencySync::new(text) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| Error::Storage(e.to_string()))
    }

    /// Run `f` in a SQL transaction, propagate its events, then commit.
    ///
    /// Failure before the commit drops the transaction (rolled back by SQLite)
    /// and leaves the text index untouched. Failure of the commit itself
    /// compensates the already-applied text events.
    ///
    /// The text index commits before SQL does. Readers of this store, keyword
    /// search included, take the connection lock and so only see the text
    /// index once the SQL commit (or the compensation) has finished.
    fn write<T>(&self, op: &str, f: impl FnOnce(&Connection) -> Result<(T, Vec<SyncEvent>)>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(storage_err)?;
        let (out, events) = f(&tx)?;
        if let Err(e) = self.sync.propagate(&events) {
            tracing::warn!(op, error = %e, "text index rejected write; rolling back");
            return Err(e);
        }
        if let Err(e) = tx.commit() {
            self.sync.compensate(&events);
            return Err(storage_err(e));
        }
        tracing::debug!(op, events = events.len(), "canonical write committed");
        Ok(out)
    }

    pub fn upsert_document(&self, doc: &DocumentRecord) -> Result<()> {
        self.write("upsert_document", |conn| {
            put_document(conn, doc)?;
            Ok(((), Vec::new()))
        })
    }

    pub fn get_document(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT doc_id, filename, doc_type, category, created_at, metadata_json FROM documents WHERE doc_id = ?1",
            params![doc_id],
            |r| {
                Ok(DocumentRecord {
                    doc_id: r.get(0)?,
                    filename: r.get(1)?,
                    doc_type: r.get(2)?,
                    category: r.get(3)?,
                    created_at: r.get(4)?,
                    metadata_json: r.get(5)?,
                })
            },
        )
        .optional()
        .map_err(storage_err)
    }

    pub fn insert_chunk(&self, chunk: &StoredChunk) -> Result<()> {
        self.insert_chunks(std::slice::from_ref(chunk))
    }

    /// Insert several chunks in one transaction. Their documents must exist.
    pub fn insert_chunks(&self, chunks: &[StoredChunk]) -> Result<()> {
        self.write("insert_chunks", |conn| {
            let mut events = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                put_new_chunk(conn, chunk)?;
                events.push(sync::on_insert(chunk));
            }
            Ok(((), events))
        })
    }

    pub fn update_chunk_text(&self, chunk_id: &str, new_text: &str) -> Result<()> {
        self.write("update_chunk_text", |conn| {
            let prior = fetch_chunk(conn, chunk_id)?.ok_or_else(|| Error::NotFound(format!("chunk {chunk_id}")))?;
            conn.execute("UPDATE chunks SET text = ?1 WHERE chunk_id = ?2", params![new_text, chunk_id]).map_err(storage_err)?;
            Ok(((), sync::on_update(&prior, new_text).to_vec()))
        })
    }

    pub fn delete_chunk(&self, chunk_id: &str) -> Result<()> {
        self.write("delete_chunk", |conn| {
            let prior = fetch_chunk(conn, chunk_id)?.ok_or_else(|| Error::NotFound(format!("chunk {chunk_id}")))?;
            conn.execute("DELETE FROM chunks WHERE chunk_id = ?1", params![chunk_id]).map_err(storage_err)?;
            Ok(((), vec![sync::on_delete(&prior)]))
        })
    }

    /// Swap every chunk of a document for a new set in one transaction.
    pub fn replace_document(&self, doc: &DocumentRecord, chunks: &[StoredChunk]) -> Result<usize> {
        if let Some(stray) = chunks.iter().find(|c| c.doc_id != doc.doc_id) {
            return Err(Error::InvalidArgument(format!("chunk {} belongs to {}, not {}", stray.chunk_id, stray.doc_id, doc.doc_id)));
        }
        self.write("replace_document", |conn| {
            put_document(conn, doc)?;
            let prior = fetch_document_chunks(conn, &doc.doc_id)?;
            conn.execute("DELETE FROM chunks WHERE doc_id = ?1", params![doc.doc_id]).map_err(storage_err)?;
            let mut events: Vec<SyncEvent> = prior.iter().map(sync::on_delete).collect();
            for chunk in chunks {
                put_new_chunk(conn, chunk)?;
                events.push(sync::on_insert(chunk));
            }
            tracing::info!(doc_id = %doc.doc_id, removed = prior.len(), added = chunks.len(), "document reprocessed");
            Ok((chunks.len(), events))
        })
    }

    /// Load prepared documents and their chunks, one transaction per document.
    pub fn ingest(&self, docs: &[Document], chunks: &[Chunk]) -> Result<usize> {
        let mut by_doc: BTreeMap<&str, Vec<StoredChunk>> = BTreeMap::new();
        for c in chunks {
            by_doc.entry(c.parent_id.as_str()).or_default().push(StoredChunk::from(c));
        }
        let mut total = 0;
        for doc in docs {
            let rows = by_doc.remove(doc.doc_id.as_str()).unwrap_or_default();
            total += self.replace_document(&DocumentRecord::from_document(doc), &rows)?;
        }
        if let Some(orphan) = by_doc.keys().next() {
            tracing::warn!(doc_id = %orphan, orphans = by_doc.len(), "chunks without a prepared document were skipped");
        }
        tracing::info!(documents = docs.len(), chunks = total, "ingested");
        Ok(total)
    }

    pub fn get_chunk(&self, chunk_id: &str) -> Result<Option<StoredChunk>> {
        let conn = self.lock()?;
        fetch_chunk(&conn, chunk_id)
    }

    pub fn chunks_for_document(&self, doc_id: &str) -> Result<Vec<StoredChunk>> {
        let conn = self.lock()?;
        fetch_document_chunks(&conn, doc_id)
    }

    pub fn chunk_count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0)).map_err(storage_err)?;
        Ok(n as u64)
    }

    /// Keyword search. Waits out any write in flight, so hits never run ahead of the chunks table.
    pub fn text_search(&self, query: &str, limit: usize) -> Result<Vec<TextHit>> {
        let _conn = self.lock()?;
        self.sync.indexer().search(query, limit)
    }

    pub fn verify_text_index(&self) -> Result<SyncReport> {
        let conn = self.lock()?;
        let canonical: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0)).map_err(storage_err)?;
        let report = SyncReport { canonical_chunks: canonical as u64, indexed_chunks: self.sync.indexer().doc_count()? };
        if !report.is_consistent() {
            tracing::warn!(canonical = report.canonical_chunks, indexed = report.indexed_chunks, "text index out of step with chunks table");
        }
        Ok(report)
    }

    /// Re-derive the whole text index from the chunks table. Writes are held off meanwhile.
    pub fn rebuild_text_index(&self) -> Result<usize> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT chunk_id, doc_id, text FROM chunks ORDER BY doc_id, chunk_index").map_err(storage_err)?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?)))
            .map_err(storage_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_err)?;
        self.sync.indexer().reset(&rows)?;
        Ok(rows.len())
    }
}

fn put_document(conn: &Connection, doc: &DocumentRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO documents (doc_id, filename, doc_type, category, created_at, metadata_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(doc_id) DO UPDATE SET filename = excluded.filename, doc_type = excluded.doc_type,
             category = excluded.category, metadata_json = excluded.metadata_json",
        params![doc.doc_id, doc.filename, doc.doc_type, doc.category, doc.created_at, doc.metadata_json],
    )
    .map_err(storage_err)?;
    Ok(())
}

fn put_new_chunk(conn: &Connection, chunk: &StoredChunk) -> Result<()> {
    if fetch_chunk(conn, &chunk.chunk_id)?.is_some() {
        return Err(Error::InvalidArgument(format!("chunk {} already exists", chunk.chunk_id)));
    }
    let doc_exists: bool = conn
        .query_row("SELECT EXISTS(SELECT 1 FROM documents WHERE doc_id = ?1)", params![chunk.doc_id], |r| r.get(0))
        .map_err(storage_err)?;
    if !doc_exists {
        return Err(Error::NotFound(format!("document {}", chunk.doc_id)));
    }
    conn.execute(
        "INSERT INTO chunks (chunk_id, doc_id, chunk_index, text) VALUES (?1, ?2, ?3, ?4)",
        params![chunk.chunk_id, chunk.doc_id, chunk.chunk_index as i64, chunk.text],
    )
    .map_err(storage_err)?;
    Ok(())
}

fn row_to_chunk(r: &rusqlite::Row<'_>) -> rusqlite::Result<StoredChunk> {
    Ok(StoredChunk { chunk_id: r.get(0)?, doc_id: r.get(1)?, chunk_index: r.get::<_, i64>(2)? as usize, text: r.get(3)? })
}

fn fetch_chunk(conn: &Connection, chunk_id: &str) -> Result<Option<StoredChunk>> {
    conn.query_row("SELECT chunk_id, doc_id, chunk_index, text FROM chunks WHERE chunk_id = ?1", params![chunk_id], row_to_chunk)
        .optional()
        .map_err(storage_err)
}

fn fetch_document_chunks(conn: &Connection, doc_id: &str) -> Result<Vec<StoredChunk>> {
    let mut stmt = conn
        .prepare("SELECT chunk_id, doc_id, chunk_index, text FROM chunks WHERE doc_id = ?1 ORDER BY chunk_index")
        .map_err(storage_err)?;
    let rows = stmt.query_map(params![doc_id], row_to_chunk).map_err(storage_err)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage_err)
}
