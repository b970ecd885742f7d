use crate::error::Result;
use crate::types::{SyncEvent, TextHit};

/// Text → fixed-length vector. Implementations must be deterministic and
/// return vectors of length [`Embedder::dim`].
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Secondary keyword index kept in step with the canonical chunk table.
pub trait TextIndexer: Send + Sync {
    /// Apply all events as one commit: either every event becomes visible or none does.
    fn apply(&self, events: &[SyncEvent]) -> Result<()>;
    /// Drop everything and index `(chunk_id, doc_id, text)` rows in one commit.
    fn reset(&self, rows: &[(String, String, String)]) -> Result<()>;
    fn search(&self, query: &str, limit: usize) -> Result<Vec<TextHit>>;
    fn doc_count(&self) -> Result<u64>;
}
