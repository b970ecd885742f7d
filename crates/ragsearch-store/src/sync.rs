//! Application-level hook that mirrors canonical chunk writes into the
//! full-text index.
//!
//! Every canonical write is described as a list of [`SyncEvent`]s:
//! insert → `Add`, delete → `Remove` (pre-delete text), update → `Remove`
//! (pre-update text) then `Add` (post-update text). The events are applied
//! in one text-index commit before the SQL transaction commits. If the SQL
//! commit then fails, the inverse events are applied in reverse order.

use std::sync::Arc;

use ragsearch_core::traits::TextIndexer;
use ragsearch_core::types::SyncEvent;
use ragsearch_core::{Error, Result};

use crate::records::StoredChunk;

pub fn on_insert(chunk: &StoredChunk) -> SyncEvent {
    SyncEvent::Add { chunk_id: chunk.chunk_id.clone(), doc_id: chunk.doc_id.clone(), text: chunk.text.clone() }
}

pub fn on_delete(prior: &StoredChunk) -> SyncEvent {
    SyncEvent::Remove { chunk_id: prior.chunk_id.clone(), doc_id: prior.doc_id.clone(), text: prior.text.clone() }
}

pub fn on_update(prior: &StoredChunk, new_text: &str) -> [SyncEvent; 2] {
    let updated = StoredChunk { text: new_text.to_string(), ..prior.clone() };
    [on_delete(prior), on_insert(&updated)]
}

/// The events that undo `events`, in the order they must be applied.
pub fn compensation(events: &[SyncEvent]) -> Vec<SyncEvent> {
    events.iter().rev().map(SyncEvent::inverse).collect()
}

#[derive(Clone)]
pub struct ConsistencySync {
    text: Arc<dyn TextIndexer>,
}

impl ConsistencySync {
    pub fn new(text: Arc<dyn TextIndexer>) -> Self { Self { text } }

    pub fn indexer(&self) -> &dyn TextIndexer { self.text.as_ref() }

    /// Apply all events in one text-index commit.
    pub fn propagate(&self, events: &[SyncEvent]) -> Result<()> {
        self.text.apply(events).map_err(|e| match e {
            Error::SyncTransaction(_) => e,
            other => Error::SyncTransaction(other.to_string()),
        })
    }

    /// Undo events that were propagated for a write that did not commit.
    pub fn compensate(&self, events: &[SyncEvent]) {
        if events.is_empty() { return; }
        if let Err(e) = self.text.apply(&compensation(events)) {
            tracing::error!(error = %e, events = events.len(), "text index compensation failed; run rebuild to restore consistency");
        } else {
            tracing::warn!(events = events.len(), "canonical commit failed; text index changes undone");
        }
    }
}
