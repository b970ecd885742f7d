//! Sliding-window chunking over whitespace tokens.
//!
//! Windows advance by `window_size - overlap`. The window whose unclamped end
//! (`start + window_size`) reaches or passes the token count is the last one,
//! so a short tail window is emitted at most once and never followed by a
//! window that lies entirely inside the previous overlap.

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Document};

/// Split `text` into overlapping windows of at most `window_size` tokens.
pub fn sliding_window_chunk(text: &str, window_size: usize, overlap: usize) -> Result<Vec<String>> {
    let config = ChunkingConfig { window_size, overlap };
    config.validate()?;
    let tokens: Vec<&str> = text.split_whitespace().collect();
    Ok(windows(&tokens, &config))
}

fn windows(tokens: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = start + config.window_size;
        chunks.push(tokens[start..end.min(tokens.len())].join(" "));
        if end >= tokens.len() { break; }
        start += config.stride();
    }
    chunks
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig { &self.config }

    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        windows(&tokens, &self.config)
    }

    /// Chunk one document into records with ids `<doc_id>_chunk_<i>`.
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        self.chunk_text(&doc.raw_text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                chunk_id: Chunk::make_id(&doc.doc_id, chunk_index),
                parent_id: doc.doc_id.clone(),
                title: doc.title.clone(),
                chunk_index,
                text,
            })
            .collect()
    }
}
