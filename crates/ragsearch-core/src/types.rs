//! Domain types shared by the chunker, the vector side and the text side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type ChunkId = String;
pub type DocId = String;

/// A source document as written to `documents.jsonl`.
///
/// Serialized field names follow the dataset format (`id`, `text`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "id")]
    pub doc_id: DocId,
    pub title: String,
    #[serde(rename = "text")]
    pub raw_text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One overlapping window of a document, the unit that gets embedded and indexed.
///
/// - `chunk_id`: `"<doc_id>_chunk_<chunk_index>"`
/// - `parent_id`: owning document
/// - `chunk_index`: contiguous from 0 within the parent
/// - `title`: carried from the parent so results can be shown without a join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "id")]
    pub chunk_id: ChunkId,
    pub parent_id: DocId,
    pub title: String,
    pub chunk_index: usize,
    pub text: String,
}

impl Chunk {
    pub fn make_id(doc_id: &str, chunk_index: usize) -> ChunkId {
        format!("{doc_id}_chunk_{chunk_index}")
    }

    pub fn identity(&self) -> ChunkIdentity {
        ChunkIdentity {
            chunk_id: self.chunk_id.clone(),
            parent_id: self.parent_id.clone(),
            chunk_index: self.chunk_index,
            title: self.title.clone(),
        }
    }
}

/// Metadata record stored at a vector position.
///
/// On disk the chunk id lives under `doc_id`, matching the metadata file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkIdentity {
    #[serde(rename = "doc_id")]
    pub chunk_id: ChunkId,
    pub parent_id: DocId,
    pub chunk_index: usize,
    pub title: String,
}

/// Similarity function of a vector index. Each metric has its own index pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Euclidean distance, lower is better.
    #[default]
    L2,
    /// Cosine similarity over unit vectors, higher is better.
    Cosine,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::L2, Metric::Cosine];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::L2 => "l2",
            Metric::Cosine => "cosine",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l2" => Ok(Metric::L2),
            "cosine" => Ok(Metric::Cosine),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

/// A ranked vector search result.
///
/// `score` is a distance for [`Metric::L2`] and a similarity for [`Metric::Cosine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: ChunkId,
    pub parent_id: DocId,
    pub chunk_index: usize,
    pub title: String,
    pub score: f32,
}

/// A full-text hit. `score` is BM25, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextHit {
    pub chunk_id: ChunkId,
    pub doc_id: DocId,
    pub score: f32,
    pub snippet: String,
}

/// A change the full-text index must mirror after a canonical write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Add { chunk_id: ChunkId, doc_id: DocId, text: String },
    /// `text` is the content as it was before the write.
    Remove { chunk_id: ChunkId, doc_id: DocId, text: String },
}

impl SyncEvent {
    /// The event that undoes this one.
    pub fn inverse(&self) -> SyncEvent {
        match self.clone() {
            SyncEvent::Add { chunk_id, doc_id, text } => SyncEvent::Remove { chunk_id, doc_id, text },
            SyncEvent::Remove { chunk_id, doc_id, text } => SyncEvent::Add { chunk_id, doc_id, text },
        }
    }
}
