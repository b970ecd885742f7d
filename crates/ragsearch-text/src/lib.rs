//! ragsearch-text
//!
//! Tantivy full-text index over chunk text. Implements
//! [`ragsearch_core::traits::TextIndexer`] so the canonical store can keep it
//! in step with its own writes.
pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyTextIndex;
