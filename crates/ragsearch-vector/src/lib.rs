//! ragsearch-vector
//!
//! Exact flat vector index (L2 or cosine), the position → chunk metadata
//! store, the persisted index pair and the build pipeline that produces it.

pub mod blob;
pub mod build;
pub mod flat;
pub mod metadata;
pub mod pair;

pub use build::{pair_from_embeddings, IndexBuilder};
pub use flat::{FlatIndex, Neighbor};
pub use metadata::MetadataStore;
pub use pair::IndexPair;
