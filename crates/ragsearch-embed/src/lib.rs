//! Embedding backends behind `ragsearch_core::traits::Embedder`.
//!
//! The default build only carries [`HashEmbedder`]. The BGE-M3 model (candle)
//! is compiled with the `bge` feature; `metal` adds Apple GPU support.

mod hash;

#[cfg(feature = "bge")]
mod model;

pub use hash::HashEmbedder;
#[cfg(feature = "bge")]
pub use model::{mean_pool_normalized, BgeM3Embedder};

use anyhow::Result;
use ragsearch_core::config::{EmbeddingBackend, EmbeddingConfig};
use ragsearch_core::traits::Embedder;

/// Construct the configured embedder. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hash embedder regardless of configuration.
pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake || config.backend == EmbeddingBackend::Hash {
        tracing::info!(dim = config.dimension, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(config.dimension)?));
    }
    bge_embedder(config)
}

#[cfg(feature = "bge")]
fn bge_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let dir = config.model_dir.as_deref().map(|d| ragsearch_core::config::expand_path(d));
    Ok(Box::new(BgeM3Embedder::new(dir.as_deref())?))
}

#[cfg(not(feature = "bge"))]
fn bge_embedder(_config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    anyhow::bail!("embedding backend 'bge' requires building ragsearch-embed with the `bge` feature")
}
