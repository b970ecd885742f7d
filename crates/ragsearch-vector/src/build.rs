//! Build flow: chunk records → ordered batch embedding → one [`IndexPair`] per metric.
//!
//! Embeddings and identity records are produced from the same slice in the
//! same order, which is what keeps vector position `i` and metadata position
//! `i` describing the same chunk.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use ragsearch_core::traits::Embedder;
use ragsearch_core::types::{Chunk, Metric};
use ragsearch_core::{Error, Result};

use crate::flat::FlatIndex;
use crate::metadata::MetadataStore;
use crate::pair::IndexPair;

pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn Embedder, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Configuration("embedding batch_size must be > 0".into()));
        }
        Ok(Self { embedder, batch_size, show_progress: false })
    }

    pub fn with_progress(mut self, show: bool) -> Self { self.show_progress = show; self }

    /// Embed every chunk text, batch by batch, preserving input order.
    pub fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        if chunks.is_empty() { return Err(Error::EmptyIndex); }
        let pb = if self.show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
            pb.set_style(style.progress_chars("#>-"));
        }
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).map_err(|e| Error::Embedding(format!("{e:#}")))?;
            if vectors.len() != texts.len() {
                return Err(Error::Embedding(format!("embedder returned {} vectors for {} texts", vectors.len(), texts.len())));
            }
            embeddings.extend(vectors);
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("embedded");
        tracing::info!(chunks = chunks.len(), dim = self.embedder.dim(), "embedded chunks");
        Ok(embeddings)
    }

    pub fn build(&self, chunks: &[Chunk], metric: Metric) -> Result<IndexPair> {
        let embeddings = self.embed_chunks(chunks)?;
        pair_from_embeddings(chunks, &embeddings, metric)
    }

    /// Build every requested metric from one embedding pass.
    pub fn build_many(&self, chunks: &[Chunk], metrics: &[Metric]) -> Result<Vec<IndexPair>> {
        let embeddings = self.embed_chunks(chunks)?;
        metrics.iter().map(|&m| pair_from_embeddings(chunks, &embeddings, m)).collect()
    }

    /// Build all requested pairs first, then save them. Nothing is written if any build fails.
    pub fn build_and_save(&self, chunks: &[Chunk], metrics: &[Metric], dir: &Path) -> Result<Vec<IndexPair>> {
        let pairs = self.build_many(chunks, metrics)?;
        for pair in &pairs { pair.save(dir)?; }
        Ok(pairs)
    }
}

pub fn pair_from_embeddings(chunks: &[Chunk], embeddings: &[Vec<f32>], metric: Metric) -> Result<IndexPair> {
    if chunks.len() != embeddings.len() {
        return Err(Error::InvalidArgument(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
    }
    let index = FlatIndex::build(embeddings, metric)?;
    let metadata = MetadataStore::build(chunks.iter().map(Chunk::identity).collect());
    let pair = IndexPair::new(index, metadata)?;
    tracing::info!(metric = %metric, vectors = pair.len(), dim = pair.dim(), build_id = %pair.build_id(), "built index pair");
    Ok(pair)
}
