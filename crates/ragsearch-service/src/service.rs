use serde::Serialize;

use ragsearch_core::data_processor::clean_text;
use ragsearch_core::traits::Embedder;
use ragsearch_core::types::{Metric, SearchResult};
use ragsearch_core::{Error, Result};

use crate::registry::IndexRegistry;

#[derive(Debug, Clone, Serialize)]
pub struct MetricStatus {
    pub metric: Metric,
    pub published: bool,
    pub on_disk: bool,
    pub build_id: Option<String>,
    pub vectors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub embedding_dim: usize,
    pub metrics: Vec<MetricStatus>,
}

/// Query path: clean → embed → pick the metric's pair → rank → resolve identities.
pub struct SearchService {
    embedder: Box<dyn Embedder>,
    registry: IndexRegistry,
}

impl SearchService {
    pub fn new(embedder: Box<dyn Embedder>, registry: IndexRegistry) -> Self {
        Self { embedder, registry }
    }

    pub fn registry(&self) -> &IndexRegistry { &self.registry }
    pub fn embedder(&self) -> &dyn Embedder { self.embedder.as_ref() }

    pub fn search(&self, query: &str, top_k: usize, metric: Metric) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(Error::InvalidArgument("top_k must be > 0".into()));
        }
        let cleaned = clean_text(query);
        if cleaned.is_empty() {
            return Err(Error::InvalidArgument("query is empty".into()));
        }
        let pair = self.registry.get(metric)?;
        let q = self.embedder.embed(&cleaned).map_err(|e| Error::Embedding(format!("{e:#}")))?;
        if q.len() != pair.dim() {
            return Err(Error::DimensionMismatch { expected: pair.dim(), actual: q.len() });
        }
        let results = pair.query(&q, top_k)?;
        tracing::debug!(metric = %metric, top_k, hits = results.len(), build_id = %pair.build_id(), "vector search");
        Ok(results)
    }

    /// Entry point for untyped callers: the metric name is parsed here and
    /// `top_k` may arrive signed.
    pub fn search_named(&self, query: &str, top_k: i64, metric: &str) -> Result<Vec<SearchResult>> {
        let metric: Metric = metric.parse()?;
        let top_k = usize::try_from(top_k)
            .ok()
            .filter(|k| *k > 0)
            .ok_or_else(|| Error::InvalidArgument(format!("top_k must be > 0, got {top_k}")))?;
        self.search(query, top_k, metric)
    }

    pub fn health(&self) -> Health {
        let metrics: Vec<MetricStatus> = Metric::ALL
            .iter()
            .map(|&metric| {
                let live = self.registry.published(metric);
                MetricStatus {
                    metric,
                    published: live.is_some(),
                    on_disk: self.registry.on_disk(metric),
                    build_id: live.as_ref().map(|p| p.build_id()),
                    vectors: live.as_ref().map_or(0, |p| p.len()),
                }
            })
            .collect();
        let status = if metrics.iter().any(|m| m.published || m.on_disk) { "ok" } else { "no_index" };
        Health { status, embedding_dim: self.embedder.dim(), metrics }
    }
}
