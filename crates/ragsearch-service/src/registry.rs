use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use ragsearch_core::types::Metric;
use ragsearch_core::{Error, Result};
use ragsearch_vector::IndexPair;

/// The currently published index pair per metric.
///
/// Readers clone an `Arc` and keep querying it even if a newer pair is
/// published meanwhile; publishing is a single map insert under the write lock.
#[derive(Default)]
pub struct IndexRegistry {
    dir: Option<PathBuf>,
    pairs: RwLock<HashMap<Metric, Arc<IndexPair>>>,
}

impl IndexRegistry {
    pub fn new() -> Self { Self::default() }

    /// Registry that loads a metric's pair from `dir` the first time it is asked for.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()), pairs: RwLock::default() }
    }

    pub fn dir(&self) -> Option<&PathBuf> { self.dir.as_ref() }

    pub fn publish(&self, pair: IndexPair) -> Arc<IndexPair> {
        let metric = pair.metric();
        let pair = Arc::new(pair);
        let previous = self.pairs.write().unwrap_or_else(PoisonError::into_inner).insert(metric, pair.clone());
        tracing::info!(
            metric = %metric,
            build_id = %pair.build_id(),
            replaced = %previous.map(|p| p.build_id()).unwrap_or_default(),
            "published index pair"
        );
        pair
    }

    pub fn published(&self, metric: Metric) -> Option<Arc<IndexPair>> {
        self.pairs.read().unwrap_or_else(PoisonError::into_inner).get(&metric).cloned()
    }

    /// Published pair for `metric`, loading it from disk on first use.
    pub fn get(&self, metric: Metric) -> Result<Arc<IndexPair>> {
        if let Some(pair) = self.published(metric) {
            return Ok(pair);
        }
        let dir = self.dir.as_ref().ok_or(Error::IndexNotBuilt(metric))?;
        let loaded = IndexPair::load(dir, metric)?;
        let mut pairs = self.pairs.write().unwrap_or_else(PoisonError::into_inner);
        Ok(pairs.entry(metric).or_insert_with(|| Arc::new(loaded)).clone())
    }

    pub fn on_disk(&self, metric: Metric) -> bool {
        self.dir.as_ref().is_some_and(|d| IndexPair::index_path(d, metric).exists() && IndexPair::metadata_path(d, metric).exists())
    }
}
