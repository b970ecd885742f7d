//! Exact (brute-force) nearest-neighbour index over dense f32 vectors.
//!
//! Vectors are kept row-major in one contiguous buffer; position `i` is the
//! i-th vector handed to [`FlatIndex::build`]. Cosine indexes store unit
//! vectors and score by inner product; L2 indexes store vectors as given and
//! score by Euclidean distance.

use std::cmp::Ordering;

use ragsearch_core::types::Metric;
use ragsearch_core::{Error, Result};

/// One query hit: a stored position and its metric score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    metric: Metric,
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn build(vectors: &[Vec<f32>], metric: Metric) -> Result<Self> {
        let first = vectors.first().ok_or(Error::EmptyIndex)?;
        let dim = first.len();
        if dim == 0 {
            return Err(Error::InvalidArgument("vectors must have at least one dimension".into()));
        }
        let mut data = Vec::with_capacity(dim * vectors.len());
        for (position, v) in vectors.iter().enumerate() {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
            }
            check_finite(v, || format!("vector at position {position}"))?;
            match metric {
                Metric::L2 => data.extend_from_slice(v),
                Metric::Cosine => data.extend(normalized(v)),
            }
        }
        tracing::debug!(metric = %metric, dim, len = vectors.len(), "built flat index");
        Ok(Self { metric, dim, data })
    }

    /// Rebuild from already-prepared rows (used when restoring a persisted blob).
    pub(crate) fn from_raw(metric: Metric, dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 || data.is_empty() || data.len() % dim != 0 {
            return Err(Error::ArtifactMismatch(format!("{} floats do not form rows of dimension {}", data.len(), dim)));
        }
        Ok(Self { metric, dim, data })
    }

    pub fn metric(&self) -> Metric { self.metric }
    pub fn dim(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { self.data.len() / self.dim }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }
    pub(crate) fn raw(&self) -> &[f32] { &self.data }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        (position < self.len()).then(|| &self.data[position * self.dim..(position + 1) * self.dim])
    }

    /// Best `min(top_k, len)` positions for `query`, best first, ties by ascending position.
    pub fn query(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        if top_k == 0 {
            return Err(Error::InvalidArgument("top_k must be > 0".into()));
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        check_finite(query, || "query vector".to_string())?;

        let mut scored: Vec<Neighbor> = match self.metric {
            Metric::L2 => self.rows().enumerate().map(|(position, row)| Neighbor { position, score: l2_distance(query, row) }).collect(),
            Metric::Cosine => {
                let q = normalized(query);
                self.rows().enumerate().map(|(position, row)| Neighbor { position, score: dot(&q, row) }).collect()
            }
        };

        let metric = self.metric;
        let order = move |a: &Neighbor, b: &Neighbor| rank_order(metric, a, b);
        let k = top_k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, order);
            scored.truncate(k);
        }
        scored.sort_unstable_by(order);
        Ok(scored)
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }
}

fn rank_order(metric: Metric, a: &Neighbor, b: &Neighbor) -> Ordering {
    let by_score = match metric {
        Metric::L2 => a.score.total_cmp(&b.score),
        Metric::Cosine => b.score.total_cmp(&a.score),
    };
    by_score.then(a.position.cmp(&b.position))
}

fn check_finite(v: &[f32], what: impl FnOnce() -> String) -> Result<()> {
    if v.iter().all(|x| x.is_finite()) { Ok(()) } else { Err(Error::InvalidArgument(format!("{} contains NaN or infinite values", what()))) }
}

/// Unit-length copy of `v`. Only the exact zero vector stays zero.
///
/// The norm is accumulated in f64: squares of any finite f32 neither
/// overflow nor vanish there.
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm == 0.0 { return v.to_vec(); }
    v.iter().map(|&x| (f64::from(x) / norm) as f32).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}
