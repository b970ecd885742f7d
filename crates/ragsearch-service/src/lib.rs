//! ragsearch-service
//!
//! Query-side façade over the published index pairs.

pub mod registry;
pub mod service;

pub use registry::IndexRegistry;
pub use service::{Health, MetricStatus, SearchService};
