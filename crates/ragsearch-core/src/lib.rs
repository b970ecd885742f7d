//! ragsearch-core
//!
//! Shared domain types, the error taxonomy, configuration, the sliding-window
//! chunker and dataset preparation. No engine-specific code lives here.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
