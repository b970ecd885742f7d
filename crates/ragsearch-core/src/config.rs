//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys split on `__`, e.g. `APP_CHUNKING__OVERLAP`).
//! `expand_path` handles `~` and `${VAR}` in configured paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Metric;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a single TOML file; no environment lookups.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path));
        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }

    fn validate(&self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        settings.chunking.validate()?;
        if settings.embedding.batch_size == 0 {
            anyhow::bail!(Error::Configuration("embedding.batch_size must be > 0".into()));
        }
        if settings.search.default_top_k == 0 {
            anyhow::bail!(Error::Configuration("search.default_top_k must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub raw_txt_dir: String,
    pub documents_path: String,
    pub chunks_path: String,
    pub index_dir: String,
    pub store_path: String,
    pub text_index_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_txt_dir: "data/raw".into(),
            documents_path: "data/processed/documents.jsonl".into(),
            chunks_path: "data/processed/chunks.jsonl".into(),
            index_dir: "index".into(),
            store_path: "data/knowledge.db".into(),
            text_index_dir: "data/text_index".into(),
        }
    }
}

/// Sliding-window parameters, in whitespace tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub window_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { window_size: 200, overlap: 50 }
    }
}

impl ChunkingConfig {
    /// A window that never advances (`overlap >= window_size`) is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::Configuration("window_size must be > 0".into()));
        }
        if self.overlap >= self.window_size {
            return Err(Error::Configuration(format!(
                "overlap ({}) must be smaller than window_size ({})",
                self.overlap, self.window_size
            )));
        }
        Ok(())
    }

    pub fn stride(&self) -> usize {
        self.window_size - self.overlap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Deterministic token-hashing embedder; no model files needed.
    Hash,
    /// BGE-M3 through candle. Requires the `bge` feature of `ragsearch-embed`.
    Bge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub dimension: usize,
    pub batch_size: usize,
    pub model_dir: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::Hash, dimension: 384, batch_size: 32, model_dir: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_top_k: usize,
    pub default_metric: Metric,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_top_k: 5, default_metric: Metric::L2 }
    }
}

/// Expand `~` and `$VAR`/`${VAR}` in a configured path. If a variable is
/// unset, only `~` is expanded.
pub fn expand_path(input: impl AsRef<str>) -> PathBuf {
    let raw = input.as_ref();
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(e) => {
            tracing::warn!(path = raw, error = %e, "path variable not set");
            PathBuf::from(shellexpand::tilde(raw).into_owned())
        }
    }
}
