//! Configuration loading from TOML files and environment variables.
//!
//! [`EmbeddConfig`] is the raw, user-facing layer (file + env + CLI overrides).
//! [`EmbeddConfig::resolve`] turns it into the immutable [`Configuration`]
//! record the embedding pipeline is built from.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub transport: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub tokenizer_path: String,
    pub model_path: String,
    /// Maximum tokens per chunk.
    pub chunk_size: usize,
    /// Values below 1.0 are a fraction of `chunk_size`, anything else an absolute token count.
    pub overlap: f64,
    pub intra_threads: usize,
    pub model_url: String,
    pub tokenizer_url: String,
}

impl Default for EmbeddConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "[::]:8150".into(),
            transport: "http".into(),
            log_level: "info".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let models = default_embedd_dir().join("models");
        Self {
            tokenizer_path: models.join("tokenizer.json").to_string_lossy().into_owned(),
            model_path: models.join("model.onnx").to_string_lossy().into_owned(),
            chunk_size: 196,
            overlap: 0.15,
            intra_threads: 4,
            model_url:
                "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx"
                    .into(),
            tokenizer_url:
                "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json"
                    .into(),
        }
    }
}

/// The resolved, immutable pipeline configuration. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub tokenizer_path: PathBuf,
    pub model_path: PathBuf,
    pub chunk_size: usize,
    pub overlap: usize,
    pub intra_threads: usize,
}

/// Returns `~/.embedd/`, falling back to `./.embedd` when no home directory is known.
pub fn default_embedd_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".embedd")
}

/// Returns the default config file path: `~/.embedd/config.toml`
pub fn default_config_path() -> PathBuf {
    default_embedd_dir().join("config.toml")
}

impl EmbeddConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            EmbeddConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides (EMBEDD_ADDR, EMBEDD_TOKENIZER, EMBEDD_MODEL,
    /// EMBEDD_CHUNK_SIZE, EMBEDD_OVERLAP, EMBEDD_LOG_LEVEL).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("EMBEDD_ADDR") {
            self.server.addr = val;
        }
        if let Ok(val) = std::env::var("EMBEDD_TOKENIZER") {
            self.embedding.tokenizer_path = val;
        }
        if let Ok(val) = std::env::var("EMBEDD_MODEL") {
            self.embedding.model_path = val;
        }
        if let Ok(val) = std::env::var("EMBEDD_CHUNK_SIZE") {
            self.embedding.chunk_size = val
                .parse()
                .with_context(|| format!("invalid EMBEDD_CHUNK_SIZE: {val}"))?;
        }
        if let Ok(val) = std::env::var("EMBEDD_OVERLAP") {
            self.embedding.overlap = val
                .parse()
                .with_context(|| format!("invalid EMBEDD_OVERLAP: {val}"))?;
        }
        if let Ok(val) = std::env::var("EMBEDD_LOG_LEVEL") {
            self.server.log_level = val;
        }
        Ok(())
    }

    /// Resolve the embedding section into a [`Configuration`], expanding `~` in paths
    /// and turning a fractional overlap into a token count.
    pub fn resolve(&self) -> Result<Configuration> {
        let embedding = &self.embedding;
        let overlap = resolve_overlap(embedding.overlap, embedding.chunk_size)?;
        Ok(Configuration {
            tokenizer_path: expand_tilde(&embedding.tokenizer_path),
            model_path: expand_tilde(&embedding.model_path),
            chunk_size: embedding.chunk_size,
            overlap,
            intra_threads: embedding.intra_threads.max(1),
        })
    }
}

/// Resolve a raw overlap value into a token count.
///
/// `overlap >= 1.0` is an absolute count (fractional part dropped), `overlap < 1.0`
/// is a fraction of `chunk_size` (rounded down). The result must leave room for
/// progress: `overlap < chunk_size`.
pub fn resolve_overlap(overlap: f64, chunk_size: usize) -> Result<usize> {
    anyhow::ensure!(chunk_size > 0, "chunk_size must be positive");
    anyhow::ensure!(
        overlap.is_finite() && overlap >= 0.0,
        "overlap must be a non-negative number, got {overlap}"
    );

    let tokens = if overlap >= 1.0 {
        overlap.trunc() as usize
    } else {
        (overlap * chunk_size as f64).floor() as usize
    };

    anyhow::ensure!(
        tokens < chunk_size,
        "overlap ({tokens} tokens) must be smaller than chunk_size ({chunk_size})"
    );
    Ok(tokens)
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
