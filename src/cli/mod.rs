pub mod chunk;
pub mod embed;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;

use embedd::config::{expand_tilde, EmbeddConfig, EmbeddingConfig};

/// Pipeline overrides shared by `serve`, `embed` and `chunk`.
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Path to tokenizer.json
    #[arg(short, long)]
    tokenizer_path: Option<String>,
    /// Path to the ONNX model
    #[arg(short, long)]
    model_path: Option<String>,
    /// Maximum tokens per chunk
    #[arg(short, long)]
    chunk_size: Option<usize>,
    /// Overlap between chunks: < 1.0 is a fraction of chunk size, otherwise a token count
    #[arg(short, long)]
    overlap: Option<f64>,
}

impl PipelineArgs {
    pub fn apply(&self, config: &mut EmbeddConfig) {
        let embedding = &mut config.embedding;
        if let Some(path) = &self.tokenizer_path {
            embedding.tokenizer_path = path.clone();
        }
        if let Some(path) = &self.model_path {
            embedding.model_path = path.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            embedding.chunk_size = chunk_size;
        }
        if let Some(overlap) = self.overlap {
            embedding.overlap = overlap;
        }
    }
}

/// A text argument; `-` means read stdin.
#[derive(Debug, Clone)]
pub struct TextArg(String);

impl std::str::FromStr for TextArg {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl TextArg {
    pub fn read(self) -> Result<String> {
        if self.0 != "-" {
            return Ok(self.0);
        }
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read text from stdin")?;
        Ok(text)
    }
}

/// Download the ONNX embedding model and tokenizer to their configured paths.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let model_path = expand_tilde(&config.model_path);
    let tokenizer_path = expand_tilde(&config.tokenizer_path);

    if model_path.exists() {
        println!("Model already exists at {}", model_path.display());
    } else {
        println!("Downloading model.onnx...");
        download_file(&config.model_url, &model_path).await?;
        println!("Model saved to {}", model_path.display());
    }

    if tokenizer_path.exists() {
        println!("Tokenizer already exists at {}", tokenizer_path.display());
    } else {
        println!("Downloading tokenizer.json...");
        download_file(&config.tokenizer_url, &tokenizer_path).await?;
        println!("Tokenizer saved to {}", tokenizer_path.display());
    }

    println!("Model download complete. Ready for use.");
    Ok(())
}

/// Download a file from a URL with progress bar. Uses atomic write (tmp + rename).
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                    .context("invalid progress template")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(bytes) = response.chunk().await.context("error reading response")? {
        file.write_all(&bytes)
            .await
            .context("error writing to file")?;
        pb.inc(bytes.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
