//! Text-to-vector embedding pipeline.
//!
//! [`EmbeddingService`] runs chunking, tokenization, inference, mean pooling and
//! L2 normalization. Inference sits behind the [`Encoder`] trait; the production
//! implementation is [`onnx::OnnxEncoder`].

pub mod chunker;
pub mod onnx;
pub mod pooling;
pub mod tokenizer;

use std::sync::Arc;

use anyhow::Result;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::Configuration;
use crate::error::EmbedError;
use chunker::{Chunk, TextChunker};
use tokenizer::TokenizerAdapter;

/// Encoder inputs for one chunk. All three vectors share the chunk's token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl TokenizedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// A unit-length vector and the chunk text it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub text: String,
}

/// A single forward pass through a sentence encoder.
///
/// Implementations take exactly one tokenized chunk (batch size 1) and return
/// per-token hidden states shaped `[1, seq_len, hidden_dim]`.
pub trait Encoder: Send + Sync {
    fn infer(&self, input: &TokenizedInput) -> Result<Array3<f32>, EmbedError>;
}

/// The embedding pipeline. Shared read-only across requests.
pub struct EmbeddingService {
    tokenizer: Arc<TokenizerAdapter>,
    chunker: TextChunker,
    encoder: Arc<dyn Encoder>,
}

impl EmbeddingService {
    /// Load the tokenizer and ONNX model named by `config`.
    pub fn load(config: &Configuration) -> Result<Self> {
        let tokenizer = TokenizerAdapter::from_file(&config.tokenizer_path)?;
        let encoder = onnx::OnnxEncoder::new(&config.model_path, config.intra_threads)?;
        Self::new(
            tokenizer,
            Arc::new(encoder),
            config.chunk_size,
            config.overlap,
        )
    }

    pub fn new(
        tokenizer: TokenizerAdapter,
        encoder: Arc<dyn Encoder>,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<Self> {
        let tokenizer = Arc::new(tokenizer);
        let chunker = TextChunker::new(Arc::clone(&tokenizer), chunk_size, overlap)?;
        Ok(Self {
            tokenizer,
            chunker,
            encoder,
        })
    }

    /// Split `text` into chunks without embedding them.
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, EmbedError> {
        self.chunker.chunk(text)
    }

    /// Chunk `text` and embed every chunk, in order.
    pub fn embed(&self, text: &str) -> Result<Vec<Embedding>, EmbedError> {
        self.embed_with_cancel(text, &CancellationToken::new())
    }

    /// Like [`embed`](Self::embed), but stops before the next chunk once `cancel` fires.
    pub fn embed_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Embedding>, EmbedError> {
        let chunks = self.chunker.chunk(text)?;
        tracing::debug!(chunks = chunks.len(), text_len = text.len(), "text chunked");

        let mut embeddings = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if cancel.is_cancelled() {
                return Err(EmbedError::Cancelled);
            }
            let input = self.tokenizer.tokenize(&chunk.text)?;
            embeddings.push(self.embed_input(chunk.text, input)?);
        }
        Ok(embeddings)
    }

    /// Embed `text` as one unit. No chunking: text longer than the chunk size is
    /// passed to the encoder as is.
    pub fn embed_single(&self, text: &str) -> Result<Embedding, EmbedError> {
        let input = self.tokenizer.tokenize(text)?;
        let tokens = self.tokenizer.content_len(&input);
        if tokens > self.chunker.chunk_size() {
            tracing::warn!(
                tokens,
                chunk_size = self.chunker.chunk_size(),
                "embed_single text exceeds chunk size"
            );
        }
        self.embed_input(text.to_string(), input)
    }

    fn embed_input(&self, text: String, input: TokenizedInput) -> Result<Embedding, EmbedError> {
        let hidden = self.encoder.infer(&input).map_err(|e| {
            tracing::error!(chunk = %text, error = %e, "inference failed");
            e
        })?;

        let dims = hidden.shape();
        if dims[0] != 1 || dims[1] != input.len() {
            tracing::error!(chunk = %text, shape = ?dims, "unexpected encoder output shape");
            return Err(EmbedError::Inference(format!(
                "unexpected output shape {dims:?}, expected [1, {}, hidden]",
                input.len()
            )));
        }

        if hidden.iter().any(|x| !x.is_finite()) {
            tracing::error!(chunk = %text, "encoder output contains NaN or infinity");
            return Err(EmbedError::Inference(
                "encoder output contains non-finite values".into(),
            ));
        }

        let pooled = pooling::mean_pool(&input.attention_mask, hidden.view());
        let norm = pooled.dot(&pooled).sqrt();
        if norm == 0.0 {
            tracing::error!(chunk = %text, "pooled vector has zero norm");
            return Err(EmbedError::DegenerateVector {
                text_len: text.len(),
            });
        }
        if !norm.is_finite() {
            tracing::error!(chunk = %text, "pooled vector norm overflowed");
            return Err(EmbedError::Inference("pooled vector norm overflowed".into()));
        }

        let vector = pooling::l2_normalize(pooled);

        Ok(Embedding {
            vector: vector.to_vec(),
            text,
        })
    }
}
