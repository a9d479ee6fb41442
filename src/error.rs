//! Error types for the embedding pipeline.

use thiserror::Error;

/// Message returned for requests that carry no text.
pub const EMPTY_TEXT_MESSAGE: &str = "Cannot generate embedding for an empty text";

/// Errors raised while embedding a request.
///
/// Any of these aborts the whole request: a multi-chunk `embed` never returns
/// a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbedError {
    /// Request text was empty.
    #[error("{}", EMPTY_TEXT_MESSAGE)]
    Validation,
    /// Tokenizer failed or produced no tokens.
    #[error("tokenization failed: {0}")]
    Tokenization(String),
    /// The inference engine failed or returned malformed output.
    #[error("inference failed: {0}")]
    Inference(String),
    /// The pooled vector had zero norm, so it cannot be normalized.
    #[error("pooled vector for chunk has zero norm ({text_len} bytes of text)")]
    DegenerateVector { text_len: usize },
    /// The caller went away before the request finished.
    #[error("request cancelled")]
    Cancelled,
}
