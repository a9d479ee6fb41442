//! Request front-end shared by every transport.
//!
//! [`EmbedHandler`] validates requests, runs the pipeline off the async runtime
//! and maps outcomes to replies or a [`Status`].

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::embedding::{Embedding, EmbeddingService};
use crate::error::{EmbedError, EMPTY_TEXT_MESSAGE};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmbedRequest {
    #[schemars(description = "Text to embed. Long text is split into overlapping chunks.")]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmbedSingleRequest {
    #[schemars(description = "Text to embed as a single unit. Must fit the model's input size.")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedReply {
    pub embeddings: Vec<Embedding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedSingleReply {
    pub embedding: Embedding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    InvalidArgument,
    Cancelled,
    Internal,
}

/// Terminal failure status for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl Status {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: Code::Internal,
            message: message.into(),
        }
    }
}

impl From<EmbedError> for Status {
    fn from(err: EmbedError) -> Self {
        let code = match err {
            EmbedError::Validation => Code::InvalidArgument,
            EmbedError::Cancelled => Code::Cancelled,
            EmbedError::Tokenization(_)
            | EmbedError::Inference(_)
            | EmbedError::DegenerateVector { .. } => Code::Internal,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}

/// Holds the shared pipeline and serves `Embed` / `EmbedSingle`.
#[derive(Clone)]
pub struct EmbedHandler {
    service: Arc<EmbeddingService>,
}

impl EmbedHandler {
    pub fn new(service: Arc<EmbeddingService>) -> Self {
        Self { service }
    }

    pub async fn embed(&self, request: EmbedRequest) -> Result<EmbedReply, Status> {
        let text = validate(request.text)?;
        let request_id = Uuid::now_v7();
        tracing::info!(%request_id, text_len = text.len(), "got request to embed");

        let embeddings = self
            .run(request_id, move |service, cancel| {
                service.embed_with_cancel(&text, cancel)
            })
            .await?;

        tracing::info!(%request_id, chunks = embeddings.len(), "embed finished");
        Ok(EmbedReply { embeddings })
    }

    pub async fn embed_single(
        &self,
        request: EmbedSingleRequest,
    ) -> Result<EmbedSingleReply, Status> {
        let text = validate(request.text)?;
        let request_id = Uuid::now_v7();
        tracing::info!(%request_id, text_len = text.len(), "got request to embed single");

        let embedding = self
            .run(request_id, move |service, _| service.embed_single(&text))
            .await?;

        tracing::info!(%request_id, "embed_single finished");
        Ok(EmbedSingleReply { embedding })
    }

    /// Run `work` on the blocking pool. If this future is dropped (the client went
    /// away) the token is cancelled and `work` stops at its next chunk boundary.
    async fn run<T, F>(&self, request_id: Uuid, work: F) -> Result<T, Status>
    where
        T: Send + 'static,
        F: FnOnce(&EmbeddingService, &CancellationToken) -> Result<T, EmbedError>
            + Send
            + 'static,
    {
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();
        let service = Arc::clone(&self.service);

        let result = tokio::task::spawn_blocking(move || {
            let outcome = work(&service, &cancel);
            if matches!(outcome, Err(EmbedError::Cancelled)) {
                tracing::info!(%request_id, "request abandoned by client");
            }
            outcome
        })
        .await
        .map_err(|e| Status::internal(format!("embedding task failed: {e}")))?;

        result.map_err(|e| {
            tracing::warn!(%request_id, error = %e, "request failed");
            Status::from(e)
        })
    }
}

fn validate(text: String) -> Result<String, Status> {
    if text.is_empty() {
        return Err(Status::from(EmbedError::Validation));
    }
    Ok(text)
}
