//! Server initialization for HTTP and stdio (MCP) transports.
//!
//! Provides [`serve_http`] and [`serve_stdio`] entry points that load the
//! embedding pipeline once and share it across all requests.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rmcp::ServiceExt;

use crate::config::EmbeddConfig;
use crate::embedding::EmbeddingService;
use crate::handler::{
    Code, EmbedHandler, EmbedReply, EmbedRequest, EmbedSingleReply, EmbedSingleRequest, Status,
};
use crate::tools::EmbedTools;

/// Shared setup: resolve config and load tokenizer + model.
fn setup_shared_state(config: &EmbeddConfig) -> Result<EmbedHandler> {
    let resolved = config.resolve()?;
    tracing::info!(
        tokenizer = %resolved.tokenizer_path.display(),
        model = %resolved.model_path.display(),
        chunk_size = resolved.chunk_size,
        overlap = resolved.overlap,
        "running with configuration"
    );

    let service = EmbeddingService::load(&resolved)?;
    tracing::info!("embedding pipeline ready");

    Ok(EmbedHandler::new(Arc::new(service)))
}

/// Start the server on the transport named in `config.server.transport`.
pub async fn serve(config: EmbeddConfig) -> Result<()> {
    match config.server.transport.as_str() {
        "http" => serve_http(config).await,
        "stdio" => serve_stdio(config).await,
        other => anyhow::bail!("unknown transport: {other}. Supported: http, stdio"),
    }
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: EmbeddConfig) -> Result<()> {
    tracing::info!("starting embedd MCP server on stdio");

    let handler = setup_shared_state(&config)?;

    let tools = EmbedTools::new(handler);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the JSON-over-HTTP server.
pub async fn serve_http(config: EmbeddConfig) -> Result<()> {
    let bind_addr = config.server.addr.clone();
    tracing::info!(addr = %bind_addr, "starting embedd HTTP server");

    let handler = setup_shared_state(&config)?;
    let app = router(handler);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

/// Routes: `POST /embed`, `POST /embed_single`, `GET /health`.
pub fn router(handler: EmbedHandler) -> Router {
    Router::new()
        .route("/embed", post(embed))
        .route("/embed_single", post(embed_single))
        .route("/health", get(|| async { "ok" }))
        .with_state(handler)
}

async fn embed(
    State(handler): State<EmbedHandler>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedReply>, Status> {
    handler.embed(request).await.map(Json)
}

async fn embed_single(
    State(handler): State<EmbedHandler>,
    Json(request): Json<EmbedSingleRequest>,
) -> Result<Json<EmbedSingleReply>, Status> {
    handler.embed_single(request).await.map(Json)
}

impl IntoResponse for Status {
    fn into_response(self) -> Response {
        let status = match self.code {
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            // nginx's "client closed request"; nobody is usually left to read it
            Code::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}
