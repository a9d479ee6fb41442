//! MCP tool surface: `embed` and `embed_single` over the same [`EmbedHandler`].

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use crate::handler::{EmbedHandler, EmbedRequest, EmbedSingleRequest};

/// The embedd MCP tool handler. Exposes the embedding front-end via `#[tool_router]`.
#[derive(Clone)]
pub struct EmbedTools {
    tool_router: ToolRouter<Self>,
    handler: EmbedHandler,
}

#[tool_router]
impl EmbedTools {
    pub fn new(handler: EmbedHandler) -> Self {
        Self {
            tool_router: Self::tool_router(),
            handler,
        }
    }

    /// Chunk a text and embed every chunk.
    #[tool(description = "Embed a text of any length. The text is split into overlapping chunks; returns one unit-length vector per chunk, in order, with the chunk text.")]
    async fn embed(
        &self,
        Parameters(params): Parameters<EmbedRequest>,
    ) -> Result<String, String> {
        let reply = self
            .handler
            .embed(params)
            .await
            .map_err(|status| status.to_string())?;

        serde_json::to_string(&reply).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Embed a text as a single unit, without chunking.
    #[tool(description = "Embed a short text as one unit (no chunking). Returns a single unit-length vector.")]
    async fn embed_single(
        &self,
        Parameters(params): Parameters<EmbedSingleRequest>,
    ) -> Result<String, String> {
        let reply = self
            .handler
            .embed_single(params)
            .await
            .map_err(|status| status.to_string())?;

        serde_json::to_string(&reply).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for EmbedTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "embedd turns text into sentence embeddings. Use embed for documents of any \
                 length and embed_single for short texts such as search queries."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
