//! CLI `embed` command: one-shot embedding printed as JSON.

use std::sync::Arc;

use anyhow::Result;

use embedd::config::EmbeddConfig;
use embedd::embedding::EmbeddingService;
use embedd::handler::{EmbedHandler, EmbedRequest, EmbedSingleRequest};

pub async fn embed(config: &EmbeddConfig, text: String, single: bool) -> Result<()> {
    let resolved = config.resolve()?;
    let service = tokio::task::spawn_blocking(move || EmbeddingService::load(&resolved)).await??;
    let handler = EmbedHandler::new(Arc::new(service));

    let json = if single {
        let reply = handler.embed_single(EmbedSingleRequest { text }).await?;
        serde_json::to_string_pretty(&reply)?
    } else {
        let reply = handler.embed(EmbedRequest { text }).await?;
        serde_json::to_string_pretty(&reply)?
    };

    println!("{json}");
    Ok(())
}
