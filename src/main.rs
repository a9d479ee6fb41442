mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli::{PipelineArgs, TextArg};
use embedd::config::EmbeddConfig;
use embedd::server;

#[derive(Parser)]
#[command(name = "embedd", version, about = "A service to generate vector embeddings for text inputs")]
struct Cli {
    /// Config file (defaults to ~/.embedd/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the embedding server
    Serve {
        /// Listen address
        #[arg(short, long)]
        addr: Option<String>,
        /// Transport: http or stdio (MCP)
        #[arg(long)]
        transport: Option<String>,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Embed a text and print the reply as JSON
    Embed {
        /// Text to embed, or `-` to read stdin
        text: TextArg,
        /// Embed as one unit, without chunking
        #[arg(long)]
        single: bool,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Show how a text is split into chunks
    Chunk {
        /// Text to split, or `-` to read stdin
        text: TextArg,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the ONNX model and tokenizer to the configured paths
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let mut config = match &cli.config {
        Some(path) => EmbeddConfig::load_from(path)?,
        None => EmbeddConfig::load()?,
    };

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC and CLI output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            addr,
            transport,
            pipeline,
        } => {
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            if let Some(transport) = transport {
                config.server.transport = transport;
            }
            pipeline.apply(&mut config);
            server::serve(config).await?;
        }
        Command::Embed {
            text,
            single,
            pipeline,
        } => {
            pipeline.apply(&mut config);
            cli::embed::embed(&config, text.read()?, single).await?;
        }
        Command::Chunk { text, pipeline } => {
            pipeline.apply(&mut config);
            cli::chunk::chunk(&config, &text.read()?)?;
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
    }

    Ok(())
}
