//! Sentence embeddings as a service.
//!
//! embedd turns text of any length into unit-length embedding vectors suitable
//! for semantic search. Long text is split into token windows that overlap by a
//! configurable number of tokens, each window runs through a pretrained encoder
//! (ONNX Runtime), and the per-token output is mean-pooled over the attention
//! mask and L2-normalized.
//!
//! # Architecture
//!
//! - **Chunking**: token windows over the encoder's own tokenizer, so no chunk
//!   exceeds the configured `chunk_size`
//! - **Inference**: one chunk per forward pass; the ONNX session is shared and
//!   serialized behind a mutex
//! - **Transport**: JSON over HTTP (primary) or MCP over stdio
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`embedding`]: Chunking, tokenization, inference, pooling and normalization
//! - [`error`]: Pipeline error taxonomy
//! - [`handler`]: Request validation, error mapping and cancellation
//! - [`server`]: HTTP and stdio transports
//! - [`tools`]: MCP tools for the stdio transport

pub mod config;
pub mod embedding;
pub mod error;
pub mod handler;
pub mod server;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_utils;
