#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use embedd::embedding::tokenizer::TokenizerAdapter;
use embedd::embedding::{EmbeddingService, Encoder, TokenizedInput};
use embedd::error::EmbedError;
use embedd::handler::EmbedHandler;
use ndarray::Array3;
use tokenizers::Tokenizer;

pub const HIDDEN: usize = 8;

/// Word-level tokenizer: `[UNK]` is id 0, `words[i]` is id `i + 1`.
pub fn tokenizer(words: &[&str]) -> TokenizerAdapter {
    let mut vocab = serde_json::Map::new();
    vocab.insert("[UNK]".into(), 0.into());
    for (i, word) in words.iter().enumerate() {
        vocab.insert((*word).into(), (i + 1).into());
    }

    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    });
    let tokenizer = Tokenizer::from_str(&json.to_string()).unwrap();
    TokenizerAdapter::new(tokenizer).unwrap()
}

/// WordPiece tokenizer with a whitespace pre-tokenizer. Words split into `##` pieces.
pub fn wordpiece(vocab: &[&str]) -> TokenizerAdapter {
    let mut ids = serde_json::Map::new();
    ids.insert("[UNK]".into(), 0.into());
    for (i, piece) in vocab.iter().enumerate() {
        ids.insert((*piece).into(), (i + 1).into());
    }

    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": ids
        }
    });
    let tokenizer = Tokenizer::from_str(&json.to_string()).unwrap();
    TokenizerAdapter::new(tokenizer).unwrap()
}

/// `n` distinct words: "w0 w1 ... w{n-1}".
pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

/// Deterministic encoder. Hidden state of a token depends on its id only.
/// Inputs containing `fail_on` make inference fail.
#[derive(Default)]
pub struct StubEncoder {
    calls: AtomicUsize,
    fail_on: Option<i64>,
}

impl StubEncoder {
    pub fn failing_on(id: i64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(id),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Encoder for StubEncoder {
    fn infer(&self, input: &TokenizedInput) -> Result<Array3<f32>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = self.fail_on {
            if input.input_ids.contains(&id) {
                return Err(EmbedError::Inference(format!("token {id} rejected")));
            }
        }
        Ok(Array3::from_shape_fn((1, input.len(), HIDDEN), |(_, t, d)| {
            let id = input.input_ids[t] as f32;
            1.0 + ((id + 1.0) * (d as f32 + 1.0)).sin()
        }))
    }
}

pub fn service(encoder: Arc<StubEncoder>, chunk_size: usize, overlap: usize) -> EmbeddingService {
    EmbeddingService::new(
        tokenizer(&["hello", "world", "poison"]),
        encoder,
        chunk_size,
        overlap,
    )
    .unwrap()
}

pub fn handler(encoder: Arc<StubEncoder>, chunk_size: usize, overlap: usize) -> EmbedHandler {
    EmbedHandler::new(Arc::new(service(encoder, chunk_size, overlap)))
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
