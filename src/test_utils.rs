//! Shared helpers for unit tests. Only compiled when running tests.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array3;
use tokenizers::Tokenizer;

use crate::embedding::{Encoder, TokenizedInput};
use crate::error::EmbedError;

/// Hidden size produced by [`FakeEncoder`].
pub const FAKE_HIDDEN: usize = 4;

/// Build a word-level tokenizer splitting on whitespace and punctuation.
///
/// `[UNK]` is id 0, `words[i]` is id `i + 1`. Unknown words still count as one token.
pub fn word_tokenizer(words: &[&str]) -> Tokenizer {
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
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    });
    Tokenizer::from_str(&json.to_string()).expect("valid tokenizer definition")
}

/// Build a WordPiece tokenizer over `vocab` with a whitespace pre-tokenizer.
///
/// `[UNK]` is id 0, `vocab[i]` is id `i + 1`. Continuation pieces use the `##` prefix.
pub fn wordpiece_tokenizer(vocab: &[&str]) -> Tokenizer {
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
    Tokenizer::from_str(&json.to_string()).expect("valid tokenizer definition")
}

/// Deterministic stand-in for the ONNX encoder.
///
/// Token `t` with id `i` maps to `[1, i, i % 3, 0.5]`, so the pooled vector is never zero.
#[derive(Default)]
pub struct FakeEncoder {
    pub calls: AtomicUsize,
}

impl FakeEncoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Encoder for FakeEncoder {
    fn infer(&self, input: &TokenizedInput) -> Result<Array3<f32>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let seq_len = input.len();
        Ok(Array3::from_shape_fn((1, seq_len, FAKE_HIDDEN), |(_, t, d)| {
            let id = input.input_ids[t] as f32;
            match d {
                0 => 1.0,
                1 => id,
                2 => (input.input_ids[t] % 3) as f32,
                _ => 0.5,
            }
        }))
    }
}
