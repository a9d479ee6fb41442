//! HuggingFace tokenizer adapter.
//!
//! Produces model inputs ([`TokenizedInput`]) for the encoder and exposes the
//! raw token offsets the chunker uses to place chunk boundaries.

use std::path::Path;

use anyhow::Result;
use tokenizers::{PostProcessor, Tokenizer};

use super::TokenizedInput;
use crate::error::EmbedError;

/// Byte range of one content token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
    /// First token of a pre-tokenized word.
    pub starts_word: bool,
}

/// Read-only wrapper around a loaded [`Tokenizer`]. Safe to share across threads.
pub struct TokenizerAdapter {
    tokenizer: Tokenizer,
    special_tokens: usize,
}

impl TokenizerAdapter {
    pub fn from_file(path: &Path) -> Result<Self> {
        anyhow::ensure!(
            path.exists(),
            "Tokenizer not found at {}. Run `embedd model download` first.",
            path.display()
        );

        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        let adapter = Self::new(tokenizer)?;

        tracing::info!(tokenizer = %path.display(), "tokenizer loaded");
        Ok(adapter)
    }

    /// Wrap an already-built tokenizer. Truncation and padding are switched off:
    /// token counts must reflect the text exactly for chunking to be accurate.
    pub fn new(mut tokenizer: Tokenizer) -> Result<Self> {
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("failed to disable truncation: {e}"))?;
        tokenizer.with_padding(None);

        let special_tokens = tokenizer
            .get_post_processor()
            .map_or(0, |processor| processor.added_tokens(false));

        Ok(Self {
            tokenizer,
            special_tokens,
        })
    }

    /// Encode `text` (with the model's special tokens) into encoder inputs.
    pub fn tokenize(&self, text: &str) -> Result<TokenizedInput, EmbedError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbedError::Tokenization(e.to_string()))?;

        if encoding.is_empty() {
            return Err(EmbedError::Tokenization(format!(
                "text of {} bytes produced no tokens",
                text.len()
            )));
        }

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&mask| mask as i64)
            .collect();
        // single sentence, no segment B
        let token_type_ids = vec![0i64; input_ids.len()];

        Ok(TokenizedInput {
            input_ids,
            attention_mask,
            token_type_ids,
        })
    }

    /// Number of content tokens in an encoded input, excluding the special
    /// tokens the post-processor adds.
    pub fn content_len(&self, input: &TokenizedInput) -> usize {
        input.len().saturating_sub(self.special_tokens)
    }

    /// Byte offsets of every content token in `text` (no special tokens).
    pub fn token_offsets(&self, text: &str) -> Result<Vec<(usize, usize)>, EmbedError> {
        Ok(self
            .token_spans(text)?
            .into_iter()
            .map(|span| (span.start, span.end))
            .collect())
    }

    /// Content tokens of `text` with their byte ranges and word starts.
    pub fn token_spans(&self, text: &str) -> Result<Vec<TokenSpan>, EmbedError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| EmbedError::Tokenization(e.to_string()))?;

        let words = encoding.get_word_ids();
        let spans = encoding
            .get_offsets()
            .iter()
            .enumerate()
            .map(|(i, &(start, end))| TokenSpan {
                start,
                end,
                starts_word: i == 0 || words[i].is_none() || words[i] != words[i - 1],
            })
            .collect();
        Ok(spans)
    }

    /// Number of content tokens in `text` (no special tokens).
    pub fn count_tokens(&self, text: &str) -> Result<usize, EmbedError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| EmbedError::Tokenization(e.to_string()))?;
        Ok(encoding.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{word_tokenizer, wordpiece_tokenizer};

    fn adapter() -> TokenizerAdapter {
        TokenizerAdapter::new(word_tokenizer(&["hello", "world"])).unwrap()
    }

    #[test]
    fn tokenize_builds_aligned_inputs() {
        let adapter = adapter();
        let input = adapter.tokenize("hello brave world").unwrap();

        assert_eq!(input.input_ids, vec![1, 0, 2]);
        assert_eq!(input.attention_mask, vec![1, 1, 1]);
        assert_eq!(input.token_type_ids, vec![0, 0, 0]);
        assert_eq!(input.len(), 3);
    }

    #[test]
    fn preset_truncation_is_disabled() {
        let mut tokenizer = word_tokenizer(&["hello", "world"]);
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 2,
                ..Default::default()
            }))
            .unwrap();

        let adapter = TokenizerAdapter::new(tokenizer).unwrap();
        assert_eq!(adapter.count_tokens("hello world hello world").unwrap(), 4);
    }

    #[test]
    fn whitespace_only_text_is_a_tokenization_error() {
        let adapter = adapter();
        let err = adapter.tokenize("   \n ").unwrap_err();
        assert!(matches!(err, EmbedError::Tokenization(_)));
    }

    #[test]
    fn offsets_point_into_source_text() {
        let adapter = adapter();
        let text = "hello  world";
        let offsets = adapter.token_offsets(text).unwrap();
        assert_eq!(offsets, vec![(0, 5), (7, 12)]);
        assert_eq!(&text[offsets[1].0..offsets[1].1], "world");
    }

    #[test]
    fn spans_mark_word_starts() {
        let adapter =
            TokenizerAdapter::new(wordpiece_tokenizer(&["a", "##bcd", "x"])).unwrap();
        let spans = adapter.token_spans("abcd x").unwrap();

        let starts: Vec<_> = spans.iter().map(|s| s.starts_word).collect();
        assert_eq!(starts, vec![true, false, true]);
        assert_eq!((spans[1].start, spans[1].end), (1, 4));
    }

    #[test]
    fn content_len_without_post_processor_is_full_length() {
        let adapter = adapter();
        let input = adapter.tokenize("hello world").unwrap();
        assert_eq!(adapter.content_len(&input), 2);
    }
}
