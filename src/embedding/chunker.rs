//! Token-window text chunking.
//!
//! Splits text into windows of at most `chunk_size` tokens where neighbouring
//! windows share `overlap` tokens. Boundaries come from the same tokenizer the
//! encoder uses, and every chunk's text is re-counted, so a chunk never exceeds
//! the model budget.

use std::ops::Range;
use std::sync::Arc;

use anyhow::Result;

use super::tokenizer::{TokenSpan, TokenizerAdapter};
use crate::error::EmbedError;

/// One chunk of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Source text covered by the chunk's tokens.
    pub text: String,
    /// Token positions of the chunk within the whole text's token stream.
    pub tokens: Range<usize>,
}

pub struct TextChunker {
    tokenizer: Arc<TokenizerAdapter>,
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(
        tokenizer: Arc<TokenizerAdapter>,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<Self> {
        anyhow::ensure!(chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            overlap < chunk_size,
            "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
        );
        Ok(Self {
            tokenizer,
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into ordered chunks.
    ///
    /// Text that fits in one window comes back unchanged as a single chunk.
    /// Otherwise windows start and end on word boundaries, so a chunk's text
    /// tokenizes to the same tokens it covers in the whole text. Neighbours
    /// share `overlap` tokens unless the shared run would begin mid-word, in
    /// which case it is shortened to the next word start. A single word longer
    /// than a window is split between its tokens.
    ///
    /// Every call recomputes from scratch.
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, EmbedError> {
        let spans = self.tokenizer.token_spans(text)?;
        let total = spans.len();

        if total <= self.chunk_size {
            return Ok(vec![Chunk {
                text: text.to_string(),
                tokens: 0..total,
            }]);
        }

        let stride = self.chunk_size - self.overlap;
        let mut chunks = Vec::with_capacity(total.div_ceil(stride));
        let mut start = 0;
        loop {
            let end = self.window_end(text, &spans, start)?;
            chunks.push(Chunk {
                text: text[spans[start].start..spans[end - 1].end].to_string(),
                tokens: start..end,
            });

            if end == total {
                break;
            }
            start = next_start(&spans, start, end, self.overlap);
        }

        Ok(chunks)
    }

    /// End of the window beginning at token `start`.
    ///
    /// Prefers the last word boundary within `chunk_size` tokens, then backs off
    /// one token at a time until the sliced text tokenizes to at most
    /// `chunk_size` tokens on its own.
    fn window_end(
        &self,
        text: &str,
        spans: &[TokenSpan],
        start: usize,
    ) -> Result<usize, EmbedError> {
        let limit = (start + self.chunk_size).min(spans.len());
        let mut end = if limit == spans.len() {
            limit
        } else {
            (start + 1..=limit)
                .rev()
                .find(|&i| spans[i].starts_word)
                .unwrap_or(limit)
        };

        loop {
            let slice = &text[spans[start].start..spans[end - 1].end];
            let count = self.tokenizer.count_tokens(slice)?;
            if count <= self.chunk_size {
                return Ok(end);
            }
            if end == start + 1 {
                return Err(EmbedError::Tokenization(format!(
                    "token {start} alone tokenizes to {count} tokens, more than chunk_size {}",
                    self.chunk_size
                )));
            }
            tracing::debug!(start, end, count, "chunk text re-tokenized too long, shrinking");
            end -= 1;
        }
    }
}

/// First token of the window after `start..end`: `overlap` tokens back from
/// `end`, moved forward to a word start. Always makes progress.
fn next_start(spans: &[TokenSpan], start: usize, end: usize, overlap: usize) -> usize {
    let floor = end.saturating_sub(overlap).max(start + 1);
    (floor..end).find(|&i| spans[i].starts_word).unwrap_or(end)
}
