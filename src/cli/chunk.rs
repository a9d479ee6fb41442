//! CLI `chunk` command: show chunk boundaries without running the model.

use std::sync::Arc;

use anyhow::Result;

use embedd::config::EmbeddConfig;
use embedd::embedding::chunker::TextChunker;
use embedd::embedding::tokenizer::TokenizerAdapter;

pub fn chunk(config: &EmbeddConfig, text: &str) -> Result<()> {
    anyhow::ensure!(!text.is_empty(), "{}", embedd::error::EMPTY_TEXT_MESSAGE);

    let resolved = config.resolve()?;
    let tokenizer = TokenizerAdapter::from_file(&resolved.tokenizer_path)?;
    let chunker = TextChunker::new(Arc::new(tokenizer), resolved.chunk_size, resolved.overlap)?;

    let chunks = chunker.chunk(text)?;
    println!(
        "{} chunk(s) (chunk_size: {}, overlap: {})\n",
        chunks.len(),
        chunker.chunk_size(),
        chunker.overlap()
    );

    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "  {}. tokens {}..{} ({} tokens)",
            i + 1,
            chunk.tokens.start,
            chunk.tokens.end,
            chunk.tokens.len()
        );
        println!("     {}", chunk.text.replace('\n', "\n     "));
        println!();
    }

    Ok(())
}
