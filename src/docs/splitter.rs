use std::sync::Arc;

use anyhow::{Context, Result};
use text_splitter::ChunkConfig;

use crate::config::RetrievalConfig;

use super::types::{DocumentChunk, RawDocument};

/// Character splitter. Lengths are counted in chars.
///
/// Text is cut at the coarsest boundary that keeps chunks within
/// `chunk_size` (blank lines, then lines, sentences, words, characters), and
/// each chunk repeats up to `chunk_overlap` chars from the end of the previous
/// one.
pub struct TextSplitter {
    inner: text_splitter::TextSplitter<text_splitter::Characters>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        anyhow::ensure!(chunk_size > 0, "chunk size must be positive");
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .with_context(|| {
                format!("overlap {} does not fit chunk size {}", chunk_overlap, chunk_size)
            })?;
        Ok(Self {
            inner: text_splitter::TextSplitter::new(config),
        })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn split_document(&self, doc: &RawDocument) -> Vec<Arc<DocumentChunk>> {
        self.split_text(&doc.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Arc::new(DocumentChunk::new(&doc.source, i, text)))
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.inner
            .chunks(text)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}
