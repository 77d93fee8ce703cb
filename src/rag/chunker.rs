//! Word-window document chunking.
//!
//! A document is tokenized on Unicode whitespace; chunks are windows of
//! `chunk_size` tokens that advance by `chunk_size - chunk_overlap`. Each
//! chunk's text is the original slice of the document from its first token
//! to its last, so interior whitespace is preserved.

use crate::types::{AppError, Result};
use playground_vector::Chunk;
use std::ops::Range;

/// Byte spans of the whitespace-delimited tokens in `text`.
pub fn tokenize(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(s..text.len());
    }

    spans
}

/// Number of tokens in `text`, using the same rule as [`tokenize`].
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Fails with `InvalidConfiguration` unless `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::InvalidConfiguration(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::InvalidConfiguration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a document into ordered, overlapping chunks.
    ///
    /// A document with no tokens yields no chunks. Every token belongs to at
    /// least one chunk, and consecutive chunks share exactly `chunk_overlap`
    /// tokens.
    pub fn split(&self, document: &str) -> Vec<Chunk> {
        let spans = tokenize(document);
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < spans.len() {
            let end = (start + self.chunk_size).min(spans.len());
            let text = &document[spans[start].start..spans[end - 1].end];
            chunks.push(Chunk::new(text, chunks.len()));

            if end == spans.len() {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Like [`split`](Self::split), tagging every chunk with `source_id`.
    pub fn split_with_source(&self, document: &str, source_id: &str) -> Vec<Chunk> {
        self.split(document)
            .into_iter()
            .map(|chunk| chunk.with_source_id(source_id))
            .collect()
    }
}
