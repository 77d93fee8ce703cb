//! Common types for playground-vector.

use serde::{Deserialize, Serialize};

/// A contiguous slice of source text, the unit of retrieval.
///
/// Chunks are immutable once created. `ordinal` is the chunk's position in its
/// source document and is used for deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text.
    pub text: String,
    /// Position in the source document (0-based).
    pub ordinal: usize,
    /// Optional identifier of the source document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Chunk {
    /// Create a chunk without a source id.
    pub fn new(text: impl Into<String>, ordinal: usize) -> Self {
        Self {
            text: text.into(),
            ordinal,
            source_id: None,
        }
    }

    /// Attach a source document id.
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// The chunk.
    pub chunk: Chunk,
    /// Its embedding.
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    /// Pair a chunk with its embedding.
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }

    /// Dimensionality of the embedding.
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Similarity score (higher = more similar).
    pub score: f64,
}

/// Ranked top-k hits, highest score first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Hits in descending score order.
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Wrap already-ranked hits.
    pub fn new(hits: Vec<ScoredChunk>) -> Self {
        Self { hits }
    }

    /// An empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True if nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Iterate the hits in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.hits.iter()
    }

    /// The chunks in rank order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.hits.iter().map(|h| &h.chunk)
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredChunk;
    type IntoIter = std::vec::IntoIter<ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}
