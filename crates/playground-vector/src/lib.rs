//! # playground-vector
//!
//! A small in-memory vector index for the RAG playground: exact top-k search
//! over chunk embeddings with deterministic ordering.
//!
//! ## Quick Start
//!
//! ```rust
//! use playground_vector::{Chunk, DistanceMetric, IndexedChunk, VectorIndex};
//!
//! let index = VectorIndex::with_metric(DistanceMetric::Cosine);
//! index.append(vec![
//!     IndexedChunk::new(Chunk::new("cats", 0), vec![1.0, 0.0]),
//!     IndexedChunk::new(Chunk::new("dogs", 1), vec![0.0, 1.0]),
//! ])?;
//!
//! let results = index.top_k(&[0.9, 0.1], 1)?;
//! assert_eq!(results.hits[0].chunk.text, "cats");
//! # Ok::<(), playground_vector::Error>(())
//! ```
//!
//! ## Guarantees
//!
//! - Every entry has the same dimensionality; appends that break this fail
//!   with [`Error::DimensionMismatch`] and leave the index untouched.
//! - Results are sorted by descending score, ties by ascending
//!   [`Chunk::ordinal`].
//! - Cosine similarity against a zero-magnitude vector is 0.
//! - Reads are lock-free snapshots; concurrent `top_k` calls never observe a
//!   partially appended batch.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod index;
pub mod types;

// Re-exports for convenience
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use index::{IndexStats, VectorIndex};
pub use types::{Chunk, IndexedChunk, RetrievalResult, ScoredChunk};
