//! Retrieval Augmented Generation (RAG) pipeline
//!
//! # Module Structure
//!
//! - [`chunker`] - word-window document splitting
//! - [`embeddings`] - embedding backends and the batching [`EmbeddingService`]
//! - [`retriever`] - query embedding plus exact top-k search
//! - [`synthesizer`] - context packing and grounded generation
//! - [`pipeline`] - the index-build and query flows tying it together
//!
//! # Flow
//!
//! 1. **Ingestion** - a document is chunked and every chunk embedded
//! 2. **Transport** - the index is returned to the caller as text/vector pairs
//! 3. **Retrieval** - the query is embedded and the closest chunks selected
//! 4. **Generation** - the LLM answers from those chunks only
//!
//! ```ignore
//! let pipeline = RagPipeline::new(embeddings, llm, PipelineSettings::default());
//! let index = pipeline.build_index(&document, 1024, 20).await?;
//! let answer = pipeline
//!     .answer_query(&index, &QueryRequest { query_text, top_k: 2, params })
//!     .await?;
//! ```

pub mod chunker;
pub mod embeddings;
pub mod pipeline;
pub mod retriever;
pub mod synthesizer;

pub use chunker::TextChunker;
pub use embeddings::{Embedder, EmbeddingBackend, EmbeddingService};
pub use pipeline::{nodes_from_index, PipelineSettings, QueryRequest, RagPipeline};
pub use retriever::Retriever;
pub use synthesizer::{Answer, AnswerSynthesizer};
