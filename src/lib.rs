//! # RAG Playground
//!
//! A small retrieval-augmented generation service: split a document into
//! overlapping word windows, embed them, and answer questions grounded in the
//! closest chunks.
//!
//! The service is stateless. `POST /api/splitandembed` returns the index to the
//! caller as text/vector pairs, and `POST /api/retrieveandquery` takes it back
//! together with the question.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use playground::rag::{EmbeddingService, PipelineSettings, QueryRequest, RagPipeline};
//! use playground::rag::embeddings::LocalEmbedder;
//! use playground::llm::{ModelParams, Provider};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let embeddings = Arc::new(EmbeddingService::new(Arc::new(LocalEmbedder::new(384)?)));
//! let llm = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! }
//! .create_client(Duration::from_secs(10))?;
//!
//! let pipeline = RagPipeline::new(embeddings, llm, PipelineSettings::default());
//! let index = pipeline.build_index(&document, 1024, 20).await?;
//! let answer = pipeline
//!     .answer_query(
//!         &index,
//!         &QueryRequest {
//!             query_text: "What is this about?".to_string(),
//!             top_k: 2,
//!             params: ModelParams::default(),
//!         },
//!     )
//!     .await?;
//! println!("{}", answer.text);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST handlers, routes and the OpenAPI document
//! - [`cli`] - command-line parsing, offline commands and terminal output
//! - [`llm`] - LLM client trait and the OpenAI/Ollama backends
//! - [`rag`] - chunking, embeddings, retrieval and answer synthesis
//! - [`types`] - wire types and error handling
//! - [`utils`] - TOML configuration
//!
//! Vector storage and similarity search live in the `playground-vector` crate.

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use llm::{LLMClient, ModelParams, Provider};
pub use rag::{EmbeddingService, RagPipeline};
pub use types::{AppError, Result};
pub use utils::toml_config::PlaygroundConfig;

use std::sync::Arc;

/// Shared state for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PlaygroundConfig>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(config: PlaygroundConfig, pipeline: RagPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Resolve providers and build the pipeline described by `config`.
    ///
    /// Fails with `InvalidConfiguration` when a referenced API key variable is
    /// unset.
    pub fn from_config(config: PlaygroundConfig) -> Result<Self> {
        let embedder = config
            .embeddings
            .resolve()?
            .create_embedder(config.embeddings.timeout())?;
        let embeddings = EmbeddingService::new(embedder)
            .with_batch_size(config.embeddings.batch_size)
            .with_concurrency(config.embeddings.concurrency);

        let provider = config.llm.resolve()?;
        let llm = provider.create_client(config.llm.connect_timeout())?;

        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            embedding_model = embeddings.model_name(),
            "Initialized pipeline"
        );

        let pipeline = RagPipeline::new(
            Arc::new(embeddings),
            llm,
            config.rag.pipeline_settings(),
        );

        Ok(Self::new(config, pipeline))
    }
}
