//! The two top-level flows: index build and query answering.
//!
//! Indexes are request-scoped. A build returns the index to the caller, who
//! serializes it with [`nodes_from_index`] and sends it back with each query;
//! [`RagPipeline::index_from_nodes`] rebuilds it server-side.

use crate::llm::{LLMClient, ModelParams};
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::EmbeddingService;
use crate::rag::retriever::Retriever;
use crate::rag::synthesizer::{
    Answer, AnswerSynthesizer, DEFAULT_GENERATION_TIMEOUT, DEFAULT_MAX_CONTEXT_TOKENS,
};
use crate::types::{NodeWithEmbedding, Result};
use playground_vector::{Chunk, DistanceMetric, IndexedChunk, VectorIndex};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub metric: DistanceMetric,
    pub max_context_tokens: usize,
    pub generation_timeout: Duration,
    pub system_prompt: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Cosine,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query_text: String,
    pub top_k: usize,
    pub params: ModelParams,
}

pub struct RagPipeline {
    embeddings: Arc<EmbeddingService>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    metric: DistanceMetric,
}

impl RagPipeline {
    pub fn new(
        embeddings: Arc<EmbeddingService>,
        llm: Arc<dyn LLMClient>,
        settings: PipelineSettings,
    ) -> Self {
        let synthesizer = AnswerSynthesizer::new(llm)
            .with_max_context_tokens(settings.max_context_tokens)
            .with_timeout(settings.generation_timeout)
            .with_system_prompt(settings.system_prompt);

        Self {
            retriever: Retriever::new(embeddings.clone()),
            embeddings,
            synthesizer,
            metric: settings.metric,
        }
    }

    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    pub fn llm_model(&self) -> &str {
        self.synthesizer.model_name()
    }

    /// Chunk, embed and index a document.
    ///
    /// Chunking parameters are checked before any embedding work. A document
    /// without tokens produces an empty index.
    #[tracing::instrument(skip(self, document), fields(chars = document.len()))]
    pub async fn build_index(
        &self,
        document: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<VectorIndex> {
        let chunker = TextChunker::new(chunk_size, chunk_overlap)?;
        let source_id = uuid::Uuid::new_v4().to_string();
        let chunks = chunker.split_with_source(document, &source_id);

        if chunks.is_empty() {
            return Ok(VectorIndex::with_metric(self.metric));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embeddings.embed_texts(&texts).await?;

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| IndexedChunk::new(chunk, embedding));
        let index = VectorIndex::from_entries(entries, self.metric)?;

        tracing::info!(
            source_id = %source_id,
            chunks = index.len(),
            dimensions = index.dimensions(),
            "Built index"
        );

        Ok(index)
    }

    /// Rebuild an index from transported nodes; ordinals follow array order.
    pub fn index_from_nodes(&self, nodes: &[NodeWithEmbedding]) -> Result<VectorIndex> {
        let entries = nodes.iter().enumerate().map(|(ordinal, node)| {
            IndexedChunk::new(Chunk::new(node.text.clone(), ordinal), node.embedding.clone())
        });
        Ok(VectorIndex::from_entries(entries, self.metric)?)
    }

    /// Retrieve the top-k chunks for the query and synthesize an answer.
    ///
    /// Request parameters are validated before the query is embedded.
    #[tracing::instrument(skip(self, index, request), fields(top_k = request.top_k, index_len = index.len()))]
    pub async fn answer_query(&self, index: &VectorIndex, request: &QueryRequest) -> Result<Answer> {
        self.synthesizer.validate_params(&request.params)?;

        let retrieval = self
            .retriever
            .retrieve(index, &request.query_text, request.top_k)
            .await?;

        self.synthesizer
            .answer(&retrieval, &request.query_text, &request.params)
            .await
    }
}

/// Serialize an index into its transport form, in ordinal order.
pub fn nodes_from_index(index: &VectorIndex) -> Vec<NodeWithEmbedding> {
    index
        .entries()
        .into_iter()
        .map(|entry| NodeWithEmbedding {
            text: entry.chunk.text,
            embedding: entry.embedding,
        })
        .collect()
}
