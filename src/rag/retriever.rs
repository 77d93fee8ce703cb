//! Query-time retrieval: embed the question, then exact top-k over an index.

use crate::rag::embeddings::EmbeddingService;
use crate::types::{AppError, Result};
use playground_vector::{RetrievalResult, VectorIndex};
use std::sync::Arc;

pub struct Retriever {
    embeddings: Arc<EmbeddingService>,
}

impl Retriever {
    pub fn new(embeddings: Arc<EmbeddingService>) -> Self {
        Self { embeddings }
    }

    /// Up to `k` chunks most similar to `query`, best first.
    ///
    /// An empty index yields an empty result without calling the embedder.
    #[tracing::instrument(skip(self, index, query), fields(index_len = index.len()))]
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(AppError::InvalidConfiguration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if index.is_empty() {
            return Ok(RetrievalResult::empty());
        }

        let query_vector = self.embeddings.embed_text(query).await?;
        let result = index.top_k(&query_vector, k)?;

        tracing::debug!(
            hits = result.len(),
            best_score = result.hits.first().map(|h| h.score),
            "Retrieved chunks"
        );

        Ok(result)
    }
}
