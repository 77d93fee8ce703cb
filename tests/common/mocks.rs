//! Mock implementations for testing.
//!
//! Shared mock LLM clients and embedders so integration tests don't need a
//! live backend.

use async_trait::async_trait;
use playground::llm::{LLMClient, ModelParams};
use playground::rag::embeddings::LocalEmbedder;
use playground::rag::{Embedder, EmbeddingService, PipelineSettings, RagPipeline};
use playground::types::{AppError, GenerationFailureReason, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A prompt as seen by [`MockLLMClient`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: Option<String>,
    pub prompt: String,
    pub params: ModelParams,
}

/// Mock LLM client with a canned response.
///
/// ```ignore
/// let client = MockLLMClient::new("Hello, world!");
/// let client = MockLLMClient::failing(GenerationFailureReason::RateLimited);
/// let client = MockLLMClient::slow("late", Duration::from_secs(120));
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    failure: Option<GenerationFailureReason>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            failure: None,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always fails with `reason`.
    pub fn failing(reason: GenerationFailureReason) -> Self {
        Self {
            failure: Some(reason),
            ..Self::new("")
        }
    }

    /// Create a mock client that answers only after `delay`.
    pub fn slow(response: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(response)
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_system(
        &self,
        system: Option<&str>,
        prompt: &str,
        params: &ModelParams,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.map(str::to_string),
            prompt: prompt.to_string(),
            params: *params,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.failure {
            return Err(AppError::generation(reason, "Mock LLM failure"));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Wraps another embedder and counts the texts it is asked to embed.
pub struct CountingEmbedder<E> {
    inner: E,
    texts: AtomicUsize,
}

impl<E> CountingEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            texts: AtomicUsize::new(0),
        }
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CountingEmbedder<E> {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Embedder whose backend is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(AppError::EmbeddingFailure("Mock embedding failure".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-embedder"
    }
}

pub const TEST_DIMENSIONS: usize = 64;

pub fn local_embedder() -> CountingEmbedder<LocalEmbedder> {
    CountingEmbedder::new(LocalEmbedder::new(TEST_DIMENSIONS).unwrap())
}

/// A pipeline over the given embedder and LLM with default settings.
pub fn pipeline_with(embedder: Arc<dyn Embedder>, llm: MockLLMClient) -> RagPipeline {
    pipeline_with_settings(embedder, llm, PipelineSettings::default())
}

pub fn pipeline_with_settings(
    embedder: Arc<dyn Embedder>,
    llm: MockLLMClient,
    settings: PipelineSettings,
) -> RagPipeline {
    RagPipeline::new(
        Arc::new(EmbeddingService::new(embedder)),
        Arc::new(llm),
        settings,
    )
}
