//! Embedding backends and the batching service in front of them.
//!
//! - [`OpenAIEmbedder`] - `POST {api_base}/embeddings`
//! - [`OllamaEmbedder`] - `POST {base_url}/api/embed`
//! - [`LocalEmbedder`] - hashed bag-of-words, no network; for offline use and tests
//!
//! [`EmbeddingService`] splits large inputs into sub-batches, runs them
//! concurrently, reassembles results in input order and enforces a single
//! dimensionality for the lifetime of the service.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// A text-to-vector model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch, returning one vector per input in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::EmbeddingFailure("embedder returned no vector".to_string()))
    }

    fn model_name(&self) -> &str;
}

/// Runtime selection of an embedding backend.
#[derive(Debug, Clone)]
pub enum EmbeddingBackend {
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },
    Ollama {
        base_url: String,
        model: String,
    },
    Local {
        dimensions: usize,
    },
}

impl EmbeddingBackend {
    pub fn create_embedder(&self, timeout: Duration) -> Result<Arc<dyn Embedder>> {
        match self {
            EmbeddingBackend::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(OpenAIEmbedder::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                timeout,
            )?)),
            EmbeddingBackend::Ollama { base_url, model } => Ok(Arc::new(OllamaEmbedder::new(
                base_url.clone(),
                model.clone(),
                timeout,
            )?)),
            EmbeddingBackend::Local { dimensions } => {
                Ok(Arc::new(LocalEmbedder::new(*dimensions)?))
            }
        }
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

fn request_error(backend: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::EmbeddingFailure(format!("{} embedding request timed out", backend))
    } else {
        AppError::EmbeddingFailure(format!("{} embedding request failed: {}", backend, err))
    }
}

async fn check_status(backend: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::EmbeddingFailure(format!(
        "{} embedding API returned {}: {}",
        backend, status, body
    )))
}

// ============= OpenAI =============

pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbedder {
    pub fn new(api_key: String, api_base: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("OpenAI", e))?;
        let response = check_status("OpenAI", response).await?;

        let mut parsed: OpenAIEmbeddingResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingFailure(format!("Malformed OpenAI embedding response: {}", e))
        })?;

        // The API may return items out of order; `index` is authoritative.
        parsed.data.sort_by_key(|d| d.index);
        let in_order = parsed
            .data
            .iter()
            .enumerate()
            .all(|(i, d)| d.index == i);
        if parsed.data.len() != texts.len() || !in_order {
            return Err(AppError::EmbeddingFailure(format!(
                "OpenAI returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Ollama =============

pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("Ollama", e))?;
        let response = check_status("Ollama", response).await?;

        let parsed: OllamaEmbedResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingFailure(format!("Malformed Ollama embedding response: {}", e))
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(AppError::EmbeddingFailure(format!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Local =============

/// Deterministic hashed bag-of-words embedder.
///
/// Lower-cased alphanumeric terms are hashed (djb2) into `dimensions` buckets
/// weighted by term frequency, then L2-normalized. Texts without terms embed to
/// the zero vector.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(AppError::InvalidConfiguration(
                "local embedder dimensions must be at least 1".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for term in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            *tf.entry(term).or_insert(0) += 1;
        }

        for (term, count) in &tf {
            vector[djb2(term) % self.dimensions] += *count as f32;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

fn djb2(s: &str) -> usize {
    let mut hash: usize = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as usize);
    }
    hash
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_name(&self) -> &str {
        "local-hashed-bow"
    }
}

// ============= Service =============

/// Batching, ordering and dimension checks around an [`Embedder`].
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    concurrency: usize,
    dimensions: OnceLock<usize>,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            dimensions: OnceLock::new(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Dimensionality pinned by the first successful embedding, if any.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions.get().copied()
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed(text).await?;
        self.check_vector(&vector)?;
        Ok(vector)
    }

    /// Embed many texts; the output is aligned index-for-index with `texts`.
    ///
    /// Any sub-batch failure fails the whole call.
    #[tracing::instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<Vec<Vec<f32>>> =
            stream::iter(texts.chunks(self.batch_size).map(<[String]>::to_vec))
                .map(|batch| self.embed_sub_batch(batch))
                .buffered(self.concurrency)
                .try_collect()
                .await?;

        let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        for vector in &vectors {
            self.check_vector(vector)?;
        }

        tracing::debug!(
            count = vectors.len(),
            dimensions = self.dimensions(),
            "Embedded texts"
        );

        Ok(vectors)
    }

    async fn embed_sub_batch(&self, batch: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed_batch(&batch).await?;
        if vectors.len() != batch.len() {
            return Err(AppError::EmbeddingFailure(format!(
                "embedder returned {} vectors for {} inputs",
                vectors.len(),
                batch.len()
            )));
        }
        Ok(vectors)
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(AppError::EmbeddingFailure(
                "embedder returned an empty vector".to_string(),
            ));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(AppError::EmbeddingFailure(
                "embedder returned a non-finite value".to_string(),
            ));
        }

        let expected = *self.dimensions.get_or_init(|| vector.len());
        if vector.len() != expected {
            return Err(AppError::EmbeddingFailure(format!(
                "embedder returned {} dimensions, expected {}",
                vector.len(),
                expected
            )));
        }
        Ok(())
    }
}
