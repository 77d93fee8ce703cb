//! LLM client abstraction and provider selection
//!
//! Two providers are supported:
//! - **OpenAI**: any `/chat/completions` compatible API
//! - **Ollama**: local inference via `/api/chat`

use crate::types::{AppError, GenerationFailureReason, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

/// Sampling parameters passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
        }
    }
}

impl ModelParams {
    pub fn new(temperature: f32, top_p: f32) -> Self {
        Self { temperature, top_p }
    }

    /// Check both parameters against the backend's accepted ranges.
    ///
    /// `top_p` must lie in [0, 1]; `temperature` in `temperature_range`.
    pub fn validate(&self, temperature_range: RangeInclusive<f32>) -> Result<()> {
        if !self.temperature.is_finite() || !temperature_range.contains(&self.temperature) {
            return Err(AppError::InvalidConfiguration(format!(
                "temperature must be between {} and {}, got {}",
                temperature_range.start(),
                temperature_range.end(),
                self.temperature
            )));
        }
        if !self.top_p.is_finite() || !(0.0..=1.0).contains(&self.top_p) {
            return Err(AppError::InvalidConfiguration(format!(
                "top_p must be between 0 and 1, got {}",
                self.top_p
            )));
        }
        Ok(())
    }
}

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion, optionally preceded by a system message
    async fn generate_with_system(
        &self,
        system: Option<&str>,
        prompt: &str,
        params: &ModelParams,
    ) -> Result<String>;

    /// Generate a completion from a single user prompt
    async fn generate(&self, prompt: &str, params: &ModelParams) -> Result<String> {
        self.generate_with_system(None, prompt, params).await
    }

    /// Get the model name/identifier
    fn model_name(&self) -> &str;

    /// Temperatures this backend accepts
    fn temperature_range(&self) -> RangeInclusive<f32> {
        0.0..=2.0
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// `connect_timeout` bounds connection setup only; whole-request deadlines
    /// are enforced by the caller.
    pub fn create_client(&self, connect_timeout: Duration) -> Result<Arc<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                connect_timeout,
            )?)),
            Provider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone(), connect_timeout)?,
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}

pub(crate) fn build_http_client(connect_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport error to a generation failure.
pub(crate) fn send_error(provider: &str, err: reqwest::Error) -> AppError {
    let reason = if err.is_timeout() {
        GenerationFailureReason::Timeout
    } else {
        GenerationFailureReason::Upstream
    };
    AppError::generation(reason, format!("{} request failed: {}", provider, err))
}

/// Turn a non-success response into a generation failure.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        GenerationFailureReason::RateLimited
    } else {
        GenerationFailureReason::Upstream
    };
    Err(AppError::generation(
        reason,
        format!("{} API returned {}: {}", provider, status, body),
    ))
}
