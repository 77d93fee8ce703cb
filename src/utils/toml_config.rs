//! TOML-based configuration (`playground.toml`)
//!
//! Every section is optional. API keys are never stored in the file; providers
//! name the environment variable that holds them, resolved at startup.

use crate::llm::Provider;
use crate::rag::{EmbeddingBackend, PipelineSettings};
use crate::types::AppError;
use playground_vector::DistanceMetric;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from playground.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub rag: RagConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Upper bound on request bodies; query requests carry the whole index
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LlmProviderConfig {
    OpenAI {
        /// Environment variable containing API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_chat_model")]
        model: String,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_chat_model")]
        model: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(flatten)]
    pub provider: LlmProviderConfig,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_chat_model() -> String {
    "gpt-4".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_chat_model() -> String {
    "llama3.2".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderConfig::OpenAI {
                api_key_env: default_openai_key_env(),
                api_base: default_openai_base(),
                model: default_openai_chat_model(),
            },
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Resolve env var references into a ready-to-build [`Provider`].
    pub fn resolve(&self) -> Result<Provider, ConfigError> {
        match &self.provider {
            LlmProviderConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => Ok(Provider::OpenAI {
                api_key: resolve_env(api_key_env)?,
                api_base: api_base.clone(),
                model: model.clone(),
            }),
            LlmProviderConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmbeddingProviderConfig {
    OpenAI {
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_embedding_model")]
        model: String,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_embedding_model")]
        model: String,
    },
    /// Hashed bag-of-words; needs no network
    Local {
        #[serde(default = "default_local_dimensions")]
        dimensions: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(flatten)]
    pub provider: EmbeddingProviderConfig,

    /// Texts per backend request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Backend requests in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_openai_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_ollama_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_local_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    crate::rag::embeddings::DEFAULT_BATCH_SIZE
}

fn default_concurrency() -> usize {
    crate::rag::embeddings::DEFAULT_CONCURRENCY
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderConfig::OpenAI {
                api_key_env: default_openai_key_env(),
                api_base: default_openai_base(),
                model: default_openai_embedding_model(),
            },
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

impl EmbeddingsConfig {
    pub fn resolve(&self) -> Result<EmbeddingBackend, ConfigError> {
        match &self.provider {
            EmbeddingProviderConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => Ok(EmbeddingBackend::OpenAI {
                api_key: resolve_env(api_key_env)?,
                api_base: api_base.clone(),
                model: model.clone(),
            }),
            EmbeddingProviderConfig::Ollama { base_url, model } => Ok(EmbeddingBackend::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
            EmbeddingProviderConfig::Local { dimensions } => Ok(EmbeddingBackend::Local {
                dimensions: *dimensions,
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub default_chunk_overlap: usize,

    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Budget for retrieved context, in whitespace-delimited tokens
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    #[serde(default)]
    pub metric: DistanceMetric,

    /// Optional system message sent ahead of the QA prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_chunk_size() -> usize {
    1024
}

fn default_chunk_overlap() -> usize {
    20
}

fn default_top_k() -> usize {
    2
}

fn default_max_context_tokens() -> usize {
    crate::rag::synthesizer::DEFAULT_MAX_CONTEXT_TOKENS
}

fn default_generation_timeout_secs() -> u64 {
    60
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: default_chunk_size(),
            default_chunk_overlap: default_chunk_overlap(),
            default_top_k: default_top_k(),
            max_context_tokens: default_max_context_tokens(),
            generation_timeout_secs: default_generation_timeout_secs(),
            metric: DistanceMetric::default(),
            system_prompt: None,
        }
    }
}

impl RagConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            metric: self.metric,
            max_context_tokens: self.max_context_tokens,
            generation_timeout: Duration::from_secs(self.generation_timeout_secs),
            system_prompt: self.system_prompt.clone(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::InvalidConfiguration(err.to_string())
    }
}

fn resolve_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

impl PlaygroundConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: PlaygroundConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Check value ranges. Env var references are checked by `resolve`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;
        if rag.default_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.default_chunk_size must be at least 1".to_string(),
            ));
        }
        if rag.default_chunk_overlap >= rag.default_chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.default_chunk_overlap ({}) must be smaller than rag.default_chunk_size ({})",
                rag.default_chunk_overlap, rag.default_chunk_size
            )));
        }
        if rag.default_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "rag.default_top_k must be at least 1".to_string(),
            ));
        }
        if rag.max_context_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "rag.max_context_tokens must be at least 1".to_string(),
            ));
        }
        if rag.generation_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "rag.generation_timeout_secs must be at least 1".to_string(),
            ));
        }

        let embeddings = &self.embeddings;
        if embeddings.batch_size == 0 || embeddings.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "embeddings.batch_size and embeddings.concurrency must be at least 1".to_string(),
            ));
        }
        if embeddings.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "embeddings.timeout_secs must be at least 1".to_string(),
            ));
        }
        if let EmbeddingProviderConfig::Local { dimensions: 0 } = embeddings.provider {
            return Err(ConfigError::ValidationError(
                "embeddings.dimensions must be at least 1".to_string(),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_body_bytes must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
