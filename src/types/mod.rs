use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// ============= Wire Types =============

/// A chunk of text together with its embedding, as carried between the
/// split and query endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NodeWithEmbedding {
    /// Chunk text
    pub text: String,
    /// Embedding vector for `text`
    pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SplitAndEmbedRequest {
    /// Raw document text to split and embed
    pub document: String,
    /// Words per chunk (defaults to `rag.default_chunk_size`)
    #[serde(default)]
    pub chunk_size: Option<i64>,
    /// Words shared by consecutive chunks (defaults to `rag.default_chunk_overlap`)
    #[serde(default)]
    pub chunk_overlap: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SplitAndEmbedPayload {
    pub nodes_with_embedding: Vec<NodeWithEmbedding>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SplitAndEmbedResponse {
    pub payload: SplitAndEmbedPayload,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndQueryRequest {
    /// Natural-language question
    pub query: String,
    /// Number of chunks to retrieve (defaults to `rag.default_top_k`)
    #[serde(default)]
    pub top_k: Option<i64>,
    /// Index produced by `/api/splitandembed`
    pub nodes_with_embedding: Vec<NodeWithEmbedding>,
    pub temperature: f32,
    pub top_p: f32,
}

/// A chunk that grounded the answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceNode {
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndQueryPayload {
    pub response: String,
    /// Chunks placed in the prompt, in rank order
    #[serde(default)]
    pub source_nodes: Vec<SourceNode>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RetrieveAndQueryResponse {
    pub payload: RetrieveAndQueryPayload,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub llm_model: String,
    pub embedding_model: String,
}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable error kind, e.g. `invalid_configuration`
    pub kind: String,
}

// ============= Error Types =============

/// Why a generation call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailureReason {
    Timeout,
    RateLimited,
    Upstream,
    MalformedResponse,
}

impl GenerationFailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationFailureReason::Timeout => "timeout",
            GenerationFailureReason::RateLimited => "rate_limited",
            GenerationFailureReason::Upstream => "upstream",
            GenerationFailureReason::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for GenerationFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Generation failed ({reason}): {message}")]
    GenerationFailure {
        reason: GenerationFailureReason,
        message: String,
    },

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn generation(reason: GenerationFailureReason, message: impl Into<String>) -> Self {
        AppError::GenerationFailure {
            reason,
            message: message.into(),
        }
    }

    /// Stable identifier used in error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidConfiguration(_) => "invalid_configuration",
            AppError::EmbeddingFailure(_) => "embedding_failure",
            AppError::DimensionMismatch { .. } => "dimension_mismatch",
            AppError::GenerationFailure { .. } => "generation_failure",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AppError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            AppError::DimensionMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmbeddingFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::GenerationFailure { reason, .. } => match reason {
                GenerationFailureReason::Timeout => StatusCode::GATEWAY_TIMEOUT,
                GenerationFailureReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                GenerationFailureReason::Upstream | GenerationFailureReason::MalformedResponse => {
                    StatusCode::BAD_GATEWAY
                }
            },
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<playground_vector::Error> for AppError {
    fn from(err: playground_vector::Error) -> Self {
        match err {
            playground_vector::Error::DimensionMismatch { expected, actual } => {
                AppError::DimensionMismatch { expected, actual }
            }
            playground_vector::Error::InvalidVector(msg) => {
                AppError::InvalidConfiguration(format!("invalid vector: {}", msg))
            }
            playground_vector::Error::InvalidK(k) => {
                AppError::InvalidConfiguration(format!("top_k must be at least 1, got {}", k))
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
