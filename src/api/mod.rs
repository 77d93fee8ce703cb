//! HTTP API handlers and routes
//!
//! # API Endpoints
//!
//! - `POST /api/splitandembed` - chunk and embed a document, returning the index
//! - `POST /api/retrieveandquery` - answer a question against a supplied index
//! - `GET /api/health` - liveness and configured models
//! - `GET /api/openapi.json` - OpenAPI document
//!
//! Errors are returned as `{"error": "...", "kind": "..."}` with a status
//! derived from the error kind.

/// Request handlers.
pub mod handlers;
/// Router configuration and middleware.
pub mod routes;

use crate::types::{
    ErrorResponse, GenerationFailureReason, HealthResponse, NodeWithEmbedding,
    RetrieveAndQueryPayload, RetrieveAndQueryRequest, RetrieveAndQueryResponse, SourceNode,
    SplitAndEmbedPayload, SplitAndEmbedRequest, SplitAndEmbedResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "RAG Playground API"),
    paths(
        handlers::rag::split_and_embed,
        handlers::rag::retrieve_and_query,
        handlers::health::health,
    ),
    components(schemas(
        NodeWithEmbedding,
        SplitAndEmbedRequest,
        SplitAndEmbedPayload,
        SplitAndEmbedResponse,
        RetrieveAndQueryRequest,
        RetrieveAndQueryPayload,
        RetrieveAndQueryResponse,
        SourceNode,
        HealthResponse,
        ErrorResponse,
        GenerationFailureReason,
    )),
    tags(
        (name = "rag", description = "Document indexing and question answering"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;
