//! Index-build and query handlers.
//!
//! Both endpoints are stateless: the index travels in the request and
//! response bodies and nothing is kept between calls.

use crate::{
    llm::ModelParams,
    rag::{nodes_from_index, QueryRequest},
    types::{
        AppError, ErrorResponse, Result, RetrieveAndQueryPayload, RetrieveAndQueryRequest,
        RetrieveAndQueryResponse, SourceNode, SplitAndEmbedPayload, SplitAndEmbedRequest,
        SplitAndEmbedResponse,
    },
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::time::Instant;

/// Resolve an optional signed wire integer to a count, falling back to
/// `default` when absent.
fn count_param(name: &str, value: Option<i64>, default: usize) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(v) => usize::try_from(v).map_err(|_| {
            AppError::InvalidConfiguration(format!("{} must not be negative, got {}", name, v))
        }),
    }
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(inner)| inner).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::InvalidConfiguration(rejection.body_text())
        }
    })
}

/// Split a document into chunks and embed each one.
#[utoipa::path(
    post,
    path = "/api/splitandembed",
    request_body = SplitAndEmbedRequest,
    responses(
        (status = 200, description = "Document indexed", body = SplitAndEmbedResponse),
        (status = 400, description = "Invalid chunking parameters", body = ErrorResponse),
        (status = 502, description = "Embedding backend failed", body = ErrorResponse)
    ),
    tag = "rag"
)]
pub async fn split_and_embed(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SplitAndEmbedRequest>, JsonRejection>,
) -> Result<Json<SplitAndEmbedResponse>> {
    let start = Instant::now();
    let payload = body(payload)?;
    let rag = &state.config.rag;

    let chunk_size = count_param("chunkSize", payload.chunk_size, rag.default_chunk_size)?;
    let chunk_overlap = count_param(
        "chunkOverlap",
        payload.chunk_overlap,
        rag.default_chunk_overlap,
    )?;

    let index = state
        .pipeline
        .build_index(&payload.document, chunk_size, chunk_overlap)
        .await?;
    let nodes = nodes_from_index(&index);

    tracing::info!(
        chunk_size,
        chunk_overlap,
        chunks = nodes.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Split and embedded document"
    );

    Ok(Json(SplitAndEmbedResponse {
        payload: SplitAndEmbedPayload {
            nodes_with_embedding: nodes,
        },
    }))
}

/// Answer a question from a previously built index.
#[utoipa::path(
    post,
    path = "/api/retrieveandquery",
    request_body = RetrieveAndQueryRequest,
    responses(
        (status = 200, description = "Answer generated", body = RetrieveAndQueryResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 422, description = "Embedding dimensions do not match", body = ErrorResponse),
        (status = 429, description = "LLM backend rate limited", body = ErrorResponse),
        (status = 502, description = "Embedding or LLM backend failed", body = ErrorResponse),
        (status = 504, description = "LLM backend timed out", body = ErrorResponse)
    ),
    tag = "rag"
)]
pub async fn retrieve_and_query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RetrieveAndQueryRequest>, JsonRejection>,
) -> Result<Json<RetrieveAndQueryResponse>> {
    let start = Instant::now();
    let payload = body(payload)?;

    let top_k = count_param("topK", payload.top_k, state.config.rag.default_top_k)?;
    let index = state
        .pipeline
        .index_from_nodes(&payload.nodes_with_embedding)?;

    let request = QueryRequest {
        query_text: payload.query,
        top_k,
        params: ModelParams::new(payload.temperature, payload.top_p),
    };
    let answer = state.pipeline.answer_query(&index, &request).await?;

    tracing::info!(
        top_k,
        index_len = index.len(),
        grounding = answer.grounding.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Answered query"
    );

    Ok(Json(RetrieveAndQueryResponse {
        payload: RetrieveAndQueryPayload {
            response: answer.text,
            source_nodes: answer
                .grounding
                .into_iter()
                .map(|hit| SourceNode {
                    text: hit.chunk.text,
                    score: hit.score,
                })
                .collect(),
        },
    }))
}
