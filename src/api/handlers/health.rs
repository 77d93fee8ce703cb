use crate::{api::ApiDoc, types::HealthResponse, AppState};
use axum::{extract::State, Json};
use utoipa::OpenApi;

/// Liveness plus the configured models.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_model: state.pipeline.llm_model().to_string(),
        embedding_model: state.pipeline.embeddings().model_name().to_string(),
    })
}

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
