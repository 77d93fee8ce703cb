use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Routes relative to `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/splitandembed",
            post(crate::api::handlers::rag::split_and_embed),
        )
        .route(
            "/retrieveandquery",
            post(crate::api::handlers::rag::retrieve_and_query),
        )
        .route("/health", get(crate::api::handlers::health::health))
        .route("/openapi.json", get(crate::api::handlers::health::openapi))
}

/// The full application: `/api` routes plus tracing, CORS and the body limit.
pub fn build_app(state: AppState) -> Router {
    let max_body_bytes = state.config.server.max_body_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
