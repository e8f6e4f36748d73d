use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{agent_card_handler, health_handler, process_handler, stream_handler};
use super::state::AppState;

pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Routes for one agent. Only the task endpoints carry the body limit.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    let tasks = Router::new()
        .route("/process", post(process_handler))
        .route("/process/stream", post(stream_handler))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/health", get(health_handler))
        .route("/.well-known/agent.json", get(agent_card_handler))
        .merge(tasks)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
