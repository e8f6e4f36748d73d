use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use futures::stream::Stream;
use hail_core::engine::final_event;
use hail_core::{Content, TaskEvent};
use tokio::sync::mpsc;

use super::state::AppState;
use crate::types::{AgentCard, HealthResponse, ProcessRequest};

/// Wire shape of a completed task: plain text is wrapped, structured content is sent as-is.
fn content_body(content: &Content) -> serde_json::Value {
    match content {
        Content::Text(text) => serde_json::json!({ "content": text }),
        other => serde_json::to_value(other).unwrap_or_default(),
    }
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

pub async fn process_handler(
    State(state): State<AppState>,
    Json(req): Json<ProcessRequest>,
) -> Response {
    let session_id = req.session_id_or_new();
    tracing::info!(%session_id, "processing query");

    match final_event(state.engine.run(&req.query, &session_id)).await {
        Some(TaskEvent::Complete { content }) => Json(content_body(&content)).into_response(),
        Some(TaskEvent::Error { kind, message }) => {
            tracing::error!(%session_id, %kind, "task failed: {message}");
            internal_error(&message)
        }
        Some(TaskEvent::Progress { .. }) | None => {
            tracing::error!(%session_id, "task ended without a terminal event");
            internal_error("task ended without a result")
        }
    }
}

fn sse_event(event: &TaskEvent) -> Event {
    let (name, data) = match event {
        TaskEvent::Progress { message } => ("progress", serde_json::json!({ "message": message })),
        TaskEvent::Complete { content } => ("complete", content_body(content)),
        TaskEvent::Error { kind, message } => (
            "error",
            serde_json::json!({ "kind": kind, "message": message }),
        ),
    };
    Event::default()
        .event(name)
        .data(serde_json::to_string(&data).unwrap_or_default())
}

pub async fn stream_handler(
    State(state): State<AppState>,
    Json(req): Json<ProcessRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Event>(32);
    let session_id = req.session_id_or_new();

    tokio::spawn(async move {
        let mut events = state.engine.run(&req.query, &session_id);
        while let Some(event) = events.next().await {
            if tx.send(sse_event(&event)).await.is_err() {
                tracing::debug!(%session_id, "stream client disconnected");
                return;
            }
        }
    });

    let stream = tokio_stream::wrappers::ReceiverStream::new(rx).map(Ok);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health.as_ref().clone())
}

pub async fn agent_card_handler(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}
