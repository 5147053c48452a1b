use axum::{Json, extract::State, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::{Value, json};

use crate::shell::state::AppState;

fn status_of<E: std::fmt::Display>(name: &str, result: Result<(), E>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(err) => {
            tracing::error!(dependency = name, error = %err, "health check failed");
            "error"
        }
    }
}

/// 200 when every dependency answers, 503 otherwise. The outbox block is informational.
pub async fn handle(State(state): State<AppState>) -> Response {
    let (store, sink, counts) = tokio::join!(
        state.document_store.ping(),
        state.event_sink.ping(),
        state.outbox.counts(),
    );

    let document_store = status_of("document_store", store);
    let event_sink = status_of("event_sink", sink);
    let outbox = counts
        .ok()
        .and_then(|counts| serde_json::to_value(counts).ok())
        .unwrap_or(Value::Null);

    let healthy = document_store == "ok" && event_sink == "ok";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "document_store": document_store,
            "event_sink": event_sink,
            "outbox": outbox,
        })),
    )
        .into_response()
}
