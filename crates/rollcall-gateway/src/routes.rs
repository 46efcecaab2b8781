//! Route handlers.

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use rollcall_core::types::ChangeEvent;

use crate::server::AppState;

/// How many recent deliveries the status endpoint returns.
const RECENT_DELIVERIES: usize = 20;

/// Keep-alive route for the hosting platform.
pub async fn home() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Attendance Notifier is running.")
}

/// Record-store change webhook. Always answers 200: the emitting system has
/// no use for a failure code, so problems are only logged.
pub async fn change_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<serde_json::Value> {
    let event = serde_json::from_slice::<serde_json::Value>(&body)
        .map_err(|e| rollcall_core::RollcallError::MalformedEvent(e.to_string()))
        .and_then(ChangeEvent::from_json);

    match event {
        Ok(event) => {
            tracing::info!("Received {:?} change event", event.table());
            let outcome = state.handlers.handle(&event).await;
            tracing::info!("Change event handled: {:?}", outcome);
        }
        Err(e) => tracing::warn!("Ignoring change event: {e}"),
    }

    Json(serde_json::json!({"status": "received"}))
}

/// Service status: uptime, delivery counters, recent deliveries, job table.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let jobs = {
        let engine = state.scheduler.lock().await;
        serde_json::to_value(engine.jobs()).unwrap_or_default()
    };
    let history = state.notifier.history();
    let recent = &history[history.len().saturating_sub(RECENT_DELIVERIES)..];

    Json(serde_json::json!({
        "status": "ok",
        "service": "rollcall",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "gateway": state.notifier.gateway_name(),
        "deliveries": state.notifier.stats(),
        "recent": recent,
        "jobs": jobs,
    }))
}
