//! HTTP server implementation using Axum.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use rollcall_channels::Notifier;
use rollcall_engine::EventHandlers;
use rollcall_scheduler::SchedulerEngine;
use tower_http::trace::TraceLayer;

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Change-event reactions (registration welcome, absence alert).
    pub handlers: Arc<EventHandlers>,
    /// Notifier shared with the scheduler; read for delivery counters.
    pub notifier: Arc<Notifier>,
    /// Scheduler job table; read for the status endpoint.
    pub scheduler: Arc<tokio::sync::Mutex<SchedulerEngine>>,
    pub start_time: Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(super::routes::home))
        .route("/new-student-webhook", post(super::routes::change_event))
        .route("/attendance-webhook", post(super::routes::change_event))
        .route("/api/v1/events", post(super::routes::change_event))
        .route("/api/v1/status", get(super::routes::status))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind and serve until the process exits.
pub async fn start(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
