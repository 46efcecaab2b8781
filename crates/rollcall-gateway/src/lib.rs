//! # Rollcall Gateway
//! HTTP surface: health check, record-store change-event webhooks, status.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
