//! Axum router for the Trellis HTTP adapter.
//!
//! Routing is owned by the framework's route table, so Axum only carries a
//! fallback that forwards every method and path to the dispatcher.

use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with middleware.
///
/// The dispatcher logs one event per request; `TraceLayer` only adds
/// debug-level spans.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;
    let max_body = server.max_body_bytes;
    let timeout = Duration::from_secs(server.request_timeout_seconds);

    Router::new()
        .fallback(handlers::dispatch::dispatch)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
