//! Health check route, registered by the framework as a core route.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;

use trellis_router::{FnHandler, Response, RouteHandler};

/// GET /health
pub fn handler() -> Arc<dyn RouteHandler> {
    let started = Instant::now();
    FnHandler::arc("health", move |_| {
        Ok(Response::ok(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": started.elapsed().as_secs(),
        })))
    })
}
