//! Application state shared with the dispatch fallback.

use std::sync::Arc;

use trellis_core::config::AppConfig;

use crate::framework::Framework;

/// Shared state passed to Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Booted framework.
    pub framework: Arc<Framework>,
}

impl AppState {
    /// Wraps a booted framework.
    pub fn new(framework: Framework) -> Self {
        Self {
            config: Arc::clone(framework.config()),
            framework: Arc::new(framework),
        }
    }
}
