//! # trellis-api
//!
//! Boots the Trellis framework and serves it over HTTP with Axum.
//!
//! [`Framework`] owns the route table, hook bus, command table, and store
//! once plugins have loaded. Every inbound request reaches a single fallback
//! handler that hands it to the dispatcher.

pub mod app;
pub mod bundled;
pub mod error;
pub mod framework;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use framework::{Framework, FrameworkBuilder};
pub use state::AppState;
