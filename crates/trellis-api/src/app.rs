//! Application builder: wires the booted framework into an Axum app and
//! serves it.

use tracing::{error, info};

use trellis_core::config::AppConfig;
use trellis_core::{AppError, AppResult};

use crate::framework::Framework;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application.
pub fn build_app(state: AppState) -> axum::Router {
    build_router(state)
}

/// Boots the framework and runs the HTTP server until a shutdown signal.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    info!("Starting Trellis server...");

    let addr = config.server.bind_address();
    let framework = Framework::boot(config)?;

    let report = framework.load_report();
    info!(
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        routes = framework.routes().len(),
        "Plugins loaded"
    );

    let app = build_app(AppState::new(framework));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    info!(address = %addr, "Trellis server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    info!("Trellis server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
