//! Trellis server: a CMS host assembled from plugins.
//!
//! Main entry point: loads configuration, initializes logging, boots the
//! framework, and serves HTTP.

use tracing_subscriber::{EnvFilter, fmt};

use trellis_core::AppResult;
use trellis_core::config::AppConfig;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
///
/// `TRELLIS_CONFIG` names an explicit file; otherwise `config/default.toml`
/// and `config/{TRELLIS_ENV}.toml` are merged. `TRELLIS__*` variables
/// override both.
fn load_configuration() -> AppResult<AppConfig> {
    match std::env::var("TRELLIS_CONFIG") {
        Ok(path) => AppConfig::load_from(&path),
        Err(_) => {
            let env = std::env::var("TRELLIS_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().pretty().with_env_filter(filter).with_target(true).init();
    }
}

/// Main server run function
async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        plugins = %config.plugins.directory,
        "Starting Trellis"
    );

    trellis_api::run_server(config).await?;

    tracing::info!("Trellis server shut down gracefully");
    Ok(())
}
