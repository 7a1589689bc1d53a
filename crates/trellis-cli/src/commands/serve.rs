//! Start the Trellis server.

use clap::Args;

use trellis_core::AppResult;
use trellis_core::config::AppConfig;

use crate::output;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Abort boot when any plugin fails to load
    #[arg(long)]
    pub strict: bool,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> AppResult<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if args.strict {
        config.plugins.strict = true;
    }

    println!("Starting Trellis server...");
    output::print_kv("Host", &config.server.host);
    output::print_kv("Port", &config.server.port.to_string());
    output::print_kv("Plugins", &config.plugins.directory);

    trellis_api::run_server(config).await
}
