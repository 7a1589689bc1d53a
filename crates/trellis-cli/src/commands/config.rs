//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use trellis_core::AppResult;
use trellis_core::config::AppConfig;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration
    Show,
    /// Summarize the effective settings
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => output::print_document(config, format),
        ConfigCommand::Validate => {
            output::print_success("Configuration is valid");
            output::print_kv("Server", &config.server.bind_address());
            output::print_kv("Plugin directory", &config.plugins.directory);
            output::print_kv("Enabled plugins", &config.plugins.enabled.join(", "));
            output::print_kv("Callback errors", &format!("{:?}", config.hooks.on_callback_error));
            output::print_kv("Re-entrancy", &format!("{:?}", config.hooks.reentrancy));
            output::print_kv("Log level", &config.logging.level);
        }
    }
    Ok(())
}
