//! CLI command definitions and dispatch.

pub mod config;
pub mod hooks;
pub mod plugins;
pub mod routes;
pub mod run;
pub mod serve;

use clap::{Parser, Subcommand};

use trellis_api::Framework;
use trellis_core::AppResult;
use trellis_core::config::AppConfig;

use crate::output::OutputFormat;

/// Trellis: plugin-assembled CMS host
#[derive(Debug, Parser)]
#[command(name = "trellis", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file; overrides the environment lookup
    #[arg(short, long)]
    pub config: Option<String>,

    /// Configuration environment (`config/{env}.toml`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the Trellis server
    Serve(serve::ServeArgs),
    /// List registered routes in match order
    Routes(routes::RoutesArgs),
    /// List hook registrations in execution order
    Hooks(hooks::HooksArgs),
    /// List plugins and their load status
    Plugins,
    /// Run a plugin-provided command
    Run(run::RunArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        let config = self.load_config()?;
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Routes(args) => routes::execute(args, &boot(config)?, self.format),
            Commands::Hooks(args) => hooks::execute(args, &boot(config)?, self.format),
            Commands::Plugins => plugins::execute(&boot(config)?, self.format),
            Commands::Run(args) => run::execute(args, &boot(config)?),
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }

    /// Loads configuration from `--config`, or from `config/` for `--env`.
    pub fn load_config(&self) -> AppResult<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(&self.env),
        }
    }
}

/// Boots the framework the same way the server does.
fn boot(config: AppConfig) -> AppResult<Framework> {
    Framework::boot(config)
}
