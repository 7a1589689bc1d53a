//! Trellis CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use commands::Commands;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_keeps_trailing_words() {
        let cli = Cli::parse_from(["trellis", "run", "audit", "list", "--limit", "5"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.group, "audit");
                assert_eq!(args.parts, vec!["list", "--limit", "5"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_routes_resolve_takes_method_and_path() {
        let cli = Cli::parse_from(["trellis", "-f", "json", "routes", "--resolve", "GET", "/health"]);
        match cli.command {
            Commands::Routes(args) => {
                assert_eq!(args.resolve.unwrap(), vec!["GET", "/health"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
