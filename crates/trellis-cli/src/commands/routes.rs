//! Route table listing.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use trellis_api::Framework;
use trellis_core::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for the routes command
#[derive(Debug, Args)]
pub struct RoutesArgs {
    /// Only routes registered by this plugin
    #[arg(short, long)]
    pub plugin: Option<String>,

    /// Show which route a request would reach, e.g. `GET /@/audit/logs`
    #[arg(long, num_args = 2, value_names = ["METHOD", "PATH"])]
    pub resolve: Option<Vec<String>>,
}

/// One route row.
#[derive(Debug, Serialize, Tabled)]
struct RouteRow {
    #[tabled(rename = "#")]
    id: u64,
    method: String,
    pattern: String,
    plugin: String,
}

/// Execute the routes command
pub fn execute(args: &RoutesArgs, framework: &Framework, format: OutputFormat) -> AppResult<()> {
    if let Some([method, path]) = args.resolve.as_deref() {
        match framework.routes().resolve(&method.to_uppercase(), path) {
            Some(found) => {
                output::print_kv("Route", &found.route.id.to_string());
                output::print_kv("Pattern", found.route.pattern());
                output::print_kv("Plugin", &found.route.owner);
                output::print_kv("Params", &found.params.join(", "));
            }
            None => output::print_warning(&format!("No route for {method} {path}")),
        }
        return Ok(());
    }

    let rows: Vec<RouteRow> = framework
        .routes()
        .summaries()
        .into_iter()
        .filter(|r| args.plugin.as_ref().is_none_or(|p| &r.plugin == p))
        .map(|r| RouteRow {
            id: r.id.as_u64(),
            method: r.method,
            pattern: r.pattern,
            plugin: r.plugin,
        })
        .collect();

    output::print_rows(&rows, format, "No routes registered.");
    Ok(())
}
