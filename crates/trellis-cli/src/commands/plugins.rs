//! Plugin listing.

use serde::Serialize;
use tabled::Tabled;

use trellis_api::Framework;
use trellis_core::AppResult;
use trellis_plugin::PluginStatus;

use crate::output::{self, OutputFormat};

/// One plugin row.
#[derive(Debug, Serialize, Tabled)]
struct PluginRow {
    name: String,
    version: String,
    status: String,
    routes: usize,
    hooks: usize,
    commands: usize,
}

/// Execute the plugins command
pub fn execute(framework: &Framework, format: OutputFormat) -> AppResult<()> {
    let rows: Vec<PluginRow> = framework
        .plugins()
        .list()
        .iter()
        .map(|record| PluginRow {
            name: record.name.clone(),
            version: record.info.version.clone(),
            status: match &record.status {
                PluginStatus::Loaded => "loaded".to_string(),
                PluginStatus::Failed(_) => "failed".to_string(),
            },
            routes: record.routes,
            hooks: record.hooks,
            commands: record.commands,
        })
        .collect();

    output::print_rows(&rows, format, "No plugins loaded.");

    // Discovery failures never reach the registry.
    for failure in &framework.load_report().failed {
        output::print_error(&format!("{}: {}", failure.plugin, failure.error.message));
    }
    for skipped in &framework.load_report().skipped {
        output::print_warning(&format!("{skipped}: skipped"));
    }
    Ok(())
}
