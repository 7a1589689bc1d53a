//! Hook registration listing.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use trellis_api::Framework;
use trellis_core::AppResult;
use trellis_hooks::HookPoint;

use crate::output::{self, OutputFormat};

/// Arguments for the hooks command
#[derive(Debug, Args)]
pub struct HooksArgs {
    /// Only this hook
    #[arg(long)]
    pub hook: Option<String>,

    /// List the built-in hook points and their modes instead
    #[arg(long)]
    pub builtin: bool,
}

/// One registration row.
#[derive(Debug, Serialize, Tabled)]
struct HookRow {
    hook: String,
    priority: i32,
    plugin: String,
    callback: String,
}

/// One built-in hook point.
#[derive(Debug, Serialize, Tabled)]
struct HookPointRow {
    hook: String,
    mode: String,
    callbacks: usize,
}

/// Execute the hooks command
pub fn execute(args: &HooksArgs, framework: &Framework, format: OutputFormat) -> AppResult<()> {
    let registry = framework.hooks().registry();

    if args.builtin {
        let rows: Vec<HookPointRow> = HookPoint::builtin()
            .iter()
            .map(|point| HookPointRow {
                hook: point.as_str().to_string(),
                mode: format!("{:?}", point.mode()).to_lowercase(),
                callbacks: registry.handler_count(point.as_str()),
            })
            .collect();
        output::print_rows(&rows, format, "No built-in hook points.");
        return Ok(());
    }

    let rows: Vec<HookRow> = registry
        .summaries()
        .into_iter()
        .filter(|s| args.hook.as_ref().is_none_or(|h| &s.hook == h))
        .map(|s| HookRow {
            hook: s.hook,
            priority: s.priority,
            plugin: s.plugin_id,
            callback: s.callback,
        })
        .collect();

    output::print_rows(&rows, format, "No hook callbacks registered.");
    Ok(())
}
