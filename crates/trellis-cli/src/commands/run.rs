//! Run a plugin-provided command.
//!
//! `trellis run audit list 20` fires `cli_resolve_command` with
//! `("audit", ["list", "20"])`; the plugin that claims it names the command
//! to run.

use clap::Args;

use trellis_api::Framework;
use trellis_core::AppResult;

use crate::output;

/// Arguments for the run command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Command group, usually the plugin name
    pub group: String,

    /// Remaining command words and arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub parts: Vec<String>,
}

/// Execute the run command
pub fn execute(args: &RunArgs, framework: &Framework) -> AppResult<()> {
    let result = framework.run_command(&args.group, &args.parts)?;
    output::print_json(&result);
    Ok(())
}
