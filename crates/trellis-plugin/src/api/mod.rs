//! Plugin API: helpers plugin code uses to build its contributions.

pub mod commands;
pub mod menu;

pub use commands::{CommandHandler, CommandSpec, CommandSummary, CommandTable, FnCommand, ResolvedCommand};
pub use menu::{MenuItem, add_to_group, append_child, ensure_group, session_seed};
