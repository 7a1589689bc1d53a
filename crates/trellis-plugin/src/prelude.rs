//! Prelude for convenient imports.

pub use serde_json::{Value, json};

pub use trellis_core::{AppError, AppResult, ErrorKind};
pub use trellis_hooks::{ClosureHandler, HookArgs, HookBus, HookHandler, HookPoint};
pub use trellis_router::{FnHandler, RequestContext, Response, RouteHandler};

pub use crate::api::commands::{CommandHandler, FnCommand};
pub use crate::api::menu::{MenuItem, add_to_group};
pub use crate::exports::{HookSpec, PluginExport};
pub use crate::registry::{Plugin, PluginInfo};

pub use crate::plugin_info;
