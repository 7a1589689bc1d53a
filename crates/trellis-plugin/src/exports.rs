//! Export bundle a plugin's entry point returns.

use std::sync::Arc;

use trellis_hooks::HookHandler;
use trellis_router::{RouteHandler, RouteSpec};

use crate::api::commands::{CommandHandler, CommandSpec};

/// A hook callback a plugin asks to register.
#[derive(Debug, Clone)]
pub struct HookSpec {
    /// Hook name.
    pub hook: String,
    /// Callback.
    pub handler: Arc<dyn HookHandler>,
    /// Explicit priority; `None` uses the handler's or the bus default.
    pub priority: Option<i32>,
}

/// Everything a plugin contributes, applied by the loader in order.
#[derive(Debug, Clone, Default)]
pub struct PluginExport {
    /// Routes, in registration order.
    pub routes: Vec<RouteSpec>,
    /// Hook callbacks, in registration order.
    pub hooks: Vec<HookSpec>,
    /// CLI commands.
    pub commands: Vec<CommandSpec>,
}

impl PluginExport {
    /// Creates an empty export.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder.
    pub fn builder() -> PluginExportBuilder {
        PluginExportBuilder::default()
    }

    /// Whether the export contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.hooks.is_empty() && self.commands.is_empty()
    }
}

/// Builder for constructing plugin exports incrementally.
#[derive(Debug, Default)]
pub struct PluginExportBuilder {
    export: PluginExport,
}

impl PluginExportBuilder {
    /// Adds a route.
    pub fn route(
        mut self,
        method: &str,
        pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Self {
        self.export
            .routes
            .push(RouteSpec::new(method, pattern, handler));
        self
    }

    /// Adds a `GET` route.
    pub fn get(self, pattern: &str, handler: Arc<dyn RouteHandler>) -> Self {
        self.route("GET", pattern, handler)
    }

    /// Adds a `POST` route.
    pub fn post(self, pattern: &str, handler: Arc<dyn RouteHandler>) -> Self {
        self.route("POST", pattern, handler)
    }

    /// Registers a hook callback.
    pub fn on(mut self, hook: impl AsRef<str>, handler: Arc<dyn HookHandler>) -> Self {
        self.export.hooks.push(HookSpec {
            hook: hook.as_ref().to_string(),
            handler,
            priority: None,
        });
        self
    }

    /// Registers a hook callback with an explicit priority.
    pub fn on_with_priority(
        mut self,
        hook: impl AsRef<str>,
        handler: Arc<dyn HookHandler>,
        priority: i32,
    ) -> Self {
        self.export.hooks.push(HookSpec {
            hook: hook.as_ref().to_string(),
            handler,
            priority: Some(priority),
        });
        self
    }

    /// Adds a CLI command.
    pub fn command(mut self, name: &str, handler: Arc<dyn CommandHandler>) -> Self {
        self.export.commands.push(CommandSpec::new(name, handler));
        self
    }

    /// Builds the final export.
    pub fn build(self) -> PluginExport {
        self.export
    }
}
