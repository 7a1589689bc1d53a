//! Framework bootstrap: loads plugins into fresh registries, fires the boot
//! hooks, then freezes everything for request handling.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{error, info, warn};

use trellis_core::config::AppConfig;
use trellis_core::{AppError, AppResult};
use trellis_hooks::{HookArgs, HookBus, HookPoint};
use trellis_plugin::api::commands::{CommandTable, ResolvedCommand};
use trellis_plugin::api::menu::session_seed;
use trellis_plugin::{
    LoadReport, LoadTarget, Plugin, PluginCatalog, PluginDescriptor, PluginLoader, PluginRegistry,
    discover,
};
use trellis_router::{DispatchOutcome, Dispatcher, Request, Response, RouteHandler, RouteTable};
use trellis_store::MemoryStore;

use crate::bundled;
use crate::handlers::health;

/// Collects plugins and core routes before the framework is frozen.
pub struct FrameworkBuilder {
    config: AppConfig,
    routes: RouteTable,
    hooks: HookBus,
    commands: CommandTable,
    loader: PluginLoader,
    store: Arc<MemoryStore>,
    catalog: PluginCatalog,
    report: LoadReport,
}

impl FrameworkBuilder {
    /// Creates a builder with the core routes and the bundled catalog.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let store = Arc::new(MemoryStore::new());
        let mut routes = RouteTable::new();
        routes.add("GET", "/health", health::handler())?;

        Ok(Self {
            hooks: HookBus::new(config.hooks.clone()),
            catalog: bundled::catalog(Arc::clone(&store)),
            config,
            routes,
            commands: CommandTable::new(),
            loader: PluginLoader::new(),
            store,
            report: LoadReport::default(),
        })
    }

    /// Replaces the plugin catalog.
    pub fn with_catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The catalog used for discovery.
    pub fn catalog_mut(&mut self) -> &mut PluginCatalog {
        &mut self.catalog
    }

    /// The store shared with bundled plugins.
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    /// Registers a core route.
    pub fn route(
        mut self,
        method: &str,
        pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> AppResult<Self> {
        self.routes.add(method, pattern, handler)?;
        Ok(self)
    }

    /// Loads plugins the way the configuration asks.
    ///
    /// A non-empty `plugins.enabled` names plugins explicitly, in order.
    /// Otherwise, with `plugins.auto_load`, the plugins directory is
    /// scanned.
    pub fn load_configured(self) -> AppResult<Self> {
        let plugins = &self.config.plugins;
        let discovery = if !plugins.enabled.is_empty() {
            self.catalog.descriptors_for(&plugins.enabled)
        } else if plugins.auto_load {
            discover(Path::new(&plugins.directory), &self.catalog)?
        } else {
            info!("Plugin loading disabled");
            return Ok(self);
        };

        self.absorb(discovery.report)?.load(discovery.descriptors)
    }

    /// Loads plugins from a directory regardless of configuration.
    pub fn load_directory(self, dir: &Path) -> AppResult<Self> {
        let discovery = discover(dir, &self.catalog)?;
        self.absorb(discovery.report)?.load(discovery.descriptors)
    }

    /// Loads one plugin instance.
    pub fn plugin(self, entry: Arc<dyn Plugin>) -> AppResult<Self> {
        self.load(vec![PluginDescriptor::new(entry)])
    }

    /// Loads descriptors in order.
    pub fn load(mut self, mut descriptors: Vec<PluginDescriptor>) -> AppResult<Self> {
        let mut target = LoadTarget {
            routes: &mut self.routes,
            hooks: &mut self.hooks,
            commands: &mut self.commands,
        };
        let report = self.loader.load_all(&mut descriptors, &mut target);
        self.absorb(report)
    }

    /// Keeps a report. Under `plugins.strict` any failure aborts boot.
    fn absorb(mut self, report: LoadReport) -> AppResult<Self> {
        if self.config.plugins.strict {
            report.ensure_clean()?;
        }
        for failure in &report.failed {
            warn!(plugin_id = %failure.plugin, error = %failure.error, "Plugin skipped after failure");
        }
        self.report.merge(report);
        Ok(self)
    }

    /// Fires the boot hooks and freezes the registries.
    pub fn build(self) -> AppResult<Framework> {
        let Self {
            config,
            routes,
            hooks,
            commands,
            loader,
            store,
            report,
            ..
        } = self;

        hooks.run_action(
            HookPoint::FrameworkRegisterRoutes,
            HookArgs::new().with(json!({ "routes": routes.len() })),
        )?;

        let controllers = hooks.run_filter(
            HookPoint::FrameworkLoadControllersAfter,
            json!({}),
            HookArgs::new(),
        )?;

        let hooks = Arc::new(hooks);
        store.attach_hooks(Arc::clone(&hooks));

        let boot = hooks.run_action(HookPoint::AppBoot, HookArgs::new())?;

        info!(
            routes = routes.len(),
            hooks = hooks.registry().len(),
            commands = commands.len(),
            plugins_loaded = report.loaded.len(),
            plugins_failed = report.failed.len(),
            boot_callbacks = boot.invoked,
            "Framework booted"
        );

        Ok(Framework {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(Arc::new(routes), hooks),
            commands,
            plugins: loader.into_registry(),
            store,
            controllers,
            report,
        })
    }
}

/// A booted framework. Read-only; share it behind an `Arc`.
pub struct Framework {
    config: Arc<AppConfig>,
    dispatcher: Dispatcher,
    commands: CommandTable,
    plugins: PluginRegistry,
    store: Arc<MemoryStore>,
    controllers: Value,
    report: LoadReport,
}

impl Framework {
    /// Starts a builder.
    pub fn builder(config: AppConfig) -> AppResult<FrameworkBuilder> {
        FrameworkBuilder::new(config)
    }

    /// Boots from configuration: loads configured plugins and builds.
    pub fn boot(config: AppConfig) -> AppResult<Self> {
        FrameworkBuilder::new(config)?.load_configured()?.build()
    }

    /// Dispatches a request and returns the raw outcome.
    pub fn dispatch_outcome(&self, request: &Request) -> DispatchOutcome {
        self.dispatcher.dispatch(request)
    }

    /// Dispatches a request; unmatched requests get the JSON 404 body.
    pub fn dispatch(&self, request: &Request) -> Response {
        self.dispatcher.dispatch(request).into_response()
    }

    /// Assembles session data for a user through `auth_session_data`.
    pub fn session_data(&self, user: Value) -> AppResult<Value> {
        self.hooks().run_filter(
            HookPoint::AuthSessionData,
            session_seed(user.clone()),
            HookArgs::new().with(user),
        )
    }

    /// Resolves a CLI command through `cli_resolve_command`.
    pub fn resolve_command(
        &self,
        group: &str,
        parts: &[String],
    ) -> AppResult<Option<ResolvedCommand>> {
        self.commands.resolve(self.hooks(), group, parts)
    }

    /// Resolves and runs a CLI command.
    pub fn run_command(&self, group: &str, parts: &[String]) -> AppResult<Value> {
        let Some(command) = self.resolve_command(group, parts)? else {
            error!(group = %group, parts = ?parts, "No plugin resolved the command");
            return Err(AppError::not_found(format!(
                "No command for '{} {}'",
                group,
                parts.join(" ")
            )));
        };
        info!(command = %command.name, "Running command");
        self.commands.run(&command)
    }

    /// The dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The route table.
    pub fn routes(&self) -> &RouteTable {
        self.dispatcher.routes()
    }

    /// The hook bus.
    pub fn hooks(&self) -> &HookBus {
        self.dispatcher.hooks()
    }

    /// Plugin commands.
    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Processed plugins.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// The data store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Controllers collected through `framework_load_controllers_after`.
    pub fn controllers(&self) -> &Value {
        &self.controllers
    }

    /// Combined plugin load report.
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Active configuration.
    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }
}

impl std::fmt::Debug for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framework")
            .field("routes", &self.routes().len())
            .field("hooks", &self.hooks().registry().len())
            .field("commands", &self.commands.len())
            .field("plugins", &self.plugins.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(enabled: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.plugins.enabled = enabled.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_boot_without_plugins_serves_health() {
        let mut config = AppConfig::default();
        config.plugins.auto_load = false;
        let framework = Framework::boot(config).unwrap();

        let resp = framework.dispatch(&Request::new("GET", "/health"));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["status"], "ok");
        assert!(framework.plugins().list().is_empty());
    }

    #[test]
    fn test_bundled_plugins_boot_from_enabled_list() {
        let framework = Framework::boot(config_with(&["audit", "pageviews"])).unwrap();

        assert!(framework.load_report().is_clean());
        assert_eq!(framework.load_report().loaded, vec!["audit", "pageviews"]);
        assert!(framework.routes().resolve("GET", "/@/audit/logs").is_some());
        assert!(framework.routes().resolve("GET", "/@/pageviews/stats").is_some());
        assert_eq!(framework.controllers()["audit"], "Audit log browser");
    }

    #[test]
    fn test_unknown_plugin_fails_only_under_strict() {
        let framework = Framework::boot(config_with(&["ghost", "audit"])).unwrap();
        assert_eq!(framework.load_report().failed[0].plugin, "ghost");
        assert_eq!(framework.load_report().loaded, vec!["audit"]);

        let mut strict = config_with(&["ghost", "audit"]);
        strict.plugins.strict = true;
        assert!(Framework::boot(strict).is_err());
    }

    #[test]
    fn test_run_command_unresolved() {
        let framework = Framework::boot(config_with(&["audit"])).unwrap();
        let err = framework
            .run_command("chat", &["purge".to_string()])
            .unwrap_err();
        assert!(err.message.contains("chat purge"));
    }
}
