//! Plugin loader: runs each entry point once and applies its export.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{error, info, warn};

use trellis_core::{AppError, AppResult};
use trellis_hooks::HookBus;
use trellis_router::RouteTable;

use crate::api::commands::CommandTable;
use crate::exports::PluginExport;
use crate::registry::{PluginDescriptor, PluginRecord, PluginRegistry, PluginStatus};

/// Registries a plugin export is applied to.
#[derive(Debug)]
pub struct LoadTarget<'a> {
    /// Route table.
    pub routes: &'a mut RouteTable,
    /// Hook bus.
    pub hooks: &'a mut HookBus,
    /// CLI command table.
    pub commands: &'a mut CommandTable,
}

/// A plugin that failed to load.
#[derive(Debug, Clone)]
pub struct PluginFailure {
    /// Plugin name.
    pub plugin: String,
    /// Cause, normally of kind `PluginLoad`.
    pub error: AppError,
}

/// Outcome of one loader pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Plugins loaded by this pass, in load order.
    pub loaded: Vec<String>,
    /// Plugins skipped because they were already loaded or disabled.
    pub skipped: Vec<String>,
    /// Plugins whose entry point or export failed.
    pub failed: Vec<PluginFailure>,
}

impl LoadReport {
    /// Whether every plugin loaded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the first failure as an error, if any.
    pub fn ensure_clean(&self) -> AppResult<()> {
        match self.failed.first() {
            Some(failure) => Err(failure.error.clone()),
            None => Ok(()),
        }
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: LoadReport) {
        self.loaded.extend(other.loaded);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

/// Executes plugin entry points at boot.
#[derive(Debug, Default)]
pub struct PluginLoader {
    registry: PluginRegistry,
}

impl PluginLoader {
    /// Creates a loader with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every descriptor in slice order.
    ///
    /// A descriptor already marked loaded, or whose name the registry has
    /// already processed, is skipped without calling its entry point. A
    /// failed plugin counts as processed and is never retried. Failures are
    /// recorded and never stop later plugins.
    pub fn load_all(
        &mut self,
        descriptors: &mut [PluginDescriptor],
        target: &mut LoadTarget<'_>,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        for descriptor in descriptors.iter_mut() {
            if descriptor.is_loaded() || self.registry.contains(&descriptor.name) {
                info!(plugin_id = %descriptor.name, "Plugin already processed, skipping");
                report.skipped.push(descriptor.name.clone());
                continue;
            }

            let name = descriptor.name.clone();
            let info = descriptor.entry.info();
            descriptor.mark_loaded();

            match self.load_one(descriptor, target) {
                Ok((routes, hooks, commands)) => {
                    info!(
                        plugin_id = %name,
                        version = %info.version,
                        routes = routes,
                        hooks = hooks,
                        commands = commands,
                        "Plugin loaded"
                    );
                    self.registry.record(PluginRecord {
                        name: name.clone(),
                        info,
                        status: PluginStatus::Loaded,
                        routes,
                        hooks,
                        commands,
                    });
                    report.loaded.push(name);
                }
                Err(e) => {
                    error!(plugin_id = %name, error = %e, "Plugin failed to load");
                    self.registry.record(PluginRecord {
                        name: name.clone(),
                        info,
                        status: PluginStatus::Failed(e.message.clone()),
                        routes: 0,
                        hooks: 0,
                        commands: 0,
                    });
                    report.failed.push(PluginFailure {
                        plugin: name,
                        error: e,
                    });
                }
            }
        }

        report
    }

    /// Runs one entry point and applies its export atomically.
    fn load_one(
        &self,
        descriptor: &PluginDescriptor,
        target: &mut LoadTarget<'_>,
    ) -> AppResult<(usize, usize, usize)> {
        let name = descriptor.name.as_str();
        let entry = descriptor.entry.clone();

        let export = match catch_unwind(AssertUnwindSafe(|| entry.register())) {
            Ok(Ok(export)) => export,
            Ok(Err(e)) => return Err(AppError::plugin_load(name, e)),
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                return Err(AppError::plugin_load(
                    name,
                    AppError::internal(format!("entry point panicked: {reason}")),
                ));
            }
        };

        if export.is_empty() {
            warn!(plugin_id = %name, "Plugin export is empty");
        }

        apply(name, export, target).map_err(|e| AppError::plugin_load(name, e))
    }

    /// Processed plugins.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Consumes the loader, keeping its registry.
    pub fn into_registry(self) -> PluginRegistry {
        self.registry
    }
}

/// Applies an export. Every check that can fail runs before anything is
/// registered.
fn apply(
    plugin: &str,
    export: PluginExport,
    target: &mut LoadTarget<'_>,
) -> AppResult<(usize, usize, usize)> {
    let mut names = HashSet::new();
    for command in &export.commands {
        if target.commands.contains(&command.name) || !names.insert(command.name.as_str()) {
            return Err(AppError::conflict(format!(
                "Command '{}' is already registered",
                command.name
            )));
        }
    }

    // Compiles every pattern first; on error nothing is added.
    let routes = target.routes.add_all(plugin, &export.routes)?.len();

    let commands = export.commands.len();
    for command in export.commands {
        target.commands.register(plugin, command)?;
    }

    let hooks = export.hooks.len();
    for spec in export.hooks {
        match spec.priority {
            Some(priority) => {
                target
                    .hooks
                    .register_with_priority(&spec.hook, spec.handler, priority);
            }
            None => {
                target.hooks.register(&spec.hook, spec.handler);
            }
        }
    }

    Ok((routes, hooks, commands))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
