//! CLI commands contributed by plugins.
//!
//! The CLI resolves `(group, parts)` through the `cli_resolve_command`
//! filter. A plugin claims a command by returning
//! `{"handler": "<command name>"}`; the CLI then looks the name up here.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

use trellis_core::{AppError, AppResult};
use trellis_hooks::{HookArgs, HookBus, HookPoint};

/// A plugin-supplied CLI command.
pub trait CommandHandler: Send + Sync + std::fmt::Debug {
    /// Runs the command with the arguments following the command name.
    fn run(&self, args: &[String]) -> AppResult<Value>;

    /// One-line help text.
    fn about(&self) -> &str {
        ""
    }
}

/// A command a plugin asks to register.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Unique command name, conventionally `<plugin>:<verb>`.
    pub name: String,
    /// Handler.
    pub handler: Arc<dyn CommandHandler>,
}

impl CommandSpec {
    /// Creates a command spec.
    pub fn new(name: &str, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.to_string(),
            handler,
        }
    }
}

/// Serializable view of a registered command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandSummary {
    /// Command name.
    pub name: String,
    /// Owning plugin.
    pub plugin: String,
    /// Help text.
    pub about: String,
}

/// Resolved command ready to run.
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    /// Command name.
    pub name: String,
    /// Arguments remaining after resolution.
    pub args: Vec<String>,
    /// The filter's full resolution value.
    pub resolution: Value,
}

/// Commands registered by plugins, keyed by name.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: BTreeMap<String, (String, Arc<dyn CommandHandler>)>,
}

impl CommandTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command. A name already taken stays with its first owner.
    pub fn register(&mut self, plugin: &str, spec: CommandSpec) -> AppResult<()> {
        if let Some((owner, _)) = self.commands.get(&spec.name) {
            return Err(AppError::conflict(format!(
                "Command '{}' already registered by plugin '{}'",
                spec.name, owner
            )));
        }
        self.commands
            .insert(spec.name, (plugin.to_string(), spec.handler));
        Ok(())
    }

    /// Gets a command handler.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.commands.get(name).map(|(_, handler)| handler)
    }

    /// Whether a command is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Lists commands sorted by name.
    pub fn summaries(&self) -> Vec<CommandSummary> {
        self.commands
            .iter()
            .map(|(name, (plugin, handler))| CommandSummary {
                name: name.clone(),
                plugin: plugin.clone(),
                about: handler.about().to_string(),
            })
            .collect()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Resolves `(group, parts)` through the `cli_resolve_command` filter.
    ///
    /// The filter starts from `null`. Returns `None` when no plugin claimed
    /// the command or the claimed name is not registered.
    pub fn resolve(
        &self,
        hooks: &HookBus,
        group: &str,
        parts: &[String],
    ) -> AppResult<Option<ResolvedCommand>> {
        let resolution = hooks.run_filter(
            HookPoint::CliResolveCommand,
            Value::Null,
            HookArgs::new().with(group).with(json!(parts)),
        )?;

        let Some(name) = resolution.get("handler").and_then(Value::as_str) else {
            return Ok(None);
        };

        if !self.contains(name) {
            warn!(command = %name, group = %group, "Resolved command is not registered");
            return Ok(None);
        }

        let consumed = resolution
            .get("consumed")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(1)
            .min(parts.len());

        Ok(Some(ResolvedCommand {
            name: name.to_string(),
            args: parts[consumed..].to_vec(),
            resolution,
        }))
    }

    /// Runs a resolved command.
    pub fn run(&self, command: &ResolvedCommand) -> AppResult<Value> {
        let handler = self
            .get(&command.name)
            .ok_or_else(|| AppError::not_found(format!("Command '{}' not found", command.name)))?;
        handler.run(&command.args)
    }
}

/// A closure-based command handler.
pub struct FnCommand {
    about: String,
    handler: Arc<dyn Fn(&[String]) -> AppResult<Value> + Send + Sync>,
}

impl FnCommand {
    /// Wraps a closure into an `Arc<dyn CommandHandler>`.
    pub fn arc<F>(about: &str, handler: F) -> Arc<dyn CommandHandler>
    where
        F: Fn(&[String]) -> AppResult<Value> + Send + Sync + 'static,
    {
        Arc::new(Self {
            about: about.to_string(),
            handler: Arc::new(handler),
        })
    }
}

impl std::fmt::Debug for FnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommand")
            .field("about", &self.about)
            .finish_non_exhaustive()
    }
}

impl CommandHandler for FnCommand {
    fn run(&self, args: &[String]) -> AppResult<Value> {
        (self.handler)(args)
    }

    fn about(&self) -> &str {
        &self.about
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_hooks::ClosureHandler;

    fn table() -> CommandTable {
        let mut table = CommandTable::new();
        table
            .register(
                "audit",
                CommandSpec::new(
                    "audit:list",
                    FnCommand::arc("List audit rows", |args| Ok(json!({ "args": args }))),
                ),
            )
            .unwrap();
        table
    }

    fn resolver_bus() -> HookBus {
        let mut bus = HookBus::default();
        bus.register(
            HookPoint::CliResolveCommand,
            ClosureHandler::filter("audit", "resolve", |current, args| {
                let is_audit = args.get_str(0) == Some("audit");
                let verb = args.get_strings(1).and_then(|p| p.first().cloned());
                if is_audit && verb.as_deref() == Some("list") {
                    Ok(json!({ "handler": "audit:list" }))
                } else {
                    Ok(current)
                }
            })
            .into_handler(),
        );
        bus
    }

    fn parts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_and_run() {
        let table = table();
        let bus = resolver_bus();

        let resolved = table
            .resolve(&bus, "audit", &parts(&["list", "--limit", "5"]))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.name, "audit:list");
        assert_eq!(resolved.args, parts(&["--limit", "5"]));

        let out = table.run(&resolved).unwrap();
        assert_eq!(out, json!({"args": ["--limit", "5"]}));
    }

    #[test]
    fn test_unclaimed_command_resolves_to_none() {
        let table = table();
        let bus = resolver_bus();
        assert!(table
            .resolve(&bus, "chat", &parts(&["purge"]))
            .unwrap()
            .is_none());
        assert!(table
            .resolve(&HookBus::default(), "audit", &parts(&["list"]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_command_name_conflicts() {
        let mut table = table();
        let err = table
            .register(
                "other",
                CommandSpec::new("audit:list", FnCommand::arc("", |_| Ok(Value::Null))),
            )
            .unwrap_err();
        assert!(err.message.contains("audit"));
        assert_eq!(table.summaries()[0].plugin, "audit");
    }
}
