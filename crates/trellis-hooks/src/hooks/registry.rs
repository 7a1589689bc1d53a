//! Hook registry: plugins register callbacks by hook name with priority ordering.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use trellis_core::AppResult;
use trellis_core::types::{RegistrationId, Sequence};

use super::definitions::HookArgs;

/// Trait for hook callback implementations.
///
/// Action hooks receive `Value::Null` and their return value is discarded.
/// Filter hooks receive the current accumulator and must return the next
/// one in full.
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// Handles a hook invocation.
    fn handle(&self, value: Value, args: &HookArgs) -> AppResult<Value>;

    /// Returns the plugin ID owning this handler.
    fn plugin_id(&self) -> &str;

    /// Returns a name identifying this callback in logs and errors.
    fn name(&self) -> &str;

    /// Returns the priority (lower = runs first). `None` uses the bus default.
    fn priority(&self) -> Option<i32> {
        None
    }
}

/// Entry in the hook registry.
#[derive(Debug, Clone)]
pub struct HookEntry {
    /// Registration index, the tiebreaker among equal priorities.
    pub id: RegistrationId,
    /// Priority (lower = earlier execution).
    pub priority: i32,
    /// The handler.
    pub handler: Arc<dyn HookHandler>,
}

/// Serializable view of one registration.
#[derive(Debug, Clone, Serialize)]
pub struct HookSummary {
    /// Hook name.
    pub hook: String,
    /// Registration index.
    pub id: RegistrationId,
    /// Priority.
    pub priority: i32,
    /// Owning plugin.
    pub plugin_id: String,
    /// Callback name.
    pub callback: String,
}

/// Registry of hook callbacks organized by hook name.
///
/// Entries are kept sorted by `(priority, registration index)` at insert
/// time, so readers always see execution order.
#[derive(Debug)]
pub struct HookRegistry {
    /// Hook name → sorted list of entries.
    handlers: HashMap<String, Vec<HookEntry>>,
    /// Registration counter shared by all hook names.
    sequence: Sequence,
    /// Priority used when neither caller nor handler supplies one.
    default_priority: i32,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new(default_priority: i32) -> Self {
        Self {
            handlers: HashMap::new(),
            sequence: Sequence::new(),
            default_priority,
        }
    }

    /// Registers a handler under a hook name.
    ///
    /// `priority` overrides the handler's own priority; when both are absent
    /// the registry default applies.
    pub fn register(
        &mut self,
        hook: &str,
        handler: Arc<dyn HookHandler>,
        priority: Option<i32>,
    ) -> RegistrationId {
        let priority = priority
            .or_else(|| handler.priority())
            .unwrap_or(self.default_priority);
        let id = RegistrationId(self.sequence.next());
        let plugin_id = handler.plugin_id().to_string();
        let callback = handler.name().to_string();

        let entries = self.handlers.entry(hook.to_string()).or_default();
        entries.push(HookEntry {
            id,
            priority,
            handler,
        });

        // Stable; the id makes the tiebreak explicit.
        entries.sort_by_key(|e| (e.priority, e.id));

        info!(
            hook = %hook,
            plugin_id = %plugin_id,
            callback = %callback,
            priority = priority,
            registration = %id,
            "Hook handler registered"
        );

        id
    }

    /// Returns the entries for a hook name in execution order.
    pub fn entries(&self, hook: &str) -> &[HookEntry] {
        self.handlers.get(hook).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns whether any handlers are registered for a hook name.
    pub fn has_handlers(&self, hook: &str) -> bool {
        !self.entries(hook).is_empty()
    }

    /// Returns the number of handlers registered for a hook name.
    pub fn handler_count(&self, hook: &str) -> usize {
        self.entries(hook).len()
    }

    /// Returns all hook names with at least one handler, sorted.
    pub fn registered_hooks(&self) -> Vec<String> {
        let mut hooks: Vec<String> = self.handlers.keys().cloned().collect();
        hooks.sort();
        hooks
    }

    /// Lists every registration, grouped by hook in execution order.
    pub fn summaries(&self) -> Vec<HookSummary> {
        self.registered_hooks()
            .into_iter()
            .flat_map(|hook| {
                self.entries(&hook)
                    .iter()
                    .map(|e| HookSummary {
                        hook: hook.clone(),
                        id: e.id,
                        priority: e.priority,
                        plugin_id: e.handler.plugin_id().to_string(),
                        callback: e.handler.name().to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Total number of registrations across all hooks.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The default priority.
    pub fn default_priority(&self) -> i32 {
        self.default_priority
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new(100)
    }
}
