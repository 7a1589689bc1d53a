//! Closure-based hook handlers for quick callback creation.

use std::sync::Arc;

use serde_json::Value;

use trellis_core::AppResult;

use crate::hooks::definitions::HookArgs;
use crate::hooks::registry::HookHandler;

type FilterFn = dyn Fn(Value, &HookArgs) -> AppResult<Value> + Send + Sync;

/// A closure-based hook handler.
///
/// Build action callbacks with [`ClosureHandler::action`] and filter
/// callbacks with [`ClosureHandler::filter`].
pub struct ClosureHandler {
    /// Plugin ID.
    plugin_id: String,
    /// Callback name.
    name: String,
    /// Priority, if the handler carries its own.
    priority_val: Option<i32>,
    /// Handler function.
    handler: Arc<FilterFn>,
}

impl std::fmt::Debug for ClosureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHandler")
            .field("plugin_id", &self.plugin_id)
            .field("name", &self.name)
            .field("priority_val", &self.priority_val)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureHandler {
    /// Creates an action handler. The closure's success value is ignored.
    pub fn action<F>(plugin_id: &str, name: &str, handler: F) -> Self
    where
        F: Fn(&HookArgs) -> AppResult<()> + Send + Sync + 'static,
    {
        Self::filter(plugin_id, name, move |value, args| {
            handler(args)?;
            Ok(value)
        })
    }

    /// Creates a filter handler. The closure must return the full accumulator.
    pub fn filter<F>(plugin_id: &str, name: &str, handler: F) -> Self
    where
        F: Fn(Value, &HookArgs) -> AppResult<Value> + Send + Sync + 'static,
    {
        Self {
            plugin_id: plugin_id.to_string(),
            name: name.to_string(),
            priority_val: None,
            handler: Arc::new(handler),
        }
    }

    /// Sets the handler's own priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority_val = Some(priority);
        self
    }

    /// Wraps the handler into an `Arc<dyn HookHandler>`.
    pub fn into_handler(self) -> Arc<dyn HookHandler> {
        Arc::new(self)
    }
}

impl HookHandler for ClosureHandler {
    fn handle(&self, value: Value, args: &HookArgs) -> AppResult<Value> {
        (self.handler)(value, args)
    }

    fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Option<i32> {
        self.priority_val
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_passes_value_through() {
        let handler = ClosureHandler::action("p", "a", |_| Ok(()));
        let out = handler.handle(json!(1), &HookArgs::new()).unwrap();
        assert_eq!(out, json!(1));
    }

    #[test]
    fn test_filter_sees_args() {
        let handler = ClosureHandler::filter("p", "f", |value, args| {
            let n = value.as_i64().unwrap_or(0) + args.get_i64(0).unwrap_or(0);
            Ok(json!(n))
        });
        let out = handler.handle(json!(2), &HookArgs::new().with(3)).unwrap();
        assert_eq!(out, json!(5));
        assert_eq!(handler.priority(), None);
        assert_eq!(
            ClosureHandler::filter("p", "f", |v, _| Ok(v))
                .with_priority(7)
                .priority(),
            Some(7)
        );
    }
}
