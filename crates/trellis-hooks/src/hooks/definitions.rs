//! Hook point definitions and positional hook arguments.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a hook is meant to be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookMode {
    /// Callbacks run for side effects; return values are discarded.
    Action,
    /// Callbacks thread an accumulator value.
    Filter,
    /// The hook is fired in both modes by different call sites.
    Either,
}

/// Enumeration of the hook points the core fires.
///
/// Plugins may define their own hooks; those travel as [`HookPoint::Custom`].
/// Names are part of the wire contract and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum HookPoint {
    // ── Boot ──
    /// Fired once after every plugin has loaded.
    AppBoot,
    /// Fired with the controllers map after plugins registered theirs.
    FrameworkLoadControllersAfter,
    /// Fired with a router handle so plugins can inspect the route table.
    FrameworkRegisterRoutes,

    // ── Router ──
    /// Fired at the start of every request. No arguments.
    RouterDispatchBefore,
    /// Fired with `(route, params)` after a successful match.
    RouterMatched,
    /// Fired with `(route, params)` after the handler ran.
    RouterDispatchAfter,
    /// Fired with `(path)` when no route matched.
    Router404,

    // ── Session / response ──
    /// Filter over the session payload (user, menu tree).
    AuthSessionData,
    /// Filter over the outgoing JSON response `{status, body}`.
    ResponseJsonBefore,

    // ── Persistence ──
    /// Fired with `(table, id, data)` after a row was created.
    DbCreateAfter,
    /// Fired with `(table, id, data)` before a row is updated.
    DbUpdateBefore,
    /// Fired with `(table, id, data)` before a row is deleted.
    DbDeleteBefore,

    // ── CLI ──
    /// Filter resolving `(group, parts)` to a command handler.
    CliResolveCommand,

    /// A plugin-defined hook.
    Custom(String),
}

impl HookPoint {
    /// Returns the wire name of this hook point.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AppBoot => "app_boot",
            Self::FrameworkLoadControllersAfter => "framework_load_controllers_after",
            Self::FrameworkRegisterRoutes => "framework_register_routes",
            Self::RouterDispatchBefore => "router_dispatch_before",
            Self::RouterMatched => "router_matched",
            Self::RouterDispatchAfter => "router_dispatch_after",
            Self::Router404 => "router_404",
            Self::AuthSessionData => "auth_session_data",
            Self::ResponseJsonBefore => "response_json_before",
            Self::DbCreateAfter => "db_create_after",
            Self::DbUpdateBefore => "db_update_before",
            Self::DbDeleteBefore => "db_delete_before",
            Self::CliResolveCommand => "cli_resolve_command",
            Self::Custom(name) => name,
        }
    }

    /// Returns the invocation mode the core uses for this hook.
    pub fn mode(&self) -> HookMode {
        match self {
            Self::AuthSessionData | Self::ResponseJsonBefore | Self::CliResolveCommand => {
                HookMode::Filter
            }
            Self::FrameworkLoadControllersAfter | Self::Custom(_) => HookMode::Either,
            _ => HookMode::Action,
        }
    }

    /// All hook points fired by the core, in lifecycle order.
    pub fn builtin() -> &'static [HookPoint] {
        &[
            Self::AppBoot,
            Self::FrameworkLoadControllersAfter,
            Self::FrameworkRegisterRoutes,
            Self::RouterDispatchBefore,
            Self::RouterMatched,
            Self::RouterDispatchAfter,
            Self::Router404,
            Self::AuthSessionData,
            Self::ResponseJsonBefore,
            Self::DbCreateAfter,
            Self::DbUpdateBefore,
            Self::DbDeleteBefore,
            Self::CliResolveCommand,
        ]
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for HookPoint {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for HookPoint {
    fn from(name: &str) -> Self {
        Self::builtin()
            .iter()
            .find(|hook| hook.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }
}

impl From<String> for HookPoint {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<HookPoint> for String {
    fn from(hook: HookPoint) -> Self {
        hook.as_str().to_string()
    }
}

impl FromStr for HookPoint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Positional arguments passed to every callback of one hook invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookArgs {
    values: Vec<Value>,
}

impl HookArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Gets an argument by position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Gets a string argument.
    pub fn get_str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Gets an i64 argument.
    pub fn get_i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Value::as_i64)
    }

    /// Gets a string-array argument (e.g. captured route params).
    pub fn get_strings(&self, index: usize) -> Option<Vec<String>> {
        self.get(index).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrows the raw values.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for HookArgs {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for hook in HookPoint::builtin() {
            assert_eq!(&HookPoint::from(hook.as_str()), hook);
        }
        assert_eq!(
            HookPoint::from("chat_message_sent"),
            HookPoint::Custom("chat_message_sent".to_string())
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(HookPoint::Router404.as_str(), "router_404");
        assert_eq!(HookPoint::DbCreateAfter.to_string(), "db_create_after");
        assert_eq!(
            serde_json::to_value(HookPoint::CliResolveCommand).unwrap(),
            json!("cli_resolve_command")
        );
    }

    #[test]
    fn test_modes() {
        assert_eq!(HookPoint::AuthSessionData.mode(), HookMode::Filter);
        assert_eq!(HookPoint::Router404.mode(), HookMode::Action);
        assert_eq!(
            HookPoint::FrameworkLoadControllersAfter.mode(),
            HookMode::Either
        );
    }

    #[test]
    fn test_args_accessors() {
        let args = HookArgs::new()
            .with("cms_posts")
            .with(7)
            .with(json!(["42", "x"]));
        assert_eq!(args.len(), 3);
        assert_eq!(args.get_str(0), Some("cms_posts"));
        assert_eq!(args.get_i64(1), Some(7));
        assert_eq!(
            args.get_strings(2),
            Some(vec!["42".to_string(), "x".to_string()])
        );
        assert!(args.get(3).is_none());
    }
}
