//! Hook implementations for the audit plugin.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, info};

use trellis_core::{AppResult, ErrorKind};
use trellis_hooks::{HookArgs, HookHandler};
use trellis_plugin::api::menu::{MenuItem, add_to_group};
use trellis_store::MemoryStore;

use crate::plugin::{AUDIT_TABLE, PLUGIN_ID};

/// Menu group shared by tool plugins.
pub const TOOLS_GROUP: &str = "grp-tools";

/// Records one kind of data change.
#[derive(Debug)]
pub struct AuditRecorder {
    /// Store the log is written to.
    store: Arc<MemoryStore>,
    /// `create`, `update`, or `delete`.
    action: &'static str,
    /// Callback name.
    name: String,
}

impl AuditRecorder {
    /// Creates a recorder for one action.
    pub fn new(store: Arc<MemoryStore>, action: &'static str) -> Self {
        Self {
            store,
            action,
            name: format!("audit_on_{action}"),
        }
    }
}

impl HookHandler for AuditRecorder {
    fn handle(&self, _value: Value, args: &HookArgs) -> AppResult<Value> {
        let table = args.get_str(0).unwrap_or_default();

        // Writing the log fires this hook again.
        if table == AUDIT_TABLE {
            return Ok(Value::Null);
        }

        let row = json!({
            "action": self.action,
            "table": table,
            "row_id": args.get(1).cloned().unwrap_or(Value::Null),
            "data": args.get(2).cloned().unwrap_or(Value::Null),
            "created_at": Utc::now().to_rfc3339(),
        });

        match self.store.create(AUDIT_TABLE, row) {
            Ok(id) => {
                debug!(table = %table, action = self.action, audit_id = id, "Audit row written");
            }
            // Under the forbid policy the nested fire is rejected after the
            // row is stored.
            Err(e) if e.is(ErrorKind::HookReentrancy) => {
                debug!(table = %table, action = self.action, "Audit row written, nested hook rejected");
            }
            Err(e) => return Err(e),
        }

        Ok(Value::Null)
    }

    fn plugin_id(&self) -> &str {
        PLUGIN_ID
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Adds the audit log link under the tools menu group.
#[derive(Debug, Default)]
pub struct AuditMenu;

impl HookHandler for AuditMenu {
    fn handle(&self, value: Value, _args: &HookArgs) -> AppResult<Value> {
        add_to_group(
            value,
            &MenuItem::group(TOOLS_GROUP, "Tools").with_icon("wrench"),
            &MenuItem::link("audit-logs", "Audit Log", "/@/audit/logs").with_icon("history"),
        )
    }

    fn plugin_id(&self) -> &str {
        PLUGIN_ID
    }

    fn name(&self) -> &str {
        "audit_menu"
    }
}

/// Claims `audit list` for the `audit:list` command.
#[derive(Debug, Default)]
pub struct AuditCommandResolver;

impl HookHandler for AuditCommandResolver {
    fn handle(&self, value: Value, args: &HookArgs) -> AppResult<Value> {
        if args.get_str(0) != Some("audit") {
            return Ok(value);
        }

        let verb = args
            .get_strings(1)
            .and_then(|parts| parts.first().cloned());
        match verb.as_deref() {
            Some("list") | None => {
                info!(command = "audit:list", "CLI command resolved");
                Ok(json!({ "handler": "audit:list", "consumed": if verb.is_some() { 1 } else { 0 } }))
            }
            Some(_) => Ok(value),
        }
    }

    fn plugin_id(&self) -> &str {
        PLUGIN_ID
    }

    fn name(&self) -> &str {
        "audit_resolve_command"
    }
}
