//! Audit plugin implementation: registers with the Trellis plugin system.

use std::sync::Arc;

use trellis_plugin::prelude::*;
use trellis_store::MemoryStore;

use crate::hooks::{AuditCommandResolver, AuditMenu, AuditRecorder};
use crate::routes;

/// Plugin id and folder name.
pub const PLUGIN_ID: &str = "audit";

/// Table holding audit rows.
pub const AUDIT_TABLE: &str = "cms_audit_logs";

/// Audit log plugin.
#[derive(Debug)]
pub struct AuditPlugin {
    /// Store observed and written to.
    store: Arc<MemoryStore>,
}

impl AuditPlugin {
    /// Creates the plugin over a store.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

impl Plugin for AuditPlugin {
    fn info(&self) -> PluginInfo {
        plugin_info!(
            id: PLUGIN_ID,
            name: "Audit Log",
            description: "Records every data change in cms_audit_logs"
        )
    }

    fn register(&self) -> AppResult<PluginExport> {
        let store = &self.store;
        let list_store = Arc::clone(store);

        Ok(PluginExport::builder()
            .get("/@/audit/logs", routes::list_logs(Arc::clone(store)))
            .get(r"/@/audit/logs/(\d+)", routes::get_log(Arc::clone(store)))
            .on(
                HookPoint::DbCreateAfter,
                Arc::new(AuditRecorder::new(Arc::clone(store), "create")),
            )
            .on(
                HookPoint::DbUpdateBefore,
                Arc::new(AuditRecorder::new(Arc::clone(store), "update")),
            )
            .on(
                HookPoint::DbDeleteBefore,
                Arc::new(AuditRecorder::new(Arc::clone(store), "delete")),
            )
            .on(HookPoint::AuthSessionData, Arc::new(AuditMenu))
            .on(HookPoint::CliResolveCommand, Arc::new(AuditCommandResolver))
            .on(
                HookPoint::FrameworkLoadControllersAfter,
                ClosureHandler::filter(PLUGIN_ID, "audit_controller", |mut controllers, _| {
                    if let Some(map) = controllers.as_object_mut() {
                        map.insert("audit".to_string(), json!("Audit log browser"));
                    }
                    Ok(controllers)
                })
                .into_handler(),
            )
            .command(
                "audit:list",
                FnCommand::arc("List the newest audit entries", move |args| {
                    let limit = match args.first() {
                        Some(raw) => raw.parse::<usize>().map_err(|_| {
                            AppError::validation(format!("Invalid limit '{raw}'"))
                        })?,
                        None => routes::DEFAULT_LIMIT,
                    };
                    Ok(json!(list_store.latest(AUDIT_TABLE, limit)))
                }),
            )
            .build())
    }
}
