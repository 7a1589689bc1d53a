//! JSON routes for reading the audit log.

use std::sync::Arc;

use serde_json::json;

use trellis_core::AppError;
use trellis_router::{FnHandler, RouteHandler, Response};
use trellis_store::MemoryStore;

use crate::plugin::AUDIT_TABLE;

/// Default page size for `GET /@/audit/logs`.
pub const DEFAULT_LIMIT: usize = 50;

/// `GET /@/audit/logs?limit=N`: newest entries first.
pub fn list_logs(store: Arc<MemoryStore>) -> Arc<dyn RouteHandler> {
    FnHandler::arc("audit_list_logs", move |ctx| {
        let limit = match ctx.query("limit") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::validation(format!("Invalid limit '{raw}'")))?,
            None => DEFAULT_LIMIT,
        };
        let entries = store.latest(AUDIT_TABLE, limit);
        Ok(Response::ok(json!({
            "total": store.count(AUDIT_TABLE),
            "entries": entries,
        })))
    })
}

/// `GET /@/audit/logs/(\d+)`: one entry.
pub fn get_log(store: Arc<MemoryStore>) -> Arc<dyn RouteHandler> {
    FnHandler::arc("audit_get_log", move |ctx| {
        let id: u64 = ctx
            .param_as(0)
            .ok_or_else(|| AppError::validation("Missing audit entry id"))?;
        store
            .get(AUDIT_TABLE, id)
            .map(Response::ok)
            .ok_or_else(|| AppError::not_found(format!("Audit entry {id} not found")))
    })
}
