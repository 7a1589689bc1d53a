//! Audit log plugin for Trellis.
//!
//! Records every create, update, and delete the store reports into the
//! `cms_audit_logs` table, and exposes the log over `/@/audit/logs` and the
//! `audit list` CLI command. Writes to the audit table itself are never
//! audited.

pub mod hooks;
pub mod plugin;
pub mod routes;

pub use plugin::{AUDIT_TABLE, AuditPlugin, PLUGIN_ID};
