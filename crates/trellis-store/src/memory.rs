//! DashMap-backed table store.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use trellis_core::{AppError, AppResult};
use trellis_hooks::{HookArgs, HookBus, HookPoint};

/// Rows of one table.
#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<u64, Value>,
    last_id: u64,
}

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Table name.
    pub table: String,
    /// Number of rows.
    pub rows: usize,
}

/// In-memory store keyed by table name, then row id.
///
/// Row ids start at 1 per table. Object rows get their `id` field set.
/// Hooks fire only after [`attach_hooks`](Self::attach_hooks); no table lock
/// is held while they run, so callbacks may use the store themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Table name → rows.
    tables: DashMap<String, Table>,
    /// Hook bus, set once after boot.
    hooks: OnceLock<Arc<HookBus>>,
}

impl MemoryStore {
    /// Creates an empty store without hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the hook bus. Only the first call has any effect.
    pub fn attach_hooks(&self, hooks: Arc<HookBus>) -> bool {
        self.hooks.set(hooks).is_ok()
    }

    /// Inserts a row and fires `db_create_after`.
    ///
    /// The row stays stored even when a hook fails; the error is returned.
    pub fn create(&self, table: &str, data: Value) -> AppResult<u64> {
        let (id, row) = {
            let mut entry = self.tables.entry(table.to_string()).or_default();
            entry.last_id += 1;
            let id = entry.last_id;
            let row = with_id(data, id);
            entry.rows.insert(id, row.clone());
            (id, row)
        };

        debug!(table = %table, id = id, "Row created");
        self.fire(HookPoint::DbCreateAfter, table, id, row)?;
        Ok(id)
    }

    /// Fires `db_update_before`, then merges `data` into the row.
    ///
    /// Object fields are merged shallowly; any other value replaces the row.
    pub fn update(&self, table: &str, id: u64, data: Value) -> AppResult<Value> {
        if self.get(table, id).is_none() {
            return Err(missing_row(table, id));
        }
        self.fire(HookPoint::DbUpdateBefore, table, id, data.clone())?;

        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| missing_row(table, id))?;
        let row = entry
            .rows
            .get_mut(&id)
            .ok_or_else(|| missing_row(table, id))?;

        match (row.as_object_mut(), data) {
            (Some(current), Value::Object(changes)) => {
                for (key, value) in changes {
                    current.insert(key, value);
                }
                current.insert("id".to_string(), json!(id));
            }
            (_, replacement) => *row = with_id(replacement, id),
        }

        debug!(table = %table, id = id, "Row updated");
        Ok(row.clone())
    }

    /// Fires `db_delete_before` with the current row, then removes it.
    pub fn delete(&self, table: &str, id: u64) -> AppResult<Value> {
        let current = self.get(table, id).ok_or_else(|| missing_row(table, id))?;
        self.fire(HookPoint::DbDeleteBefore, table, id, current)?;

        let removed = self
            .tables
            .get_mut(table)
            .and_then(|mut entry| entry.rows.remove(&id))
            .ok_or_else(|| missing_row(table, id))?;

        debug!(table = %table, id = id, "Row deleted");
        Ok(removed)
    }

    /// Gets a row.
    pub fn get(&self, table: &str, id: u64) -> Option<Value> {
        self.tables
            .get(table)
            .and_then(|entry| entry.rows.get(&id).cloned())
    }

    /// Lists rows in id order.
    pub fn list(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|entry| entry.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Lists the newest `limit` rows, newest first.
    pub fn latest(&self, table: &str, limit: usize) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|entry| entry.rows.values().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of rows in a table.
    pub fn count(&self, table: &str) -> usize {
        self.tables
            .get(table)
            .map(|entry| entry.rows.len())
            .unwrap_or(0)
    }

    /// Row counts per table, sorted by name.
    pub fn stats(&self) -> Vec<TableStats> {
        let mut stats: Vec<TableStats> = self
            .tables
            .iter()
            .map(|entry| TableStats {
                table: entry.key().clone(),
                rows: entry.value().rows.len(),
            })
            .collect();
        stats.sort_by(|a, b| a.table.cmp(&b.table));
        stats
    }

    fn fire(&self, hook: HookPoint, table: &str, id: u64, data: Value) -> AppResult<()> {
        let Some(hooks) = self.hooks.get() else {
            return Ok(());
        };
        hooks.run_action(hook, HookArgs::new().with(table).with(id).with(data))?;
        Ok(())
    }
}

fn with_id(data: Value, id: u64) -> Value {
    match data {
        Value::Object(mut map) => {
            map.insert("id".to_string(), json!(id));
            Value::Object(map)
        }
        other => other,
    }
}

fn missing_row(table: &str, id: u64) -> AppError {
    AppError::not_found(format!("Row {id} not found in table '{table}'"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use trellis_core::config::{CallbackErrorPolicy, HookConfig};
    use trellis_hooks::ClosureHandler;

    fn recording_bus(config: HookConfig, seen: Arc<Mutex<Vec<String>>>) -> Arc<HookBus> {
        let mut bus = HookBus::new(config);
        for hook in [
            HookPoint::DbCreateAfter,
            HookPoint::DbUpdateBefore,
            HookPoint::DbDeleteBefore,
        ] {
            let seen = seen.clone();
            let name = hook.as_str().to_string();
            bus.register(
                hook,
                ClosureHandler::action("test", "record", move |args| {
                    seen.lock().unwrap().push(format!(
                        "{}:{}:{}",
                        name,
                        args.get_str(0).unwrap_or_default(),
                        args.get_i64(1).unwrap_or_default()
                    ));
                    Ok(())
                })
                .into_handler(),
            );
        }
        Arc::new(bus)
    }

    #[test]
    fn test_crud_without_hooks() {
        let store = MemoryStore::new();
        let id = store.create("posts", json!({"title": "hello"})).unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.get("posts", 1).unwrap()["title"], "hello");

        let updated = store.update("posts", 1, json!({"title": "bye"})).unwrap();
        assert_eq!(updated, json!({"id": 1, "title": "bye"}));

        store.delete("posts", 1).unwrap();
        assert_eq!(store.count("posts"), 0);
        assert!(store.delete("posts", 1).unwrap_err().message.contains("posts"));
    }

    #[test]
    fn test_hooks_fire_with_table_and_id() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = MemoryStore::new();
        assert!(store.attach_hooks(recording_bus(HookConfig::default(), seen.clone())));

        store.create("posts", json!({})).unwrap();
        store.update("posts", 1, json!({"a": 1})).unwrap();
        store.delete("posts", 1).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "db_create_after:posts:1",
                "db_update_before:posts:1",
                "db_delete_before:posts:1",
            ]
        );
    }

    #[test]
    fn test_halting_before_hook_blocks_delete() {
        let mut bus = HookBus::new(HookConfig {
            on_callback_error: CallbackErrorPolicy::Halt,
            ..HookConfig::default()
        });
        bus.register(
            HookPoint::DbDeleteBefore,
            ClosureHandler::action("guard", "protect", |_| Err(AppError::validation("protected")))
                .into_handler(),
        );
        let store = MemoryStore::new();
        store.attach_hooks(Arc::new(bus));

        store.create("posts", json!({})).unwrap();
        assert!(store.delete("posts", 1).is_err());
        assert_eq!(store.count("posts"), 1);
    }

    #[test]
    fn test_callback_can_write_to_store() {
        let store = Arc::new(MemoryStore::new());
        let mut bus = HookBus::default();
        let inner = Arc::downgrade(&store);
        bus.register(
            HookPoint::DbCreateAfter,
            ClosureHandler::action("log", "mirror", move |args| {
                if args.get_str(0) == Some("log") {
                    return Ok(());
                }
                if let Some(store) = inner.upgrade() {
                    store.create("log", json!({"source": args.get_str(0)}))?;
                }
                Ok(())
            })
            .into_handler(),
        );
        store.attach_hooks(Arc::new(bus));

        store.create("posts", json!({})).unwrap();
        assert_eq!(store.count("log"), 1);
        assert_eq!(store.latest("log", 5)[0]["source"], "posts");
    }

    #[test]
    fn test_stats_sorted() {
        let store = MemoryStore::new();
        store.create("b", json!({})).unwrap();
        store.create("a", json!({})).unwrap();
        store.create("a", json!({})).unwrap();
        let tables: Vec<(String, usize)> =
            store.stats().into_iter().map(|s| (s.table, s.rows)).collect();
        assert_eq!(tables, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
    }
}
