//! Plugin registry: plugin trait, descriptors, and load records.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use trellis_core::AppResult;

use crate::exports::PluginExport;

/// Metadata about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin identifier, also its folder name.
    pub id: String,
    /// Human-readable plugin name.
    pub name: String,
    /// Plugin version string.
    pub version: String,
    /// Plugin description.
    pub description: String,
    /// Author or maintainer.
    pub author: String,
}

/// Trait that all plugins must implement.
///
/// `register` is the plugin's entry point. It is called exactly once, at
/// boot, and returns everything the plugin contributes.
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Returns plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Builds the plugin's routes, hooks, and commands.
    fn register(&self) -> AppResult<PluginExport>;
}

/// A plugin waiting to be loaded.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// Plugin name.
    pub name: String,
    /// Entry point.
    pub entry: Arc<dyn Plugin>,
    /// Whether the entry point already ran. Flips once.
    loaded: bool,
}

impl PluginDescriptor {
    /// Creates a descriptor named after the plugin's id.
    pub fn new(entry: Arc<dyn Plugin>) -> Self {
        Self {
            name: entry.info().id,
            entry,
            loaded: false,
        }
    }

    /// Creates a descriptor under an explicit name.
    pub fn named(name: impl Into<String>, entry: Arc<dyn Plugin>) -> Self {
        Self {
            name: name.into(),
            entry,
            loaded: false,
        }
    }

    /// Whether the entry point already ran.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }
}

/// Load status of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PluginStatus {
    /// Entry point ran and its export was applied.
    Loaded,
    /// Entry point failed; nothing from the plugin was registered.
    Failed(String),
}

/// Record of a plugin the loader processed.
#[derive(Debug, Clone, Serialize)]
pub struct PluginRecord {
    /// Descriptor name.
    pub name: String,
    /// Plugin metadata.
    pub info: PluginInfo,
    /// Outcome.
    #[serde(flatten)]
    pub status: PluginStatus,
    /// Routes added.
    pub routes: usize,
    /// Hook callbacks added.
    pub hooks: usize,
    /// Commands added.
    pub commands: usize,
}

/// Registry of processed plugins in load order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    records: Vec<PluginRecord>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a processed plugin.
    pub fn record(&mut self, record: PluginRecord) {
        self.records.push(record);
    }

    /// Whether a plugin with this name was already processed, loaded or failed.
    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    /// Gets a record by name.
    pub fn get(&self, name: &str) -> Option<&PluginRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Lists records in load order.
    pub fn list(&self) -> &[PluginRecord] {
        &self.records
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.records.len()
    }
}
