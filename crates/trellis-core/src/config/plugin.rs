//! Plugin system configuration.

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory whose sub-folders name the plugins to load.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// Whether to discover plugins from `directory` on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Explicit plugin names to load, in order. Takes precedence over discovery.
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Abort boot when any plugin fails to load.
    #[serde(default)]
    pub strict: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            auto_load: default_true(),
            enabled: Vec::new(),
            strict: false,
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_true() -> bool {
    true
}
