//! Directory discovery of plugins.
//!
//! Each immediate sub-directory of the plugins directory is one plugin. The
//! folder name selects a compiled-in factory from a [`PluginCatalog`]; an
//! optional `plugin.toml` can rename the plugin or disable it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use trellis_core::{AppError, AppResult};

use crate::loader::{LoadReport, PluginFailure};
use crate::registry::{Plugin, PluginDescriptor};

/// Manifest file name looked up inside each plugin folder.
pub const MANIFEST_FILE: &str = "plugin.toml";

type Factory = Arc<dyn Fn() -> Arc<dyn Plugin> + Send + Sync>;

/// Compiled-in plugin factories keyed by entry point name.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: BTreeMap<String, Factory>,
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory under a name.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
        self
    }

    /// Builds a fresh plugin instance.
    pub fn create(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Whether the catalog knows a name.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Catalog names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Descriptors for explicitly named plugins, in the order given.
    ///
    /// Unknown names are returned as failures.
    pub fn descriptors_for(&self, names: &[String]) -> Discovery {
        let mut discovery = Discovery::default();
        for name in names {
            match self.create(name) {
                Some(entry) => discovery
                    .descriptors
                    .push(PluginDescriptor::named(name.clone(), entry)),
                None => discovery.report.failed.push(missing_entry_point(name)),
            }
        }
        discovery
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("plugins", &self.names())
            .finish()
    }
}

/// Optional per-folder manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    /// Entry point name; defaults to the folder name.
    #[serde(default)]
    pub name: Option<String>,
    /// Set to `false` to skip the folder.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: None,
            enabled: true,
        }
    }
}

impl PluginManifest {
    /// Reads `plugin.toml` from a folder, if present.
    pub fn read(folder: &Path) -> AppResult<Self> {
        let path = folder.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Discovered descriptors plus folders that were skipped or unusable.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Descriptors in load order.
    pub descriptors: Vec<PluginDescriptor>,
    /// Skipped and failed folders; `loaded` is always empty.
    pub report: LoadReport,
}

/// Enumerates plugin folders under `dir`, sorted by folder name.
///
/// A missing directory yields an empty discovery.
pub fn discover(dir: &Path, catalog: &PluginCatalog) -> AppResult<Discovery> {
    let mut discovery = Discovery::default();

    if !dir.is_dir() {
        warn!(directory = %dir.display(), "Plugin directory not found");
        return Ok(discovery);
    }

    let mut folders = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            folders.push(entry.path());
        }
    }
    folders.sort();

    for folder in folders {
        let Some(folder_name) = folder.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let manifest = match PluginManifest::read(&folder) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(plugin_id = %folder_name, error = %e, "Invalid plugin manifest");
                discovery.report.failed.push(PluginFailure {
                    plugin: folder_name.to_string(),
                    error: AppError::plugin_load(folder_name, e),
                });
                continue;
            }
        };

        if !manifest.enabled {
            info!(plugin_id = %folder_name, "Plugin disabled by manifest");
            discovery.report.skipped.push(folder_name.to_string());
            continue;
        }

        let name = manifest.name.unwrap_or_else(|| folder_name.to_string());
        match catalog.create(&name) {
            Some(entry) => {
                debug!(plugin_id = %name, folder = %folder.display(), "Plugin discovered");
                discovery
                    .descriptors
                    .push(PluginDescriptor::named(name, entry));
            }
            None => {
                warn!(plugin_id = %name, folder = %folder.display(), "Plugin has no entry point");
                discovery.report.failed.push(missing_entry_point(&name));
            }
        }
    }

    info!(
        directory = %dir.display(),
        found = discovery.descriptors.len(),
        "Plugin discovery complete"
    );

    Ok(discovery)
}

fn missing_entry_point(name: &str) -> PluginFailure {
    PluginFailure {
        plugin: name.to_string(),
        error: AppError::plugin_load(
            name,
            AppError::not_found(format!("No entry point named '{name}'")),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exports::PluginExport;
    use crate::registry::PluginInfo;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Plugin for Named {
        fn info(&self) -> PluginInfo {
            crate::plugin_info!(
                id: self.0,
                name: self.0,
                version: "0.1.0",
                description: "",
                author: ""
            )
        }

        fn register(&self) -> AppResult<PluginExport> {
            Ok(PluginExport::new())
        }
    }

    fn catalog() -> PluginCatalog {
        let mut catalog = PluginCatalog::new();
        catalog
            .register("alpha", || Arc::new(Named("alpha")))
            .register("beta", || Arc::new(Named("beta")))
            .register("gamma", || Arc::new(Named("gamma")));
        catalog
    }

    fn names(discovery: &Discovery) -> Vec<String> {
        discovery
            .descriptors
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    #[test]
    fn test_discovery_order_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["gamma", "alpha", "beta"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("README.md"), "not a plugin").unwrap();

        let discovery = discover(dir.path(), &catalog()).unwrap();
        assert_eq!(names(&discovery), vec!["alpha", "beta", "gamma"]);
        assert!(discovery.report.is_clean());
    }

    #[test]
    fn test_manifest_disables_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::write(dir.path().join("alpha").join(MANIFEST_FILE), "enabled = false\n").unwrap();
        std::fs::create_dir(dir.path().join("zz-custom")).unwrap();
        std::fs::write(
            dir.path().join("zz-custom").join(MANIFEST_FILE),
            "name = \"beta\"\n",
        )
        .unwrap();

        let discovery = discover(dir.path(), &catalog()).unwrap();
        assert_eq!(names(&discovery), vec!["beta"]);
        assert_eq!(discovery.report.skipped, vec!["alpha"]);
    }

    #[test]
    fn test_folder_without_entry_point_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::create_dir(dir.path().join("orphan")).unwrap();

        let discovery = discover(dir.path(), &catalog()).unwrap();
        assert_eq!(names(&discovery), vec!["alpha"]);
        assert_eq!(discovery.report.failed.len(), 1);
        assert_eq!(discovery.report.failed[0].plugin, "orphan");
    }

    #[test]
    fn test_invalid_manifest_fails_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::write(dir.path().join("alpha").join(MANIFEST_FILE), "enabled = \"nope").unwrap();

        let discovery = discover(dir.path(), &catalog()).unwrap();
        assert!(discovery.descriptors.is_empty());
        assert_eq!(discovery.report.failed[0].plugin, "alpha");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let discovery = discover(Path::new("/definitely/not/here"), &catalog()).unwrap();
        assert!(discovery.descriptors.is_empty());
    }

    #[test]
    fn test_descriptors_for_explicit_names() {
        let discovery = catalog().descriptors_for(&["gamma".to_string(), "nope".to_string()]);
        assert_eq!(names(&discovery), vec!["gamma"]);
        assert_eq!(discovery.report.failed[0].plugin, "nope");
    }
}
