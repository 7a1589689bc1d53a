//! Plugins compiled into the server binary.

use std::sync::Arc;

use plugin_audit::AuditPlugin;
use plugin_pageviews::PageViewsPlugin;
use trellis_plugin::PluginCatalog;
use trellis_store::MemoryStore;

/// Catalog of bundled plugins. Plugins that persist data share `store`.
pub fn catalog(store: Arc<MemoryStore>) -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    catalog
        .register(plugin_audit::PLUGIN_ID, move || {
            Arc::new(AuditPlugin::new(Arc::clone(&store)))
        })
        .register(plugin_pageviews::PLUGIN_ID, || Arc::new(PageViewsPlugin::new()));
    catalog
}
