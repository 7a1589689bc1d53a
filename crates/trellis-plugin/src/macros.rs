//! Convenience macros for plugin development.

/// Builds a [`PluginInfo`](crate::registry::PluginInfo).
///
/// # Example
/// ```rust,ignore
/// let info = plugin_info!(
///     id: "audit",
///     name: "Audit Log",
///     version: "1.0.0",
///     description: "Records data changes",
///     author: "Trellis"
/// );
/// ```
#[macro_export]
macro_rules! plugin_info {
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        description: $desc:expr,
        author: $author:expr $(,)?
    ) => {
        $crate::prelude::PluginInfo {
            id: $id.to_string(),
            name: $name.to_string(),
            version: $version.to_string(),
            description: $desc.to_string(),
            author: $author.to_string(),
        }
    };
    (
        id: $id:expr,
        name: $name:expr,
        description: $desc:expr $(,)?
    ) => {
        $crate::plugin_info!(
            id: $id,
            name: $name,
            version: env!("CARGO_PKG_VERSION"),
            description: $desc,
            author: "Trellis"
        )
    };
}
