//! # trellis-plugin
//!
//! Plugin host for Trellis. Provides:
//!
//! - The `Plugin` trait and its typed `PluginExport`
//! - A loader that runs each entry point once and isolates failures
//! - Directory discovery against a catalog of compiled-in plugins
//! - Menu and CLI command helpers for plugin code

pub mod api;
pub mod discovery;
pub mod exports;
pub mod loader;
pub mod macros;
pub mod prelude;
pub mod registry;

pub use api::commands::CommandTable;
pub use discovery::{Discovery, PluginCatalog, PluginManifest, discover};
pub use exports::{HookSpec, PluginExport, PluginExportBuilder};
pub use loader::{LoadReport, LoadTarget, PluginFailure, PluginLoader};
pub use registry::{
    Plugin, PluginDescriptor, PluginInfo, PluginRecord, PluginRegistry, PluginStatus,
};
