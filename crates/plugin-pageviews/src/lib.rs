//! Page-view tracker plugin for Trellis.
//!
//! Counts matched requests per route pattern, times each dispatch, and keeps
//! JSON API calls (patterns under `/@/`) apart from page views.

pub mod plugin;
pub mod stats;

pub use plugin::{PLUGIN_ID, PageViewsPlugin};
pub use stats::{PageViewStats, PatternStats, StatsSnapshot};
