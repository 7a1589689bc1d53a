//! Page-view plugin implementation: registers with the Trellis plugin system.

use std::sync::Arc;

use tracing::debug;

use trellis_plugin::prelude::*;

use crate::stats::{PageViewStats, start_timer, stop_timer};

/// Plugin id and folder name.
pub const PLUGIN_ID: &str = "pageviews";

/// Page-view tracker plugin.
#[derive(Debug, Default)]
pub struct PageViewsPlugin {
    stats: Arc<PageViewStats>,
}

impl PageViewsPlugin {
    /// Creates the plugin with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<PageViewStats> {
        Arc::clone(&self.stats)
    }
}

fn route_pattern(args: &HookArgs) -> Option<String> {
    args.get(0)
        .and_then(|route| route.get("pattern"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl Plugin for PageViewsPlugin {
    fn info(&self) -> PluginInfo {
        plugin_info!(
            id: PLUGIN_ID,
            name: "Page Views",
            description: "Counts and times requests per route pattern"
        )
    }

    fn register(&self) -> AppResult<PluginExport> {
        let matched = Arc::clone(&self.stats);
        let finished = Arc::clone(&self.stats);
        let missed = Arc::clone(&self.stats);
        let listed = Arc::clone(&self.stats);

        Ok(PluginExport::builder()
            .get(
                "/@/pageviews/stats",
                FnHandler::arc("pageviews_stats", move |_| {
                    Ok(Response::ok(serde_json::to_value(listed.snapshot())?))
                }),
            )
            .on_with_priority(
                HookPoint::RouterDispatchBefore,
                ClosureHandler::action(PLUGIN_ID, "pageviews_start", |_| {
                    start_timer();
                    Ok(())
                })
                .into_handler(),
                0,
            )
            .on(
                HookPoint::RouterMatched,
                ClosureHandler::action(PLUGIN_ID, "pageviews_count", move |args| {
                    if let Some(pattern) = route_pattern(args) {
                        matched.record_match(&pattern);
                    }
                    Ok(())
                })
                .into_handler(),
            )
            .on(
                HookPoint::RouterDispatchAfter,
                ClosureHandler::action(PLUGIN_ID, "pageviews_time", move |args| {
                    let (Some(pattern), Some(elapsed)) = (route_pattern(args), stop_timer()) else {
                        return Ok(());
                    };
                    debug!(pattern = %pattern, elapsed_us = elapsed.as_micros() as u64, "Page view timed");
                    finished.record_timing(&pattern, elapsed);
                    Ok(())
                })
                .into_handler(),
            )
            .on(
                HookPoint::Router404,
                ClosureHandler::action(PLUGIN_ID, "pageviews_miss", move |_| {
                    stop_timer();
                    missed.record_not_found();
                    Ok(())
                })
                .into_handler(),
            )
            .on(
                HookPoint::AuthSessionData,
                ClosureHandler::filter(PLUGIN_ID, "pageviews_menu", |session, _| {
                    add_to_group(
                        session,
                        &MenuItem::group("grp-tools", "Tools").with_icon("wrench"),
                        &MenuItem::link("pageviews-stats", "Page Views", "/@/pageviews/stats")
                            .with_icon("chart"),
                    )
                })
                .into_handler(),
            )
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_router::{Dispatcher, Request, RouteTable};

    fn dispatcher(plugin: &PageViewsPlugin) -> Dispatcher {
        let export = plugin.register().unwrap();
        let mut routes = RouteTable::new();
        routes
            .add("GET", "/", FnHandler::arc("home", |_| Ok(Response::ok(json!("home")))))
            .unwrap();
        routes.add_all(PLUGIN_ID, &export.routes).unwrap();
        let mut hooks = HookBus::default();
        for spec in export.hooks {
            match spec.priority {
                Some(p) => hooks.register_with_priority(&spec.hook, spec.handler, p),
                None => hooks.register(&spec.hook, spec.handler),
            };
        }
        Dispatcher::new(Arc::new(routes), Arc::new(hooks))
    }

    #[test]
    fn test_counts_pages_api_and_misses() {
        let plugin = PageViewsPlugin::new();
        let dispatcher = dispatcher(&plugin);

        dispatcher.dispatch(&Request::new("GET", "/"));
        dispatcher.dispatch(&Request::new("GET", "/"));
        dispatcher.dispatch(&Request::new("GET", "/nowhere"));
        let out = dispatcher
            .dispatch(&Request::new("GET", "/@/pageviews/stats"))
            .into_response();

        assert_eq!(out.status, 200);
        assert_eq!(out.body["page_views"], 2);
        assert_eq!(out.body["not_found"], 1);
        // The stats call itself is counted before its handler runs.
        assert_eq!(out.body["api_calls"], 1);

        let home = plugin.stats().pattern("/").unwrap();
        assert_eq!(home.views, 2);
        assert_eq!(home.timed, 2);
    }
}
