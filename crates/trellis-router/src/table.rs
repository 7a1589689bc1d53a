//! Route table: ordered storage of registered routes.
//!
//! Routes are kept in registration order and never reordered or removed.
//! Lookup is a linear scan that returns the first matching route, so among
//! routes matching the same request the earliest registration always wins.

use std::sync::Arc;

use tracing::info;

use trellis_core::AppResult;
use trellis_core::types::{RouteId, Sequence};

use crate::pattern::Matcher;
use crate::route::{CORE_OWNER, Route, RouteHandler, RouteSpec, RouteSummary};

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The matched route.
    pub route: &'a Route,
    /// Captured parameters in pattern order.
    pub params: Vec<String>,
}

/// Ordered collection of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    /// Routes in registration order.
    routes: Vec<Route>,
    /// Registration counter.
    sequence: Sequence,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a core route.
    pub fn add(
        &mut self,
        method: &str,
        pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> AppResult<RouteId> {
        self.add_owned(CORE_OWNER, method, pattern, handler)
    }

    /// Registers a route on behalf of a plugin.
    ///
    /// Fails with `InvalidPattern` when the pattern does not compile.
    /// Duplicates are accepted; the earlier entry shadows the later one.
    pub fn add_owned(
        &mut self,
        owner: &str,
        method: &str,
        pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> AppResult<RouteId> {
        let matcher = Matcher::compile(pattern)?;
        Ok(self.push(owner, method, matcher, handler))
    }

    /// Registers a batch atomically: either every spec compiles and all are
    /// added in order, or nothing is added.
    pub fn add_all(&mut self, owner: &str, specs: &[RouteSpec]) -> AppResult<Vec<RouteId>> {
        let compiled = specs
            .iter()
            .map(|spec| Matcher::compile(&spec.pattern))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(specs
            .iter()
            .zip(compiled)
            .map(|(spec, matcher)| self.push(owner, &spec.method, matcher, spec.handler.clone()))
            .collect())
    }

    fn push(
        &mut self,
        owner: &str,
        method: &str,
        matcher: Matcher,
        handler: Arc<dyn RouteHandler>,
    ) -> RouteId {
        let id = RouteId(self.sequence.next());

        info!(
            route_id = %id,
            method = %method,
            pattern = %matcher.source(),
            plugin_id = %owner,
            "Route registered"
        );

        self.routes.push(Route {
            id,
            method: method.to_string(),
            matcher,
            handler,
            owner: owner.to_string(),
        });

        id
    }

    /// Finds the first route, in registration order, whose method equals
    /// `method` and whose pattern matches `path`.
    pub fn resolve(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route
                    .matcher
                    .captures(path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    /// Gets a route by id.
    pub fn get(&self, id: RouteId) -> Option<&Route> {
        // Ids are dense and assigned in push order.
        self.routes
            .get(id.0 as usize)
            .filter(|route| route.id == id)
            .or_else(|| self.routes.iter().find(|route| route.id == id))
    }

    /// Iterates routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Lists routes in registration order.
    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes.iter().map(Route::summary).collect()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
