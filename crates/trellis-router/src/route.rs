//! Routes and route handlers.

use std::sync::Arc;

use serde::Serialize;

use trellis_core::AppResult;
use trellis_core::types::RouteId;

use crate::http::{RequestContext, Response};
use crate::pattern::Matcher;

/// Owner recorded for routes the framework registers itself.
pub const CORE_OWNER: &str = "core";

/// Trait for route handler implementations.
pub trait RouteHandler: Send + Sync + std::fmt::Debug {
    /// Handles a matched request.
    fn handle(&self, ctx: &RequestContext<'_>) -> AppResult<Response>;
}

type HandlerFn = dyn Fn(&RequestContext<'_>) -> AppResult<Response> + Send + Sync;

/// A closure-based route handler.
pub struct FnHandler {
    /// Name shown in debug output.
    name: String,
    /// Handler function.
    handler: Arc<HandlerFn>,
}

impl FnHandler {
    /// Creates a handler from a closure.
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> AppResult<Response> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            handler: Arc::new(handler),
        }
    }

    /// Wraps a closure into an `Arc<dyn RouteHandler>`.
    pub fn arc<F>(name: &str, handler: F) -> Arc<dyn RouteHandler>
    where
        F: Fn(&RequestContext<'_>) -> AppResult<Response> + Send + Sync + 'static,
    {
        Arc::new(Self::new(name, handler))
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("name", &self.name)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl RouteHandler for FnHandler {
    fn handle(&self, ctx: &RequestContext<'_>) -> AppResult<Response> {
        (self.handler)(ctx)
    }
}

/// A registered route. Immutable once added.
#[derive(Debug, Clone)]
pub struct Route {
    /// Registration index.
    pub id: RouteId,
    /// HTTP method, compared exactly.
    pub method: String,
    /// Compiled pattern.
    pub matcher: Matcher,
    /// Handler.
    pub handler: Arc<dyn RouteHandler>,
    /// Plugin that registered the route.
    pub owner: String,
}

impl Route {
    /// The pattern as registered.
    pub fn pattern(&self) -> &str {
        self.matcher.source()
    }

    /// Serializable view of the route, also used as the `route` hook argument.
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            id: self.id,
            method: self.method.clone(),
            pattern: self.pattern().to_string(),
            plugin: self.owner.clone(),
        }
    }
}

/// Serializable view of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    /// Registration index.
    pub id: RouteId,
    /// HTTP method.
    pub method: String,
    /// Pattern.
    pub pattern: String,
    /// Owning plugin.
    pub plugin: String,
}

/// A route a plugin asks to register.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    /// HTTP method.
    pub method: String,
    /// Pattern.
    pub pattern: String,
    /// Handler.
    pub handler: Arc<dyn RouteHandler>,
}

impl RouteSpec {
    /// Creates a route spec.
    pub fn new(
        method: impl Into<String>,
        pattern: impl Into<String>,
        handler: Arc<dyn RouteHandler>,
    ) -> Self {
        Self {
            method: method.into(),
            pattern: pattern.into(),
            handler,
        }
    }
}
