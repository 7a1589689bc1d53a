//! # trellis-router
//!
//! Request routing for Trellis:
//!
//! - Anchored regex route patterns with positional captures
//! - An append-only route table where the earliest registration wins
//! - A dispatcher that drives the router hooks around each request

pub mod dispatcher;
pub mod http;
pub mod pattern;
pub mod route;
pub mod table;

pub use dispatcher::{DispatchContext, DispatchOutcome, Dispatcher};
pub use http::{Request, RequestContext, Response};
pub use pattern::Matcher;
pub use route::{FnHandler, Route, RouteHandler, RouteSpec, RouteSummary};
pub use table::{RouteMatch, RouteTable};
