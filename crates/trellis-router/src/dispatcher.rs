//! Dispatcher: resolves a request to a route and drives the router hooks.
//!
//! One call to [`Dispatcher::dispatch`]:
//! 1. fires `router_dispatch_before`
//! 2. resolves the route; fires `router_matched` or `router_404`
//! 3. runs the handler
//! 4. filters the response through `response_json_before`
//! 5. fires `router_dispatch_after`
//!
//! Hook failures that the bus reports under the `halt` policy abort the
//! request only while no handler status exists yet (steps 1 and 2) or when
//! the failing hook produces the response (step 4). Once the handler has
//! run, `router_dispatch_after` always fires, even when step 4 halted. A
//! failure in step 5 is logged and the response stands.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use trellis_core::{AppError, AppResult};
use trellis_hooks::{HookArgs, HookBus, HookPoint};

use crate::http::{Request, RequestContext, Response};
use crate::route::RouteSummary;
use crate::table::{RouteMatch, RouteTable};

/// Per-request state owned by the dispatcher for one call.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Request identifier used in log spans.
    pub request_id: Uuid,
    /// Request method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Matched route, once resolved.
    pub matched_route: Option<RouteSummary>,
    /// Captured parameters.
    pub captured_params: Vec<String>,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Monotonic start.
    start: Instant,
}

impl DispatchContext {
    fn new(request: &Request) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method: request.method.clone(),
            path: request.path.clone(),
            matched_route: None,
            captured_params: Vec::new(),
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    /// Time since the request entered the dispatcher.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Result of dispatching one request.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// A route matched and its handler produced a response.
    Handled {
        /// The matched route.
        route: RouteSummary,
        /// Captured parameters.
        params: Vec<String>,
        /// Final response.
        response: Response,
    },
    /// No route matched. Not an error.
    NotFound {
        /// Request method.
        method: String,
        /// Requested path.
        path: String,
    },
    /// A hook failure under the `halt` policy stopped the request.
    Halted {
        /// The hook error.
        error: AppError,
    },
}

impl DispatchOutcome {
    /// Whether no route matched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Converts the outcome into a response, using the default 404 fallback.
    pub fn into_response(self) -> Response {
        self.into_response_or(Response::not_found)
    }

    /// Converts the outcome into a response with a caller-provided fallback
    /// for unmatched requests.
    pub fn into_response_or(self, fallback: impl FnOnce(&str, &str) -> Response) -> Response {
        match self {
            Self::Handled { response, .. } => response,
            Self::NotFound { method, path } => fallback(&method, &path),
            Self::Halted { error } => Response::error(&error),
        }
    }
}

/// Resolves requests against a route table and fires router hooks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Route table, read-only after boot.
    routes: Arc<RouteTable>,
    /// Hook bus, read-only after boot.
    hooks: Arc<HookBus>,
}

impl Dispatcher {
    /// Creates a dispatcher over frozen registries.
    pub fn new(routes: Arc<RouteTable>, hooks: Arc<HookBus>) -> Self {
        Self { routes, hooks }
    }

    /// Pure lookup: the first route for `(method, path)` and its captures.
    pub fn find(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.resolve(method, path)
    }

    /// Dispatches a request through the full hook flow.
    pub fn dispatch(&self, request: &Request) -> DispatchOutcome {
        let mut ctx = DispatchContext::new(request);
        let span = info_span!(
            "dispatch",
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path
        );
        let _enter = span.enter();

        let outcome = self.run(request, &mut ctx);

        let status = match &outcome {
            DispatchOutcome::Handled { response, .. } => response.status,
            DispatchOutcome::NotFound { .. } => 404,
            DispatchOutcome::Halted { error } => error.kind.status_code(),
        };

        info!(
            status = status,
            route_id = ctx.matched_route.as_ref().map(|r| r.id.as_u64()),
            elapsed_us = ctx.elapsed().as_micros() as u64,
            "Request dispatched"
        );

        outcome
    }

    fn run(&self, request: &Request, ctx: &mut DispatchContext) -> DispatchOutcome {
        if let Err(error) = self.fire(HookPoint::RouterDispatchBefore, HookArgs::new()) {
            return DispatchOutcome::Halted { error };
        }

        let Some(found) = self.routes.resolve(&ctx.method, &ctx.path) else {
            // Observers of a miss cannot change the outcome.
            let _ = self.fire(HookPoint::Router404, HookArgs::new().with(ctx.path.clone()));
            return DispatchOutcome::NotFound {
                method: ctx.method.clone(),
                path: ctx.path.clone(),
            };
        };

        let summary = found.route.summary();
        ctx.matched_route = Some(summary.clone());
        ctx.captured_params = found.params.clone();

        if let Err(error) = self.fire(HookPoint::RouterMatched, route_args(ctx)) {
            return DispatchOutcome::Halted { error };
        }

        let handler_ctx = RequestContext {
            request,
            params: &ctx.captured_params,
            request_id: ctx.request_id,
        };
        let response = invoke(found.route.handler.as_ref(), &handler_ctx);

        let filtered = self.filter_response(response);

        let _ = self.fire(HookPoint::RouterDispatchAfter, route_args(ctx));

        let response = match filtered {
            Ok(response) => response,
            Err(error) => return DispatchOutcome::Halted { error },
        };

        DispatchOutcome::Handled {
            route: summary,
            params: ctx.captured_params.clone(),
            response,
        }
    }

    /// Runs an action hook. Failures tolerated by the bus are already logged.
    fn fire(&self, hook: HookPoint, args: HookArgs) -> AppResult<()> {
        self.hooks.run_action(&hook, args).map(|_| ()).inspect_err(|e| {
            warn!(hook = %hook, error = %e, "Router hook halted");
        })
    }

    fn filter_response(&self, response: Response) -> AppResult<Response> {
        if !self.hooks.registry().has_handlers(HookPoint::ResponseJsonBefore.as_str()) {
            return Ok(response);
        }

        let filtered = self.hooks.run_filter(
            HookPoint::ResponseJsonBefore,
            response.to_hook_value(),
            HookArgs::new(),
        )?;
        Ok(Response::from_hook_value(filtered, &response))
    }

    /// The route table.
    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// The hook bus.
    pub fn hooks(&self) -> &Arc<HookBus> {
        &self.hooks
    }
}

/// `(route, params)` arguments for `router_matched` / `router_dispatch_after`.
fn route_args(ctx: &DispatchContext) -> HookArgs {
    let route = ctx
        .matched_route
        .as_ref()
        .and_then(|r| serde_json::to_value(r).ok())
        .unwrap_or(Value::Null);
    HookArgs::new()
        .with(route)
        .with(json!(ctx.captured_params))
}

/// Runs a handler, mapping errors and panics to error responses.
fn invoke(handler: &dyn crate::route::RouteHandler, ctx: &RequestContext<'_>) -> Response {
    match catch_unwind(AssertUnwindSafe(|| handler.handle(ctx))) {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            warn!(error = %err, "Route handler failed");
            Response::error(&err)
        }
        Err(_) => {
            warn!("Route handler panicked");
            Response::error(&AppError::internal("Route handler panicked"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::route::{FnHandler, RouteHandler};
    use trellis_core::ErrorKind;
    use trellis_core::config::{CallbackErrorPolicy, HookConfig};
    use trellis_hooks::ClosureHandler;

    type Log = Arc<Mutex<Vec<String>>>;

    fn echo_params() -> Arc<dyn RouteHandler> {
        FnHandler::arc("echo", |ctx| Ok(Response::ok(json!({ "params": ctx.params }))))
    }

    /// Registers a recorder on every router hook.
    fn observed_bus(config: HookConfig) -> (HookBus, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = HookBus::new(config);
        for hook in [
            HookPoint::RouterDispatchBefore,
            HookPoint::RouterMatched,
            HookPoint::Router404,
            HookPoint::RouterDispatchAfter,
        ] {
            let log = log.clone();
            let label = hook.to_string();
            let name = label.clone();
            bus.register(
                &hook,
                ClosureHandler::action("observer", &label, move |args| {
                    let suffix = match args.get_str(0) {
                        Some(path) => format!(":{path}"),
                        None => String::new(),
                    };
                    log.lock().unwrap().push(format!("{name}{suffix}"));
                    Ok(())
                })
                .into_handler(),
            );
        }
        (bus, log)
    }

    fn dispatcher(table: RouteTable, bus: HookBus) -> Dispatcher {
        Dispatcher::new(Arc::new(table), Arc::new(bus))
    }

    #[test]
    fn test_empty_table_not_found_fires_404_once() {
        let (bus, log) = observed_bus(HookConfig::default());
        let d = dispatcher(RouteTable::new(), bus);

        let outcome = d.dispatch(&Request::new("GET", "/missing"));

        assert!(outcome.is_not_found());
        let log = log.lock().unwrap();
        assert_eq!(
            log.iter().filter(|e| e.starts_with("router_404")).count(),
            1
        );
        assert_eq!(
            *log,
            vec!["router_dispatch_before", "router_404:/missing"]
        );
        assert_eq!(outcome.into_response().status, 404);
    }

    #[test]
    fn test_matched_request_runs_hooks_in_order() {
        let (bus, log) = observed_bus(HookConfig::default());
        let mut table = RouteTable::new();
        table
            .add("GET", r"/@/chat/messages/(\d+)", echo_params())
            .unwrap();
        let d = dispatcher(table, bus);

        let outcome = d.dispatch(&Request::new("GET", "/@/chat/messages/42"));

        let DispatchOutcome::Handled {
            route,
            params,
            response,
        } = outcome
        else {
            panic!("expected a match");
        };
        assert_eq!(params, vec!["42"]);
        assert_eq!(route.pattern, r"/@/chat/messages/(\d+)");
        assert_eq!(response.body, json!({"params": ["42"]}));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "router_dispatch_before",
                "router_matched",
                "router_dispatch_after"
            ]
        );
    }

    #[test]
    fn test_router_matched_receives_route_and_params() {
        let seen = Arc::new(Mutex::new(None));
        let seen_in = seen.clone();
        let mut bus = HookBus::default();
        bus.register(
            HookPoint::RouterMatched,
            ClosureHandler::action("observer", "capture", move |args| {
                *seen_in.lock().unwrap() = Some(args.clone());
                Ok(())
            })
            .into_handler(),
        );
        let mut table = RouteTable::new();
        table.add("GET", r"/u/(\w+)", echo_params()).unwrap();

        dispatcher(table, bus).dispatch(&Request::new("GET", "/u/ada"));

        let args = seen.lock().unwrap().clone().unwrap();
        assert_eq!(args.get(0).unwrap()["pattern"], r"/u/(\w+)");
        assert_eq!(args.get_strings(1), Some(vec!["ada".to_string()]));
    }

    #[test]
    fn test_handler_error_maps_to_status() {
        let mut table = RouteTable::new();
        table
            .add(
                "POST",
                "/validate",
                FnHandler::arc("v", |_| Err(AppError::validation("title required"))),
            )
            .unwrap();
        let d = dispatcher(table, HookBus::default());

        let response = d.dispatch(&Request::new("POST", "/validate")).into_response();
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "VALIDATION");
    }

    #[test]
    fn test_handler_panic_becomes_500() {
        let mut table = RouteTable::new();
        table
            .add("GET", "/panic", FnHandler::arc("p", |_| panic!("handler bug")))
            .unwrap();
        let d = dispatcher(table, HookBus::default());

        let response = d.dispatch(&Request::new("GET", "/panic")).into_response();
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_response_json_before_filters_output() {
        let mut bus = HookBus::default();
        bus.register(
            HookPoint::ResponseJsonBefore,
            ClosureHandler::filter("envelope", "wrap", |mut value, _| {
                let body = value["body"].take();
                value["body"] = json!({ "data": body });
                Ok(value)
            })
            .into_handler(),
        );
        let mut table = RouteTable::new();
        table
            .add("GET", "/hello", FnHandler::arc("h", |_| Ok(Response::ok(json!("hi")))))
            .unwrap();

        let response = dispatcher(table, bus)
            .dispatch(&Request::new("GET", "/hello"))
            .into_response();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"data": "hi"}));
    }

    #[test]
    fn test_failing_observer_does_not_change_status_under_continue() {
        let mut bus = HookBus::default();
        for hook in [HookPoint::RouterMatched, HookPoint::RouterDispatchAfter] {
            bus.register(
                hook,
                ClosureHandler::action("broken", "fails", |_| Err(AppError::internal("x")))
                    .into_handler(),
            );
        }
        let mut table = RouteTable::new();
        table
            .add("GET", "/ok", FnHandler::arc("ok", |_| Ok(Response::with_status(202, json!({})))))
            .unwrap();

        let response = dispatcher(table, bus)
            .dispatch(&Request::new("GET", "/ok"))
            .into_response();
        assert_eq!(response.status, 202);
    }

    #[test]
    fn test_halt_policy_aborts_before_handler() {
        let ran = Arc::new(Mutex::new(false));
        let ran_in = ran.clone();
        let mut bus = HookBus::new(HookConfig {
            on_callback_error: CallbackErrorPolicy::Halt,
            ..HookConfig::default()
        });
        bus.register(
            HookPoint::RouterDispatchBefore,
            ClosureHandler::action("guard", "deny", |_| Err(AppError::internal("x")))
                .into_handler(),
        );
        let mut table = RouteTable::new();
        table
            .add(
                "GET",
                "/guarded",
                FnHandler::arc("g", move |_| {
                    *ran_in.lock().unwrap() = true;
                    Ok(Response::ok(json!({})))
                }),
            )
            .unwrap();

        let outcome = dispatcher(table, bus).dispatch(&Request::new("GET", "/guarded"));

        let DispatchOutcome::Halted { error } = &outcome else {
            panic!("expected halt");
        };
        assert_eq!(error.kind, ErrorKind::HookCallback);
        assert!(!*ran.lock().unwrap());
        assert_eq!(outcome.into_response().status, 500);
    }

    #[test]
    fn test_halt_in_dispatch_after_keeps_handler_status() {
        let mut bus = HookBus::new(HookConfig {
            on_callback_error: CallbackErrorPolicy::Halt,
            ..HookConfig::default()
        });
        bus.register(
            HookPoint::RouterDispatchAfter,
            ClosureHandler::action("late", "fails", |_| Err(AppError::internal("x")))
                .into_handler(),
        );
        let mut table = RouteTable::new();
        table
            .add("GET", "/late", FnHandler::arc("l", |_| Ok(Response::ok(json!(1)))))
            .unwrap();

        let response = dispatcher(table, bus)
            .dispatch(&Request::new("GET", "/late"))
            .into_response();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_halt_in_response_filter_still_ends_request() {
        let (mut bus, log) = observed_bus(HookConfig {
            on_callback_error: CallbackErrorPolicy::Halt,
            ..HookConfig::default()
        });
        bus.register(
            HookPoint::ResponseJsonBefore,
            ClosureHandler::filter("envelope", "fails", |_, _| Err(AppError::internal("x")))
                .into_handler(),
        );
        let mut table = RouteTable::new();
        table
            .add("GET", "/p", FnHandler::arc("p", |_| Ok(Response::ok(json!(1)))))
            .unwrap();

        let outcome = dispatcher(table, bus).dispatch(&Request::new("GET", "/p"));

        assert!(matches!(outcome, DispatchOutcome::Halted { .. }));
        assert_eq!(outcome.into_response().status, 500);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "router_dispatch_before",
                "router_matched",
                "router_dispatch_after"
            ]
        );
    }

    #[test]
    fn test_custom_not_found_fallback() {
        let d = dispatcher(RouteTable::new(), HookBus::default());
        let response = d
            .dispatch(&Request::new("GET", "/nope"))
            .into_response_or(|_, path| Response::with_status(404, json!({ "missing": path })));
        assert_eq!(response.body, json!({"missing": "/nope"}));
    }
}
