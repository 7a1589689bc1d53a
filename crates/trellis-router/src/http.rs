//! Request and response values exchanged with route handlers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use trellis_core::AppError;
use trellis_core::types::ApiErrorResponse;

/// An inbound request as seen by the dispatcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method. Callers normalise casing before dispatch.
    pub method: String,
    /// Request path, without query string.
    pub path: String,
    /// Decoded query parameters.
    #[serde(default)]
    pub query: HashMap<String, String>,
    /// JSON body, `null` when absent.
    #[serde(default)]
    pub body: Value,
}

impl Request {
    /// Creates a request with no query and no body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Adds a query parameter.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }
}

/// What a route handler receives.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// The request.
    pub request: &'a Request,
    /// Captured path parameters in pattern order.
    pub params: &'a [String],
    /// Per-request identifier.
    pub request_id: Uuid,
}

impl RequestContext<'_> {
    /// Gets a captured parameter by position.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Parses a captured parameter.
    pub fn param_as<T: std::str::FromStr>(&self, index: usize) -> Option<T> {
        self.param(index).and_then(|p| p.parse().ok())
    }

    /// Gets a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.query.get(key).map(String::as_str)
    }
}

/// A JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl Response {
    /// Creates a 200 response.
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// Creates a response with an explicit status.
    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Maps an application error to its status and JSON error body.
    pub fn error(err: &AppError) -> Self {
        Self {
            status: err.kind.status_code(),
            body: serde_json::to_value(ApiErrorResponse::from_error(err))
                .unwrap_or_else(|_| json!({ "error": err.kind.to_string() })),
        }
    }

    /// The default fallback for an unmatched request.
    pub fn not_found(method: &str, path: &str) -> Self {
        Self::error(&AppError::not_found(format!("No route for {method} {path}")))
    }

    /// The `{status, body}` value handed to `response_json_before`.
    pub fn to_hook_value(&self) -> Value {
        json!({ "status": self.status, "body": self.body })
    }

    /// Rebuilds a response from a filtered `{status, body}` value.
    ///
    /// A missing or invalid status keeps the original one.
    pub fn from_hook_value(value: Value, original: &Response) -> Self {
        let status = value
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(original.status);
        let body = match value {
            Value::Object(mut map) => map.remove("body").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Self { status, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let resp = Response::not_found("GET", "/missing");
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body["error"], "NOT_FOUND");
        assert!(resp.body["message"].as_str().unwrap().contains("/missing"));
    }

    #[test]
    fn test_hook_value_round_trip_and_override() {
        let original = Response::ok(json!({"a": 1}));
        let same = Response::from_hook_value(original.to_hook_value(), &original);
        assert_eq!(same, original);

        let changed = Response::from_hook_value(
            json!({"status": 201, "body": {"a": 2}}),
            &original,
        );
        assert_eq!(changed.status, 201);
        assert_eq!(changed.body, json!({"a": 2}));

        let bad_status = Response::from_hook_value(json!({"status": "x", "body": 1}), &original);
        assert_eq!(bad_status.status, 200);
    }

    #[test]
    fn test_context_params() {
        let request = Request::new("GET", "/x").with_query("page", "2");
        let params = vec!["42".to_string()];
        let ctx = RequestContext {
            request: &request,
            params: &params,
            request_id: Uuid::new_v4(),
        };
        assert_eq!(ctx.param(0), Some("42"));
        assert_eq!(ctx.param_as::<u32>(0), Some(42));
        assert_eq!(ctx.param(1), None);
        assert_eq!(ctx.query("page"), Some("2"));
    }
}
