//! Fallback handler: hands every request to the framework dispatcher.

use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use trellis_core::AppError;
use trellis_router::Request;

use crate::error::ApiError;
use crate::state::AppState;

/// ANY /{*path}
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = parse_body(&body)?;

    let mut request = Request::new(method.as_str().to_uppercase(), uri.path()).with_body(body);
    request.query = query;

    let response = state.framework.dispatch(&request);

    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(response.body)).into_response())
}

/// Empty bodies become `null`; anything else must be JSON.
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Request body is not valid JSON: {e}")).into())
}
