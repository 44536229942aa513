//! Input Sanitization Middleware
//!
//! Runs before routing so that path parameters, query extractors and JSON
//! bodies all see sanitized input:
//! - the URI path has angle brackets (literal or percent-encoded) and edge
//!   whitespace removed from every segment;
//! - query string values are decoded, sanitized and re-encoded;
//! - JSON bodies are parsed, sanitized recursively and re-serialized.
//!
//! Bodies that fail to parse as JSON pass through untouched.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, uri::PathAndQuery, HeaderMap, HeaderValue, Uri},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::application::services::{sanitize, sanitize_path, sanitize_query};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Whether the request declares a JSON body.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Rebuild `uri` with sanitized path and query. Returns `None` when nothing
/// changes.
pub fn sanitize_uri(uri: &Uri) -> Result<Option<Uri>, AppError> {
    let path = sanitize_path(uri.path());
    let query = uri.query().filter(|q| !q.is_empty()).map(sanitize_query);

    if path == uri.path() && query.as_deref() == uri.query().filter(|q| !q.is_empty()) {
        return Ok(None);
    }

    let path_and_query = match &query {
        Some(q) => format!("{}?{}", path, q),
        None => path,
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query)
            .map_err(|e| AppError::BadRequest(format!("Invalid request URI: {}", e)))?,
    );

    Uri::from_parts(parts)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("Invalid request URI: {}", e)))
}

/// Sanitize a JSON payload. `None` when the bytes are not JSON.
pub fn sanitize_json(bytes: &[u8]) -> Option<Vec<u8>> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    serde_json::to_vec(&sanitize(&value)).ok()
}

/// Request sanitization middleware.
pub async fn sanitize_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    if let Some(uri) = sanitize_uri(&parts.uri)? {
        tracing::debug!(original = %parts.uri, sanitized = %uri, "Sanitized request URI");
        parts.uri = uri;
    }

    let body = if is_json(&parts.headers) {
        let limit = state.settings.limits.max_body_bytes;
        let bytes: Bytes = to_bytes(body, limit).await.map_err(|e| {
            tracing::warn!(error = %e, limit, "Failed to buffer request body");
            AppError::PayloadTooLarge { limit }
        })?;

        match sanitize_json(&bytes) {
            Some(clean) => {
                parts
                    .headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(clean.len()));
                Body::from(clean)
            }
            None => Body::from(bytes),
        }
    } else {
        body
    };

    Ok(next.run(Request::from_parts(parts, body)).await)
}
