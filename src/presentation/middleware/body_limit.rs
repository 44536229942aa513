//! Request Size Guard
//!
//! Rejects requests whose declared `Content-Length` exceeds the configured
//! ceiling before any of the body is read.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::shared::error::AppError;
use crate::startup::AppState;

/// Declared body length, if the header is present and numeric.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

pub async fn enforce_body_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let limit = state.settings.limits.max_body_bytes;

    if let Some(length) = declared_length(request.headers()) {
        if length > limit as u64 {
            tracing::warn!(
                path = %request.uri().path(),
                declared = length,
                limit,
                "Request body exceeds size limit"
            );
            return Err(AppError::PayloadTooLarge { limit });
        }
    }

    Ok(next.run(request).await)
}
