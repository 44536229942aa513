//! CSRF Token Issuance
//!
//! `GET /api/v1/csrf-token` issues a fresh single-use token for the caller's
//! session. Callers without a session id get a new one, returned both in the
//! body and in the session header.

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::infrastructure::metrics;
use crate::presentation::http::extractors::SessionId;
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub success: bool,
    pub csrf_token: String,
    pub session_id: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

pub async fn issue_csrf_token(
    State(state): State<AppState>,
    SessionId(session): SessionId,
) -> Response {
    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());
    let token = state.csrf.issue(&session_id);
    metrics::record_csrf_issued();

    tracing::debug!(session_id = %session_id, expires_at = %token.expires_at, "Issued CSRF token");

    let body = CsrfTokenResponse {
        success: true,
        csrf_token: token.value,
        session_id: session_id.clone(),
        expires_in: state.csrf.ttl().num_seconds(),
    };

    let mut response = Json(body).into_response();
    if let (Ok(name), Ok(value)) = (
        HeaderName::try_from(state.settings.csrf.session_header.to_ascii_lowercase()),
        HeaderValue::from_str(&session_id),
    ) {
        response.headers_mut().insert(name, value);
    }
    response
}
