//! CSRF Protection Middleware
//!
//! State-changing requests must present the single-use token issued for
//! their session. The session and token travel in the configured headers
//! (`X-Session-Id` and `X-CSRF-Token` by default).

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use crate::config::CsrfSettings;
use crate::infrastructure::metrics;
use crate::shared::error::{AppError, CsrfRejection};
use crate::startup::AppState;

/// Whether requests with `method` to `path` need a token.
pub fn requires_token(settings: &CsrfSettings, method: &Method, path: &str) -> bool {
    let state_changing = matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );

    settings.enabled
        && state_changing
        && !settings
            .exempt_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// CSRF validation middleware.
pub async fn csrf_protect(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let settings = &state.settings.csrf;

    if !requires_token(settings, request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();
    let outcome = match (
        header_value(headers, &settings.session_header),
        header_value(headers, &settings.token_header),
    ) {
        (Some(session), Some(token)) => state.csrf.validate(session, token),
        _ => Err(CsrfRejection::Missing),
    };

    if let Err(rejection) = outcome {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            reason = rejection.as_label(),
            "CSRF validation failed"
        );
        metrics::record_csrf_rejected(rejection.as_label());
        return Err(rejection.into());
    }

    Ok(next.run(request).await)
}
