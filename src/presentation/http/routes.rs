//! Route Configuration
//!
//! Wraps the business routes in the security pipeline. Request order:
//!
//! ```text
//! trace -> cors -> security headers -> body size -> sanitize -> (routing)
//!       -> optional auth -> rate limit -> csrf -> handler
//! ```
//!
//! Security headers sit outside every guard, so rejections carry them too.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    cors, csrf_protect, enforce_body_limit, logging, optional_auth_middleware, rate_limit,
    sanitize_request, SecurityHeadersLayer,
};
use crate::startup::AppState;

/// Create the main router around the business routes in `api`.
///
/// `api` routes should use absolute paths (`/api/v1/...`); rate limit
/// policies select their limiter by path prefix.
pub fn create_router(state: AppState, api: Router<AppState>) -> Router {
    let settings = state.settings.clone();

    let app = Router::new()
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/csrf-token", get(handlers::csrf::issue_csrf_token))
        .merge(api)
        // Route layers run only for matched routes; last added runs first
        .route_layer(middleware::from_fn_with_state(state.clone(), csrf_protect))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(settings.limits.max_body_bytes))
        .with_state(state.clone());

    // Sanitization rewrites the URI, so it must run before the inner router
    // matches the path.
    Router::new()
        .fallback_service(app)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            sanitize_request,
        ))
        .layer(middleware::from_fn_with_state(state, enforce_body_limit))
        .layer(SecurityHeadersLayer::for_environment(&settings.environment))
        .layer(cors::create_cors_layer(&settings))
        .layer(logging::create_trace_layer())
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}
