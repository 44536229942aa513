//! CORS Middleware Configuration

use axum::http::{header, HeaderName, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Settings;

/// Headers the mobile client reads back from responses
const EXPOSED_HEADERS: [&str; 4] = [
    "x-ratelimit-limit",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
    "retry-after",
];

/// Create CORS layer from settings
pub fn create_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let mut allowed_headers = vec![header::CONTENT_TYPE, header::AUTHORIZATION];
    let mut exposed_headers: Vec<HeaderName> = EXPOSED_HEADERS
        .into_iter()
        .map(HeaderName::from_static)
        .collect();

    // Session and token header names are configurable
    for name in [&settings.csrf.session_header, &settings.csrf.token_header] {
        if let Ok(name) = HeaderName::try_from(name.to_ascii_lowercase()) {
            allowed_headers.push(name.clone());
            exposed_headers.push(name);
        }
    }

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(allowed_headers)
        .expose_headers(exposed_headers);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer
            .allow_origin(AllowOrigin::list(origins))
            .max_age(std::time::Duration::from_secs(3600)) // 1 hour default
    }
}
