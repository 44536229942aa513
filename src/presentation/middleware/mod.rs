//! Middleware
//!
//! Tower middleware for request processing. Outer to inner:
//! tracing, CORS, security headers, body size guard, sanitization; then,
//! per matched route, optional auth, rate limiting and CSRF validation.

pub mod auth;
pub mod body_limit;
pub mod cors;
pub mod csrf;
pub mod logging;
pub mod rate_limit;
pub mod sanitize;
pub mod security;

pub use auth::{optional_auth_middleware, AuthUser, Claims};
pub use body_limit::enforce_body_limit;
pub use csrf::csrf_protect;
pub use rate_limit::rate_limit;
pub use sanitize::sanitize_request;
pub use security::{apply_headers, SecurityHeadersConfig, SecurityHeadersLayer};
