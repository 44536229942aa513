//! Security Headers Middleware
//!
//! Adds security headers to every HTTP response, rejections included.
//! The Content-Security-Policy depends on the deployment environment; the
//! remaining headers are fixed.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request, Response},
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// CSP for production: same-origin resources, map tiles over HTTPS, Supabase API
pub const PRODUCTION_CSP: &str = "default-src 'self'; script-src 'self'; style-src 'self'; \
img-src 'self' data: https:; connect-src 'self' https://*.supabase.co wss://*.supabase.co; \
font-src 'self'; object-src 'none'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'";

/// CSP for development: permits inline scripts and local bundlers
pub const DEVELOPMENT_CSP: &str = "default-src 'self' 'unsafe-inline' 'unsafe-eval'; \
img-src 'self' data: blob: http: https:; connect-src 'self' http: https: ws: wss:; \
frame-ancestors 'none'";

/// Security headers configuration
#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    /// Enable HSTS header (production only)
    pub enable_hsts: bool,
    /// HSTS max-age in seconds (default: 31536000 = 1 year)
    pub hsts_max_age: u64,
    /// Content-Security-Policy directive
    pub content_security_policy: String,
    /// Referrer-Policy value
    pub referrer_policy: String,
    /// Permissions-Policy value
    pub permissions_policy: String,
}

impl SecurityHeadersConfig {
    /// Header set for the named deployment environment.
    pub fn for_environment(environment: &str) -> Self {
        let production = environment.eq_ignore_ascii_case("production");
        Self {
            enable_hsts: production,
            hsts_max_age: 31536000, // 1 year
            content_security_policy: if production {
                PRODUCTION_CSP.to_string()
            } else {
                DEVELOPMENT_CSP.to_string()
            },
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            // Pickup tracking needs the device location on our own origin
            permissions_policy: "camera=(), microphone=(), geolocation=(self)".to_string(),
        }
    }
}

/// Write the configured security headers into `headers`.
pub fn apply_headers(headers: &mut HeaderMap, config: &SecurityHeadersConfig) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    // Legacy filter for older browsers
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );

    if config.enable_hsts {
        let hsts_value = format!("max-age={}; includeSubDomains", config.hsts_max_age);
        if let Ok(value) = HeaderValue::from_str(&hsts_value) {
            headers.insert(header::STRICT_TRANSPORT_SECURITY, value);
        }
    }

    if let Ok(value) = HeaderValue::from_str(&config.content_security_policy) {
        headers.insert(header::CONTENT_SECURITY_POLICY, value);
    }
    if let Ok(value) = HeaderValue::from_str(&config.referrer_policy) {
        headers.insert(header::REFERRER_POLICY, value);
    }
    if let Ok(value) = HeaderValue::from_str(&config.permissions_policy) {
        headers.insert(
            header::HeaderName::from_static("permissions-policy"),
            value,
        );
    }
}

/// Layer that adds security headers to responses
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    config: SecurityHeadersConfig,
}

impl SecurityHeadersLayer {
    /// Create a layer for the named deployment environment
    pub fn for_environment(environment: &str) -> Self {
        Self {
            config: SecurityHeadersConfig::for_environment(environment),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Middleware service that adds security headers
#[derive(Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    config: SecurityHeadersConfig,
}

impl<S> Service<Request<Body>> for SecurityHeadersMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = self.config.clone();

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            apply_headers(response.headers_mut(), &config);
            Ok(response)
        })
    }
}
