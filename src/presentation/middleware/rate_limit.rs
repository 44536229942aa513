//! Rate Limiting Middleware
//!
//! Runs every limiter whose policy guards the request path, general first.
//! A request is rejected by the first limiter whose window budget is spent.
//! Limiters with `skip_successful_requests` give their slot back once the
//! handler answers with a status below 400.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{HeaderMapExt, UserAgent};

use crate::application::services::{Admission, RateLimitInfo, RateLimiter};
use crate::config::KeyStrategy;
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

// ============================================================================
// Identifier Extraction
// ============================================================================

/// Best-known client address.
///
/// With `trust_proxy` set, priority is:
/// 1. X-Forwarded-For header (first IP in chain is original client)
/// 2. X-Real-IP header
/// 3. Connection peer address
///
/// Otherwise forwarding headers are ignored: any client can set them.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = forwarded_ip(headers) {
            return ip;
        }
    }

    match peer {
        Some(ip) => ip.to_string(),
        None => {
            tracing::warn!("Could not determine client identifier for rate limiting");
            "unknown".to_string()
        }
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded_for) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first_ip) = forwarded_for.split(',').next() {
            let ip = first_ip.trim();
            if ip.parse::<IpAddr>().is_ok() {
                return Some(ip.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| ip.parse::<IpAddr>().is_ok())
        .map(str::to_owned)
}

/// Derive the counter key for `strategy`.
pub fn rate_limit_key(
    strategy: KeyStrategy,
    headers: &HeaderMap,
    ip: &str,
    user: Option<&AuthUser>,
) -> String {
    match strategy {
        KeyStrategy::Ip => ip.to_string(),
        KeyStrategy::IpUserAgent => {
            let agent = headers
                .typed_get::<UserAgent>()
                .map(|ua| ua.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!("{}:{}", ip, agent)
        }
        KeyStrategy::UserOrIp => match user {
            Some(user) => format!("user:{}", user.user_id),
            None => ip.to_string(),
        },
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Rate limiting middleware for every guarded endpoint class.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    // Present when served through `into_make_service_with_connect_info`
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    let ip = client_ip(request.headers(), peer, state.settings.server.trust_proxy);
    let user = request.extensions().get::<AuthUser>().cloned();

    let mut admitted: Vec<(&RateLimiter, Admission)> = Vec::new();

    for limiter in state.limiters.guarding(&path) {
        if limiter.skips(&path) {
            continue;
        }

        let policy = limiter.policy();
        let key = rate_limit_key(policy.key, request.headers(), &ip, user.as_ref());

        match limiter.admit(&key) {
            Ok(admission) => admitted.push((limiter, admission)),
            Err(info) => {
                // Slots taken by less specific limiters stay spent
                tracing::warn!(
                    key = %key,
                    policy = limiter.class().as_str(),
                    path = %path,
                    retry_after = info.retry_after,
                    "Rate limit exceeded"
                );
                metrics::record_rate_limited(limiter.class().as_str());
                return create_rate_limit_response(&policy.message, &info);
            }
        }
    }

    let mut response = next.run(request).await;
    let succeeded = response.status().as_u16() < 400;

    // The most specific limiter reports its budget
    let mut reported = None;
    for (limiter, admission) in &admitted {
        if succeeded && limiter.policy().skip_successful_requests {
            limiter.rollback(admission);
            reported = Some(slot_returned(&admission.info));
        } else {
            reported = Some(admission.info.clone());
        }
    }

    if let Some(info) = reported {
        add_rate_limit_headers(response.headers_mut(), &info);
    }

    response
}

/// Budget after a rolled back admission.
fn slot_returned(info: &RateLimitInfo) -> RateLimitInfo {
    RateLimitInfo {
        remaining: (info.remaining + 1).min(info.limit),
        ..info.clone()
    }
}

/// Add rate limit headers to a response.
///
/// Headers follow the IETF draft standard for rate limiting:
/// https://datatracker.ietf.org/doc/draft-ietf-httpapi-ratelimit-headers/
fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    if let Ok(v) = HeaderValue::from_str(&info.limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&info.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&info.reset_at.to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }
}

/// Create a 429 Too Many Requests response.
fn create_rate_limit_response(message: &str, info: &RateLimitInfo) -> Response {
    let mut response = AppError::RateLimited(message.to_string()).into_response();

    if let Ok(v) = HeaderValue::from_str(&info.retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, v);
    }
    add_rate_limit_headers(response.headers_mut(), info);

    response
}
