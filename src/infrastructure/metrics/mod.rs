//! Prometheus Metrics Module
//!
//! # Metrics Collected
//! - Rate limit rejections by policy
//! - CSRF rejections by reason, tokens issued
//! - Entries reclaimed by maintenance sweeps, and failed sweeps

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Requests rejected by a rate limiter, by policy name
pub static RATE_LIMIT_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rate_limit_rejections_total", "Requests rejected by a rate limiter")
            .namespace("pickup_server"),
        &["policy"],
    )
    .expect("Failed to create RATE_LIMIT_REJECTIONS_TOTAL metric")
});

/// State-changing requests rejected by the CSRF guard, by reason
pub static CSRF_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("csrf_rejections_total", "Requests rejected by the CSRF guard")
            .namespace("pickup_server"),
        &["reason"], // "missing", "mismatch", "expired"
    )
    .expect("Failed to create CSRF_REJECTIONS_TOTAL metric")
});

/// CSRF tokens handed out
pub static CSRF_TOKENS_ISSUED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("csrf_tokens_issued_total", "CSRF tokens issued").namespace("pickup_server"),
    )
    .expect("Failed to create CSRF_TOKENS_ISSUED_TOTAL metric")
});

/// Entries removed by maintenance sweeps, by target
pub static SWEEP_REMOVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sweep_removed_total", "Expired entries removed by maintenance sweeps")
            .namespace("pickup_server"),
        &["target"], // "csrf_tokens", "rate_counters"
    )
    .expect("Failed to create SWEEP_REMOVED_TOTAL metric")
});

/// Sweep passes that panicked, by target
pub static SWEEP_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sweep_failures_total", "Maintenance sweep passes that failed")
            .namespace("pickup_server"),
        &["target"],
    )
    .expect("Failed to create SWEEP_FAILURES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(RATE_LIMIT_REJECTIONS_TOTAL.clone()))
        .expect("Failed to register RATE_LIMIT_REJECTIONS_TOTAL");
    registry
        .register(Box::new(CSRF_REJECTIONS_TOTAL.clone()))
        .expect("Failed to register CSRF_REJECTIONS_TOTAL");
    registry
        .register(Box::new(CSRF_TOKENS_ISSUED_TOTAL.clone()))
        .expect("Failed to register CSRF_TOKENS_ISSUED_TOTAL");
    registry
        .register(Box::new(SWEEP_REMOVED_TOTAL.clone()))
        .expect("Failed to register SWEEP_REMOVED_TOTAL");
    registry
        .register(Box::new(SWEEP_FAILURES_TOTAL.clone()))
        .expect("Failed to register SWEEP_FAILURES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a rate limit rejection
pub fn record_rate_limited(policy: &str) {
    RATE_LIMIT_REJECTIONS_TOTAL.with_label_values(&[policy]).inc();
}

/// Record a CSRF rejection
pub fn record_csrf_rejected(reason: &str) {
    CSRF_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
}

/// Record an issued CSRF token
pub fn record_csrf_issued() {
    CSRF_TOKENS_ISSUED_TOTAL.inc();
}

/// Record the outcome of one sweep pass
pub fn record_sweep(target: &str, removed: Option<usize>) {
    match removed {
        Some(n) => SWEEP_REMOVED_TOTAL
            .with_label_values(&[target])
            .inc_by(n as u64),
        None => SWEEP_FAILURES_TOTAL.with_label_values(&[target]).inc(),
    }
}
