//! Health Check Handlers
//!
//! # Endpoints
//! - `GET /health` - Basic health check with uptime
//! - `GET /health/ready` - Readiness with in-memory state sizes
//!
//! Both are exempt from the general rate limiter.

use axum::{extract::State, Json};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub csrf_tokens: usize,
    pub rate_limit_counters: usize,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
    })
}

/// Readiness probe; the pipeline has no external dependencies, so it is
/// ready whenever it answers.
pub async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready",
        csrf_tokens: state.csrf.len(),
        rate_limit_counters: state.limiters.iter().map(|l| l.len()).sum(),
    })
}
