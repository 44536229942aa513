//! Infrastructure Layer
//!
//! Contains implementations for:
//! - In-memory token storage and background sweeps
//! - Prometheus metrics

pub mod cache;
pub mod metrics;
