//! # Pickup Server Library
//!
//! Request-security pipeline for the waste-pickup marketplace API:
//! - Single-use CSRF tokens with a background expiry sweep
//! - Per-endpoint-class rate limiting (general, auth, search, payments)
//! - Recursive input sanitization of bodies, query strings and paths
//! - Environment-dependent security response headers
//!
//! Business handlers (auth, search, payments, profiles) are mounted into the
//! pipeline through [`presentation::http::routes::create_router`].
//!
//! ## Module Structure
//!
//! ```text
//! pickup_server/
//! +-- config/         Configuration management
//! +-- domain/         Security token and rate window entities
//! +-- application/    Sanitizer and rate limiter services
//! +-- infrastructure/ Token store, sweeper, metrics
//! +-- presentation/   HTTP routes, handlers and guards
//! +-- shared/         Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core entities
pub mod domain;

// Application layer - Security services
pub mod application;

// Infrastructure layer - In-memory stores and metrics
pub mod infrastructure;

// Presentation layer - HTTP routes and middleware
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
