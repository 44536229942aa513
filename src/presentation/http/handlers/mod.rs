//! HTTP Handlers
//!
//! Endpoints served by the pipeline itself. Business endpoints are mounted
//! from outside through [`crate::presentation::http::routes::create_router`].

pub mod csrf;
pub mod health;
