//! Presentation Layer
//!
//! HTTP routes and the request-security middleware stack.

pub mod http;
pub mod middleware;
