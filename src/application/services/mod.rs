//! Application Services
//!
//! Security services that sit between the HTTP guards and domain state.
//!
//! ## Available Services
//!
//! - **sanitizer**: Recursive stripping of untrusted input
//! - **RateLimiter**: Fixed-window limiting per endpoint class

pub mod rate_limiter;
pub mod sanitizer;

pub use rate_limiter::{Admission, EndpointClass, RateLimitInfo, RateLimiter, RateLimiters};
pub use sanitizer::{sanitize, sanitize_path, sanitize_query, sanitize_str};
