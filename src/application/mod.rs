//! Application Layer
//!
//! Security services coordinating domain state for the presentation layer.

pub mod services;
