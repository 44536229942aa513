//! # Domain Layer
//!
//! Core entities of the request-security pipeline, independent of the HTTP
//! framework and of how they are stored.
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Time is passed in explicitly so expiry rules are testable

pub mod entities;
pub mod maintenance;

// Re-export commonly used types
pub use entities::*;
pub use maintenance::Sweepable;
