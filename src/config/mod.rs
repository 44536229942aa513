//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration can be loaded from:
//! - Built-in defaults (see [`Settings::default`])
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - Environment variables (prefixed with APP__)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pickup_server::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("auth limiter: {} per {}s",
//!     settings.rate_limit.auth.max_requests,
//!     settings.rate_limit.auth.window_secs);
//! ```

mod settings;

pub use settings::*;
