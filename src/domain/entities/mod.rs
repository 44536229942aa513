//! # Domain Entities
//!
//! State the security pipeline keeps between requests.
//!
//! - **SecurityToken**: single-use CSRF token bound to a session key
//! - **RateWindowCounter**: fixed-window request count for one client key
//!
//! Both live only in memory; a restart drops every token and counter.

mod rate_window;
mod security_token;

pub use rate_window::RateWindowCounter;
pub use security_token::{SecurityToken, TOKEN_BYTES};
