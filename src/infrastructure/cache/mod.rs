//! In-Memory Security State
//!
//! Process-local stores backing the request-security pipeline.
//!
//! ## Components
//!
//! - **CsrfTokenStore**: Single-use CSRF tokens keyed by session
//! - **Sweeper**: Periodic reclamation of expired entries

pub mod sweeper;
pub mod token_store;

pub use sweeper::{run_sweep, spawn_sweeper, SweeperHandle};
pub use token_store::{CsrfTokenStore, DEFAULT_TOKEN_TTL_SECS};
