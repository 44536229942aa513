//! CSRF Token Store
//!
//! In-memory store of single-use CSRF tokens keyed by session identifier.
//!
//! # Lifecycle
//!
//! ```text
//! absent --issue--> issued --validate ok--> consumed (absent)
//!                      \----expiry/sweep---> expired  (absent)
//! ```
//!
//! Issuing again for the same session replaces the previous token. Entries
//! that expire without being used are reclaimed by the periodic sweep.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::sweeper::{spawn_sweeper, SweeperHandle};
use crate::config::CsrfSettings;
use crate::domain::{SecurityToken, Sweepable};
use crate::shared::error::CsrfRejection;

/// Default token lifetime in seconds (30 minutes)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 60;

/// Keyed store of live CSRF tokens.
pub struct CsrfTokenStore {
    tokens: DashMap<String, SecurityToken>,
    ttl: Duration,
}

impl CsrfTokenStore {
    /// Create an empty store issuing tokens valid for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Create a store from application settings.
    pub fn from_settings(settings: &CsrfSettings) -> Self {
        Self::new(Duration::seconds(settings.token_ttl_secs as i64))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `session_key`, replacing any previous one.
    pub fn issue(&self, session_key: &str) -> SecurityToken {
        self.issue_at(session_key, Utc::now())
    }

    /// Issue a token for `session_key` as of `now`.
    pub fn issue_at(&self, session_key: &str, now: DateTime<Utc>) -> SecurityToken {
        let token = SecurityToken::generate(session_key, self.ttl, now);
        self.tokens.insert(session_key.to_owned(), token.clone());
        token
    }

    /// Validate and consume the token presented for `session_key`.
    pub fn validate(&self, session_key: &str, presented: &str) -> Result<(), CsrfRejection> {
        self.validate_at(session_key, presented, Utc::now())
    }

    /// Validate and consume the token presented for `session_key` as of `now`.
    ///
    /// A matching live token is removed atomically, so two concurrent
    /// requests presenting the same token cannot both pass. A mismatch leaves
    /// the stored token in place; an expired token is removed.
    pub fn validate_at(
        &self,
        session_key: &str,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CsrfRejection> {
        let consumed = self
            .tokens
            .remove_if(session_key, |_, token| {
                !token.is_expired_at(now) && token.matches(presented)
            })
            .is_some();

        if consumed {
            return Ok(());
        }

        if self
            .tokens
            .remove_if(session_key, |_, token| token.is_expired_at(now))
            .is_some()
        {
            return Err(CsrfRejection::Expired);
        }

        if self.tokens.contains_key(session_key) {
            Err(CsrfRejection::Mismatch)
        } else {
            Err(CsrfRejection::Missing)
        }
    }

    /// Whether a live or not-yet-swept token exists for `session_key`.
    pub fn contains(&self, session_key: &str) -> bool {
        self.tokens.contains_key(session_key)
    }

    /// Number of stored tokens, expired ones not yet swept included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Start the periodic expiry sweep for this store.
    pub fn spawn_sweeper(self: &Arc<Self>, period: StdDuration) -> SweeperHandle {
        spawn_sweeper(self.clone(), period)
    }
}

impl Default for CsrfTokenStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }
}

impl Sweepable for CsrfTokenStore {
    fn sweep_target(&self) -> &'static str {
        "csrf_tokens"
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.tokens.retain(|_, token| {
            let keep = token.expires_at >= now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}
