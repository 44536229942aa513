//! CSRF security token entity.
//!
//! A token is bound to one session key, expires at an absolute instant and is
//! consumed by its first successful validation.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Number of random bytes in a token (hex encoded to 64 characters).
pub const TOKEN_BYTES: usize = 32;

/// Single-use token issued to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityToken {
    /// Session identifier the token is bound to
    pub session_key: String,

    /// Opaque token value handed to the client
    #[serde(skip_serializing)]
    pub value: String,

    /// Instant after which the token no longer validates
    pub expires_at: DateTime<Utc>,
}

impl SecurityToken {
    /// Mint a fresh token for `session_key`, valid for `ttl` from `now`.
    pub fn generate(session_key: impl Into<String>, ttl: Duration, now: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);

        Self {
            session_key: session_key.into(),
            value: hex::encode(bytes),
            expires_at: now + ttl,
        }
    }

    /// Check if the token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Compare against a presented value without short-circuiting on the
    /// first differing byte.
    pub fn matches(&self, presented: &str) -> bool {
        if self.value.len() != presented.len() {
            return false;
        }
        self.value.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}
