//! Rate Limiter
//!
//! In-memory fixed-window rate limiting. Each endpoint class owns an
//! independent [`RateLimiter`] built from one row of the configured policy
//! table; [`RateLimiters`] holds the whole table.
//!
//! # Algorithm
//!
//! One counter per key:
//! 1. Unknown key, or window elapsed: open a new window with count 1, allow
//! 2. Otherwise increment; allow while `count <= max_requests`
//!
//! Rejected requests are counted too, so hammering a closed window does not
//! shorten it. Counters whose window elapsed are dropped by the maintenance
//! sweep.

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;

use crate::config::{RateLimitPolicy, RateLimitSettings};
use crate::domain::{RateWindowCounter, Sweepable};

/// Endpoint classes with their own limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    /// Every API route; skips health checks
    General,
    /// Login, registration, SMS verification
    Auth,
    /// Recycler and pickup search
    Search,
    /// Payment initiation and confirmation
    Payment,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::General => "general",
            EndpointClass::Auth => "auth",
            EndpointClass::Search => "search",
            EndpointClass::Payment => "payment",
        }
    }
}

/// Rate limit status returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the current window
    pub limit: u32,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Unix timestamp when the window resets
    pub reset_at: i64,
    /// Seconds until the window resets (0 when admitted)
    pub retry_after: u64,
}

/// Proof that a request was counted; needed to give the slot back.
#[derive(Debug, Clone)]
pub struct Admission {
    pub key: String,
    pub window_start: DateTime<Utc>,
    pub info: RateLimitInfo,
}

/// Fixed-window limiter for one endpoint class.
pub struct RateLimiter {
    class: EndpointClass,
    policy: RateLimitPolicy,
    counters: DashMap<String, RateWindowCounter>,
}

impl RateLimiter {
    pub fn new(class: EndpointClass, policy: RateLimitPolicy) -> Self {
        Self {
            class,
            policy,
            counters: DashMap::new(),
        }
    }

    pub fn class(&self) -> EndpointClass {
        self.class
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Whether `path` bypasses this limiter entirely.
    pub fn skips(&self, path: &str) -> bool {
        self.policy
            .skip_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Count a request from `key`.
    pub fn admit(&self, key: &str) -> Result<Admission, RateLimitInfo> {
        self.admit_at(key, Utc::now())
    }

    /// Count a request from `key` at `now`.
    ///
    /// Returns `Ok` with the remaining budget if admitted, `Err` with retry
    /// information once the window's budget is spent.
    pub fn admit_at(&self, key: &str, now: DateTime<Utc>) -> Result<Admission, RateLimitInfo> {
        let window = self.policy.window();

        let (count, window_start) = match self.counters.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => {
                let counter = entry.get_mut();
                let count = counter.hit(window, now);
                (count, counter.window_start)
            }
            Entry::Vacant(entry) => {
                entry.insert(RateWindowCounter::open(key, now));
                (1, now)
            }
        };

        let reset = window_start + window;
        let info = RateLimitInfo {
            limit: self.policy.max_requests,
            remaining: self.policy.max_requests.saturating_sub(count),
            reset_at: reset.timestamp(),
            retry_after: 0,
        };

        if count > self.policy.max_requests {
            let millis = (reset - now).num_milliseconds().max(0) as u64;
            Err(RateLimitInfo {
                retry_after: millis.div_ceil(1000),
                ..info
            })
        } else {
            Ok(Admission {
                key: key.to_owned(),
                window_start,
                info,
            })
        }
    }

    /// Give back the slot taken by `admission`.
    ///
    /// Best-effort: if the window rolled over since admission the new window
    /// never counted this request and nothing changes.
    pub fn rollback(&self, admission: &Admission) {
        if let Some(mut counter) = self.counters.get_mut(&admission.key) {
            if counter.window_start == admission.window_start {
                counter.count = counter.count.saturating_sub(1);
            }
        }
    }

    /// Current status for `key` without consuming a request.
    pub fn status_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitInfo {
        let window = self.policy.window();
        let max = self.policy.max_requests;

        match self.counters.get(key) {
            Some(counter) if !counter.is_elapsed(window, now) => RateLimitInfo {
                limit: max,
                remaining: max.saturating_sub(counter.count),
                reset_at: counter.resets_at(window).timestamp(),
                retry_after: 0,
            },
            _ => RateLimitInfo {
                limit: max,
                remaining: max,
                reset_at: (now + window).timestamp(),
                retry_after: 0,
            },
        }
    }

    /// Drop counters whose window has elapsed at `now`.
    pub fn purge_at(&self, now: DateTime<Utc>) -> usize {
        let window = self.policy.window();
        let mut removed = 0;
        self.counters.retain(|_, counter| {
            let keep = !counter.is_elapsed(window, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of live counters.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

/// The configured limiter table, one limiter per endpoint class.
pub struct RateLimiters {
    pub general: RateLimiter,
    pub auth: RateLimiter,
    pub search: RateLimiter,
    pub payment: RateLimiter,
}

impl RateLimiters {
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self {
            general: RateLimiter::new(EndpointClass::General, settings.general.clone()),
            auth: RateLimiter::new(EndpointClass::Auth, settings.auth.clone()),
            search: RateLimiter::new(EndpointClass::Search, settings.search.clone()),
            payment: RateLimiter::new(EndpointClass::Payment, settings.payment.clone()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateLimiter> {
        [&self.general, &self.auth, &self.search, &self.payment].into_iter()
    }

    /// Limiters guarding `path`, general first, skip rules not applied.
    pub fn guarding<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a RateLimiter> + 'a {
        self.iter().filter(move |limiter| limiter.policy.guards(path))
    }
}

impl Sweepable for RateLimiters {
    fn sweep_target(&self) -> &'static str {
        "rate_counters"
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.iter().map(|limiter| limiter.purge_at(now)).sum()
    }
}
