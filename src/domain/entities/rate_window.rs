//! Fixed-window request counter.

use chrono::{DateTime, Duration, Utc};

/// Requests seen from one key in the current window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindowCounter {
    /// Counter key (ip, ip + user agent, or user id)
    pub key: String,

    /// When the current window opened
    pub window_start: DateTime<Utc>,

    /// Requests counted in the current window, rejected ones included
    pub count: u32,
}

impl RateWindowCounter {
    /// Open a window at `now` holding the request that created it.
    pub fn open(key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            window_start: now,
            count: 1,
        }
    }

    /// When the current window closes.
    pub fn resets_at(&self, window: Duration) -> DateTime<Utc> {
        self.window_start + window
    }

    /// The window has run its course once `now` is past its end.
    pub fn is_elapsed(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now > self.resets_at(window)
    }

    /// Count one more request at `now`, restarting the window if it elapsed.
    /// Returns the updated count.
    pub fn hit(&mut self, window: Duration, now: DateTime<Utc>) -> u32 {
        if self.is_elapsed(window, now) {
            self.window_start = now;
            self.count = 1;
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.count
    }
}
