//! Contract for state that expires on its own and is reclaimed periodically.

use chrono::{DateTime, Utc};

/// In-memory state with entries that expire and must be reclaimed by a
/// background pass. Implementations remove every entry that is dead at `now`
/// in a single pass and report how many were removed.
pub trait Sweepable: Send + Sync + 'static {
    /// Label used in logs and metrics.
    fn sweep_target(&self) -> &'static str;

    /// Drop entries that are dead at `now`.
    fn sweep(&self, now: DateTime<Utc>) -> usize;
}
