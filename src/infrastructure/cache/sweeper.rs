//! Background Maintenance Sweeper
//!
//! Runs [`Sweepable::sweep`] on a fixed period in a dedicated tokio task.
//! The task is owned by a [`SweeperHandle`]: calling
//! [`SweeperHandle::shutdown`] stops it and waits for it to finish, and
//! dropping the handle stops it at the next wakeup.
//!
//! A panicking sweep pass is caught, logged and counted; the task keeps
//! running and no request ever observes the failure.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::Sweepable;
use crate::infrastructure::metrics;

/// Owner of a running sweeper task.
pub struct SweeperHandle {
    target: &'static str,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Label of the swept state.
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the sweeper and wait for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(target_state = self.target, error = %e, "Sweeper task ended abnormally");
        }
        tracing::debug!(target_state = self.target, "Sweeper stopped");
    }
}

/// Spawn a task sweeping `state` every `period`. The first pass runs one
/// full period after spawning.
pub fn spawn_sweeper<T: Sweepable>(state: Arc<T>, period: Duration) -> SweeperHandle {
    let target = state.sweep_target();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                // Fires on explicit stop and when the handle is dropped
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    run_sweep(state.as_ref());
                }
            }
        }
    });

    tracing::debug!(target_state = target, period_secs = period.as_secs(), "Sweeper started");

    SweeperHandle {
        target,
        stop_tx: Some(stop_tx),
        task,
    }
}

/// Run one sweep pass, containing any panic.
///
/// Returns the number of removed entries, or `None` if the pass failed.
pub fn run_sweep<T: Sweepable + ?Sized>(state: &T) -> Option<usize> {
    let target = state.sweep_target();

    let outcome = catch_unwind(AssertUnwindSafe(|| state.sweep(Utc::now())));
    match outcome {
        Ok(removed) => {
            tracing::debug!(target_state = target, removed, "Sweep completed");
            metrics::record_sweep(target, Some(removed));
            Some(removed)
        }
        Err(_) => {
            tracing::error!(target_state = target, "Sweep pass panicked");
            metrics::record_sweep(target, None);
            None
        }
    }
}
