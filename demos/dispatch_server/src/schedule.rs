//! Tokio-backed scheduler for the fleet sweep

use dronefleet_hub::{Scheduler, SweepJob};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tracing::error;

/// Runs sweep jobs on a tokio runtime
///
/// Jobs execute on the blocking pool. A run that overlaps the next tick
/// delays it; missed ticks are skipped rather than replayed.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime of the calling task
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn every(&self, interval: Duration, job: SweepJob) {
        self.handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; start one period from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let job = Arc::clone(&job);
                if let Err(err) = tokio::task::spawn_blocking(move || job()).await {
                    error!(error = %err, "sweep job panicked");
                }
            }
        });
    }
}
