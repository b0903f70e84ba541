//! Periodic fleet sweep
//!
//! Two jobs run on a timer: a battery audit that warns about drones below
//! the low-battery threshold, and an auto-advance that completes
//! `DELIVERING -> DELIVERED` and `RETURNING -> IDLE`. The timer itself is
//! whatever [`Scheduler`] the host provides.

use crate::error::Result;
use crate::hub::{FleetHub, FleetRegistry};
use dronefleet_core::{Drone, DroneId, DroneState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A job handed to a [`Scheduler`]
pub type SweepJob = Arc<dyn Fn() + Send + Sync>;

/// Runs jobs at a fixed interval
pub trait Scheduler {
    /// Call `job` every `interval` until the host shuts down
    fn every(&self, interval: Duration, job: SweepJob);
}

/// Outcome of one auto-advance pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Drones moved `DELIVERING -> DELIVERED`
    pub delivered: Vec<DroneId>,
    /// Drones moved `RETURNING -> IDLE`
    pub returned: Vec<DroneId>,
    /// Drones whose state changed before their lock was taken
    pub skipped: Vec<DroneId>,
    /// Drones whose advance failed; retried on the next pass only
    pub failed: Vec<DroneId>,
}

impl SweepReport {
    pub fn advanced(&self) -> usize {
        self.delivered.len() + self.returned.len()
    }
}

/// The fleet's periodic jobs
pub struct FleetSweep<R> {
    hub: Arc<FleetHub<R>>,
}

impl<R: FleetRegistry + 'static> FleetSweep<R> {
    pub fn new(hub: Arc<FleetHub<R>>) -> Self {
        Self { hub }
    }

    /// Warn about every drone below the low-battery threshold
    pub fn audit_battery(&self) -> Result<Vec<Drone>> {
        let threshold = self.hub.config().low_battery_threshold();
        let low = self.hub.registry().low_battery_drones(threshold)?;
        for drone in &low {
            warn!(
                drone = %drone.id,
                serial = %drone.serial_number,
                battery = drone.battery_capacity,
                threshold,
                "drone battery low"
            );
        }
        debug!(threshold, low = low.len(), "battery audit finished");
        Ok(low)
    }

    /// Advance delivering and returning drones one step
    pub fn advance_states(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        self.advance(
            DroneState::Delivering,
            DroneState::Delivered,
            &mut report,
            |r| &mut r.delivered,
        )?;
        self.advance(
            DroneState::Returning,
            DroneState::Idle,
            &mut report,
            |r| &mut r.returned,
        )?;
        if report.advanced() > 0 {
            info!(
                delivered = report.delivered.len(),
                returned = report.returned.len(),
                "auto-advanced drone states"
            );
        }
        Ok(report)
    }

    fn advance(
        &self,
        from: DroneState,
        to: DroneState,
        report: &mut SweepReport,
        bucket: fn(&mut SweepReport) -> &mut Vec<DroneId>,
    ) -> Result<()> {
        for drone in self.hub.registry().drones_in_state(from)? {
            match self.hub.advance_if(drone.id, from, to) {
                Ok(Some(_)) => bucket(report).push(drone.id),
                Ok(None) => report.skipped.push(drone.id),
                Err(err) => {
                    error!(drone = %drone.id, from = %from, to = %to, error = %err, "auto-advance failed");
                    report.failed.push(drone.id);
                }
            }
        }
        Ok(())
    }

    /// Register both jobs with `scheduler` using the configured intervals
    pub fn schedule(self: &Arc<Self>, scheduler: &dyn Scheduler) {
        let config = self.hub.config();

        let sweep = Arc::clone(self);
        scheduler.every(
            config.battery_audit_interval(),
            Arc::new(move || {
                if let Err(err) = sweep.audit_battery() {
                    error!(error = %err, "battery audit failed");
                }
            }),
        );

        let sweep = Arc::clone(self);
        scheduler.every(
            config.auto_transition_interval(),
            Arc::new(move || {
                if let Err(err) = sweep.advance_states() {
                    error!(error = %err, "auto-advance sweep failed");
                }
            }),
        );
    }
}
