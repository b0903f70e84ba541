//! Common query patterns for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use dronefleet_core::{Drone, DroneId, DroneState, Medication};

impl Store {
    /// Get all drones in a lifecycle state.
    pub fn drones_by_state(&self, state: DroneState) -> Result<Vec<Drone>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredDrone>(StoredDroneKey::state)?;
        let iter = scan.start_with(state.as_str())?;
        let drones: std::result::Result<Vec<StoredDrone>, _> = iter.collect();
        let drones = drones.map_err(|e| Error::Database(e.to_string()))?;
        // State names are not prefixes of each other, but keep the match exact.
        drones
            .iter()
            .filter(|d| d.state == state.as_str())
            .map(StoredDrone::to_drone)
            .collect()
    }

    /// Idle drones with at least `min_battery` percent left.
    pub fn idle_drones_with_battery(&self, min_battery: u8) -> Result<Vec<Drone>> {
        Ok(self
            .drones_by_state(DroneState::Idle)?
            .into_iter()
            .filter(|d| d.battery_capacity >= min_battery)
            .collect())
    }

    /// Drones whose battery is strictly below `threshold`.
    pub fn drones_below_battery(&self, threshold: u8) -> Result<Vec<Drone>> {
        Ok(self
            .load_all_drones()?
            .into_iter()
            .filter(|d| d.battery_capacity < threshold)
            .collect())
    }

    /// Get the medications assigned to a drone.
    pub fn medications_by_drone(&self, drone: DroneId) -> Result<Vec<Medication>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredMedication>()?;
        let iter = scan.all()?;
        let all: std::result::Result<Vec<StoredMedication>, _> = iter.collect();
        let all = all.map_err(|e| Error::Database(e.to_string()))?;
        Ok(all
            .into_iter()
            .filter(|m| m.drone_id == Some(drone.raw()))
            .map(|m| m.to_medication())
            .collect())
    }
}
