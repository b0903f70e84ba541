//! Drone model for database storage.

use crate::error::{Error, Result};
use dronefleet_core::{Drone, DroneId, DroneModel, DroneState};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored drone row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredDrone {
    /// Primary key - drone ID.
    #[primary_key]
    pub id: u64,
    /// Globally unique serial number.
    #[secondary_key(unique)]
    pub serial_number: String,
    /// Lifecycle state name (e.g. "IDLE").
    #[secondary_key]
    pub state: String,
    /// Model name (e.g. "HEAVYWEIGHT").
    pub model: String,
    /// Weight limit in grams.
    pub weight_limit: u32,
    /// Battery in percent.
    pub battery_capacity: u8,
}

impl StoredDrone {
    /// Create from a domain drone.
    pub fn from_drone(drone: &Drone) -> Self {
        Self {
            id: drone.id.raw(),
            serial_number: drone.serial_number.clone(),
            state: drone.state.as_str().to_string(),
            model: drone.model.as_str().to_string(),
            weight_limit: drone.weight_limit,
            battery_capacity: drone.battery_capacity,
        }
    }

    /// Convert to a domain drone.
    pub fn to_drone(&self) -> Result<Drone> {
        let state: DroneState = self
            .state
            .parse()
            .map_err(|_| Error::Serialization(format!("drone {} has state `{}`", self.id, self.state)))?;
        let model: DroneModel = self
            .model
            .parse()
            .map_err(|_| Error::Serialization(format!("drone {} has model `{}`", self.id, self.model)))?;
        Ok(Drone {
            id: DroneId::new(self.id),
            serial_number: self.serial_number.clone(),
            model,
            weight_limit: self.weight_limit,
            battery_capacity: self.battery_capacity,
            state,
        })
    }
}
