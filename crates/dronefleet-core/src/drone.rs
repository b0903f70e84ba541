//! Drone records and registration input

use crate::{DroneId, DroneState, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for any drone's weight limit, in grams
pub const MAX_WEIGHT_LIMIT: u32 = 1000;

/// Longest accepted serial number
const MAX_SERIAL_LEN: usize = 100;

/// Airframe class; each carries a default weight limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneModel {
    Lightweight,
    Middleweight,
    Cruiserweight,
    Heavyweight,
}

impl DroneModel {
    /// Weight limit in grams used when registration omits one
    pub fn default_weight_limit(self) -> u32 {
        match self {
            DroneModel::Lightweight => 100,
            DroneModel::Middleweight => 250,
            DroneModel::Cruiserweight => 500,
            DroneModel::Heavyweight => 1000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DroneModel::Lightweight => "LIGHTWEIGHT",
            DroneModel::Middleweight => "MIDDLEWEIGHT",
            DroneModel::Cruiserweight => "CRUISERWEIGHT",
            DroneModel::Heavyweight => "HEAVYWEIGHT",
        }
    }
}

impl fmt::Display for DroneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroneModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [
            DroneModel::Lightweight,
            DroneModel::Middleweight,
            DroneModel::Cruiserweight,
            DroneModel::Heavyweight,
        ]
        .into_iter()
        .find(|model| model.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| Error::validation("model", format!("unknown drone model `{s}`")))
    }
}

/// A registered drone
///
/// The drone does not store its cargo. The medications it carries are the
/// ones whose `drone_id` points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drone {
    pub id: DroneId,
    pub serial_number: String,
    pub model: DroneModel,
    /// Maximum total cargo weight in grams
    pub weight_limit: u32,
    /// Remaining battery in percent, always within `0..=100`
    pub battery_capacity: u8,
    pub state: DroneState,
}

impl Drone {
    /// Loading is only accepted while idle or already loading
    pub fn can_be_loaded(&self) -> bool {
        self.state.is_loadable()
    }

    /// Check whether `additional` grams fit on top of `current_load`
    pub fn can_carry(&self, current_load: u32, additional: u32) -> bool {
        current_load.saturating_add(additional) <= self.weight_limit
    }
}

/// Input for registering a drone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneRegistration {
    pub serial_number: String,
    pub model: DroneModel,
    /// Defaults to the model's weight limit
    #[serde(default)]
    pub weight_limit: Option<u32>,
    pub battery_capacity: u8,
    /// Defaults to `IDLE`
    #[serde(default)]
    pub state: Option<DroneState>,
}

impl DroneRegistration {
    /// Registration with model defaults and an idle state
    pub fn new(serial_number: impl Into<String>, model: DroneModel, battery_capacity: u8) -> Self {
        Self {
            serial_number: serial_number.into(),
            model,
            weight_limit: None,
            battery_capacity,
            state: None,
        }
    }

    pub fn with_weight_limit(mut self, weight_limit: u32) -> Self {
        self.weight_limit = Some(weight_limit);
        self
    }

    pub fn with_state(mut self, state: DroneState) -> Self {
        self.state = Some(state);
        self
    }

    /// Check field constraints
    pub fn validate(&self) -> Result<()> {
        let serial_len = self.serial_number.chars().count();
        if serial_len == 0 || serial_len > MAX_SERIAL_LEN {
            return Err(Error::validation(
                "serial_number",
                format!("must be between 1 and {MAX_SERIAL_LEN} characters"),
            ));
        }
        if self.effective_weight_limit() > MAX_WEIGHT_LIMIT {
            return Err(Error::validation(
                "weight_limit",
                format!("cannot exceed {MAX_WEIGHT_LIMIT}g"),
            ));
        }
        if self.battery_capacity > 100 {
            return Err(Error::validation("battery_capacity", "cannot exceed 100%"));
        }
        Ok(())
    }

    /// Weight limit after applying the model default
    pub fn effective_weight_limit(&self) -> u32 {
        self.weight_limit
            .unwrap_or_else(|| self.model.default_weight_limit())
    }

    /// Validate and build the drone record under the given id
    pub fn into_drone(self, id: DroneId) -> Result<Drone> {
        self.validate()?;
        let weight_limit = self.effective_weight_limit();
        Ok(Drone {
            id,
            serial_number: self.serial_number,
            model: self.model,
            weight_limit,
            battery_capacity: self.battery_capacity,
            state: self.state.unwrap_or_default(),
        })
    }
}

/// A drone together with its derived current load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneView {
    #[serde(flatten)]
    pub drone: Drone,
    /// Sum of the weights of all medications assigned to the drone
    pub current_load: u32,
}
