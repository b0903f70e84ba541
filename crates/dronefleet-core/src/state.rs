//! Drone lifecycle states and the transition table

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a drone
///
/// The lifecycle is cyclic: there is no terminal state, every drone
/// eventually returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Delivering,
    Delivered,
    Returning,
}

impl DroneState {
    /// Every state, in lifecycle order
    pub const ALL: [DroneState; 6] = [
        DroneState::Idle,
        DroneState::Loading,
        DroneState::Loaded,
        DroneState::Delivering,
        DroneState::Delivered,
        DroneState::Returning,
    ];

    /// States reachable from `self` in a single transition
    pub fn allowed_targets(self) -> &'static [DroneState] {
        use DroneState::*;
        match self {
            Idle => &[Loading],
            Loading => &[Loaded, Idle],
            Loaded => &[Delivering, Idle],
            Delivering => &[Delivered],
            Delivered => &[Returning],
            Returning => &[Idle],
        }
    }

    /// Check whether `(self, target)` is an edge of the lifecycle
    pub fn can_transition_to(self, target: DroneState) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Loading is accepted while idle or already loading
    pub fn is_loadable(self) -> bool {
        matches!(self, DroneState::Idle | DroneState::Loading)
    }

    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            DroneState::Idle => "IDLE",
            DroneState::Loading => "LOADING",
            DroneState::Loaded => "LOADED",
            DroneState::Delivering => "DELIVERING",
            DroneState::Delivered => "DELIVERED",
            DroneState::Returning => "RETURNING",
        }
    }
}

impl fmt::Display for DroneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroneState {
    type Err = Error;

    /// Parse a state name, ignoring case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        DroneState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownState(s.to_string()))
    }
}
