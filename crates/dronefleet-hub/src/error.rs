//! Error types for dronefleet-hub
//!
//! Every domain failure is a typed, terminal outcome; nothing here is
//! retried. Boundaries should switch on [`Error::kind`] rather than on the
//! variants so storage details never leak into user-facing messages.

use dronefleet_core::{DroneId, DroneState, MedicationId};
use std::fmt;
use thiserror::Error;

/// Result type for dronefleet-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// How a drone was looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroneLookup {
    Id(DroneId),
    Serial(String),
}

impl fmt::Display for DroneLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneLookup::Id(id) => write!(f, "id: {}", id.raw()),
            DroneLookup::Serial(serial) => write!(f, "serial number: {}", serial),
        }
    }
}

/// How a medication was looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedicationLookup {
    Id(MedicationId),
    Code(String),
    /// Ids of a load request that did not resolve
    Missing(Vec<MedicationId>),
}

impl fmt::Display for MedicationLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicationLookup::Id(id) => write!(f, "id: {}", id.raw()),
            MedicationLookup::Code(code) => write!(f, "code: {}", code),
            MedicationLookup::Missing(ids) => {
                let ids: Vec<String> = ids.iter().map(|id| id.raw().to_string()).collect();
                write!(f, "ids: {}", ids.join(", "))
            }
        }
    }
}

/// Errors that can occur in dronefleet-hub
#[derive(Debug, Error)]
pub enum Error {
    /// Drone lookup failed
    #[error("Drone not found with {0}")]
    DroneNotFound(DroneLookup),

    /// Medication lookup failed
    #[error("Medication not found with {0}")]
    MedicationNotFound(MedicationLookup),

    /// Loading attempted outside `IDLE` / `LOADING`
    #[error("Drone {id} is {state}; loading requires IDLE or LOADING")]
    InvalidDroneState { id: DroneId, state: DroneState },

    /// Battery below the configured minimum
    #[error("Drone battery too low for loading: {battery}% (minimum {minimum}%)")]
    LowBattery { battery: u8, minimum: u8 },

    /// Requested cargo would exceed the drone's weight limit
    #[error(
        "Loading these medications would exceed the drone's weight limit. \
         Current load: {current}g, New medications: {incoming}g, Maximum capacity: {capacity}g"
    )]
    DroneOverloaded {
        current: u32,
        incoming: u32,
        capacity: u32,
    },

    /// Core error (state machine, validation, storage)
    #[error(transparent)]
    Core(#[from] dronefleet_core::Error),
}

/// Error taxonomy exposed to boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidDroneState,
    LowBattery,
    DroneOverloaded,
    UnknownState,
    InvalidTransition,
    Validation,
    Conflict,
    Internal,
}

impl Error {
    /// Classify this error for a boundary
    pub fn kind(&self) -> ErrorKind {
        use dronefleet_core::Error as Core;
        match self {
            Error::DroneNotFound(_) | Error::MedicationNotFound(_) => ErrorKind::NotFound,
            Error::InvalidDroneState { .. } => ErrorKind::InvalidDroneState,
            Error::LowBattery { .. } => ErrorKind::LowBattery,
            Error::DroneOverloaded { .. } => ErrorKind::DroneOverloaded,
            Error::Core(Core::UnknownState(_)) => ErrorKind::UnknownState,
            Error::Core(Core::InvalidTransition { .. }) => ErrorKind::InvalidTransition,
            Error::Core(Core::Validation { .. }) => ErrorKind::Validation,
            Error::Core(Core::Duplicate { .. }) => ErrorKind::Conflict,
            Error::Core(Core::Storage(_)) => ErrorKind::Internal,
        }
    }

    pub(crate) fn drone_not_found(id: DroneId) -> Self {
        Error::DroneNotFound(DroneLookup::Id(id))
    }
}

// Compile-time check that Error is Send + Sync for thread-safe error propagation.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
