//! Error types for dronefleet-core

use crate::DroneState;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid drone state: {0}")]
    UnknownState(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: DroneState, to: DroneState },

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Build a field-level validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
