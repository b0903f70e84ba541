//! Request errors and their HTTP statuses

use dronefleet_hub::ErrorKind;
use hyper::StatusCode;
use thiserror::Error;

/// Message returned for failures whose detail must stay server-side
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Errors raised while serving a request
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the fleet
    #[error(transparent)]
    Fleet(#[from] dronefleet_hub::Error),

    /// Body is not the expected JSON
    #[error("Malformed request body: {0}")]
    Body(String),

    /// Path or query parameter that does not parse
    #[error("Invalid {field}: {message}")]
    Param {
        field: &'static str,
        message: String,
    },

    #[error("No route for {method} {path}")]
    NoRoute { method: String, path: String },

    /// Failure inside the server itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Fleet(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::InvalidDroneState
                | ErrorKind::LowBattery
                | ErrorKind::DroneOverloaded
                | ErrorKind::UnknownState
                | ErrorKind::InvalidTransition
                | ErrorKind::Validation => StatusCode::BAD_REQUEST,
            },
            ApiError::Body(_) | ApiError::Param { .. } => StatusCode::BAD_REQUEST,
            ApiError::NoRoute { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Validation failure on a request field
pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> ApiError {
    ApiError::Fleet(dronefleet_core::Error::validation(field, message).into())
}
