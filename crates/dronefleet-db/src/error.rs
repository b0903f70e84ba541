//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be turned back into a domain record.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Unique index violation.
    #[error("Duplicate {field}: {value}")]
    DuplicateKey { field: &'static str, value: String },

    /// Domain validation failed before anything was written.
    #[error(transparent)]
    Domain(#[from] dronefleet_core::Error),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<Error> for dronefleet_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::DuplicateKey { field, value } => dronefleet_core::Error::Duplicate { field, value },
            Error::Domain(inner) => inner,
            other => dronefleet_core::Error::Storage(other.to_string()),
        }
    }
}
