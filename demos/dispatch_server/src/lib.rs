//! Dispatch server - HTTP/JSON boundary for a drone fleet
//!
//! - [`Route`] matches `/api/drones` and `/api/medications` endpoints
//! - [`Api`] runs them against a [`FleetHub`](dronefleet_hub::FleetHub)
//!   and maps failures to statuses with a `{message, timestamp}` body
//! - [`TokioScheduler`] drives the fleet sweep
//! - [`ServerConfig`] is read from RON

pub mod api;
pub mod config;
pub mod dto;
pub mod error;
pub mod router;
pub mod schedule;

pub use api::{Api, Reply};
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use router::Route;
pub use schedule::TokioScheduler;
