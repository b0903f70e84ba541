//! Dronefleet DB - Registry layer using native_db
//!
//! Provides persistent storage for:
//! - Drones, with a unique index on serial number and an index on state
//! - Medications, with a unique index on code
//! - Id sequences for both record sets
//!
//! [`Store`] implements the `DroneRegistry` and `MedicationRegistry` traits
//! from dronefleet-core.

mod error;
mod models;
mod queries;
mod registry;
mod store;

pub use error::{Error, Result};
pub use store::Store;
