//! Dronefleet Core - Domain model for a medication delivery fleet
//!
//! This crate provides the pure, storage-agnostic parts of the fleet:
//! - Identifiers (`DroneId`, `MedicationId`)
//! - Drone and medication records plus their input validation
//! - The drone lifecycle state machine and its transition table
//! - Battery accounting applied on delivery
//! - Registry traits that persistence layers implement
//!
//! ## Lifecycle
//!
//! ```text
//! IDLE ──► LOADING ──► LOADED ──► DELIVERING ──► DELIVERED ──► RETURNING
//!  ▲          │           │                                        │
//!  └──────────┴───────────┴────────────────────────────────────────┘
//! ```
//!
//! Entering `DELIVERED` costs the drone a fixed amount of battery, applied
//! inside [`transition`] so no caller can skip it.
//!
//! ## Relations
//!
//! A medication holds a weak `drone_id`; a drone's cargo is always derived by
//! asking the [`MedicationRegistry`] for medications pointing at it.

pub mod battery;
mod drone;
mod error;
mod identity;
mod medication;
mod memory;
mod registry;
mod state;
mod transition;

pub use battery::{apply_delivery_decrement, DELIVERY_BATTERY_COST};
pub use drone::{Drone, DroneModel, DroneRegistration, DroneView, MAX_WEIGHT_LIMIT};
pub use error::{Error, Result};
pub use identity::{DroneId, MedicationId};
pub use medication::{Medication, MedicationUpdate, NewMedication};
pub use memory::MemoryRegistry;
pub use registry::{current_load, DroneRegistry, MedicationRegistry};
pub use state::DroneState;
pub use transition::{transition, transition_by_name};
