//! Dronefleet Hub - Fleet operations over a shared registry
//!
//! This crate is the coordination layer between a boundary (HTTP, CLI, tests)
//! and the storage behind the dronefleet-core registry traits.
//!
//! ## Architecture
//!
//! ```text
//! FleetHub (owns registry handle + config)
//!  │
//!  ├── KeyedLocks ← one mutex per drone and per medication
//!  │
//!  ├── load_drone ← check-then-assign under the drone's and the batch's locks
//!  │
//!  └── FleetSweep ← battery audit + auto-advance, driven by a Scheduler
//! ```
//!
//! ## Key Components
//!
//! - [`FleetHub`]: Drone registration, lookups, state updates, medication CRUD
//!   and loading
//! - [`FleetSweep`]: Periodic jobs; the host supplies the timer through
//!   [`Scheduler`]
//! - [`FleetConfig`]: Battery thresholds, sweep intervals and the
//!   [`LoadFailurePolicy`]
//!
//! ## Design Principles
//!
//! 1. **Storage is a trait** - the hub runs on any `DroneRegistry + MedicationRegistry`
//! 2. **Per-record serialization** - unrelated drones and medications never wait
//!    for each other
//! 3. **Typed failures** - boundaries map [`ErrorKind`], never message text

mod config;
mod error;
mod hub;
mod loading;
mod locks;
mod sweep;

pub use config::{FleetConfig, LoadFailurePolicy};
pub use error::{DroneLookup, Error, ErrorKind, MedicationLookup, Result};
pub use hub::{FleetHub, FleetRegistry};
pub use locks::KeyedLocks;
pub use sweep::{FleetSweep, Scheduler, SweepJob, SweepReport};
