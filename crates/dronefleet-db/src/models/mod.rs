//! Database models for persistent storage.

mod drone;
mod medication;
mod sequence;

pub use drone::*;
pub use medication::*;
pub use sequence::*;
