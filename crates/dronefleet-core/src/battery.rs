//! Battery accounting

use crate::Drone;

/// Battery percentage consumed by one completed delivery
pub const DELIVERY_BATTERY_COST: u8 = 10;

/// Charge the drone for a completed delivery, never going below zero
pub fn apply_delivery_decrement(mut drone: Drone) -> Drone {
    drone.battery_capacity = drone.battery_capacity.saturating_sub(DELIVERY_BATTERY_COST);
    drone
}
