//! Fleet state machine
//!
//! Pure functions: the caller loads the drone, applies a transition and
//! persists the returned record.

use crate::battery::apply_delivery_decrement;
use crate::{Drone, DroneState, Error, Result};

/// Move `drone` to `target` if the lifecycle allows it
///
/// Entering `DELIVERED` also applies the delivery battery decrement.
pub fn transition(mut drone: Drone, target: DroneState) -> Result<Drone> {
    if !drone.state.can_transition_to(target) {
        return Err(Error::InvalidTransition {
            from: drone.state,
            to: target,
        });
    }
    drone.state = target;
    if target == DroneState::Delivered {
        drone = apply_delivery_decrement(drone);
    }
    Ok(drone)
}

/// Like [`transition`], with the target given by name
pub fn transition_by_name(drone: Drone, target: &str) -> Result<Drone> {
    let target: DroneState = target.parse()?;
    transition(drone, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DroneId, DroneModel, DroneRegistration};

    const EDGES: [(DroneState, DroneState); 8] = [
        (DroneState::Idle, DroneState::Loading),
        (DroneState::Loading, DroneState::Loaded),
        (DroneState::Loading, DroneState::Idle),
        (DroneState::Loaded, DroneState::Delivering),
        (DroneState::Loaded, DroneState::Idle),
        (DroneState::Delivering, DroneState::Delivered),
        (DroneState::Delivered, DroneState::Returning),
        (DroneState::Returning, DroneState::Idle),
    ];

    fn drone_in(state: DroneState, battery: u8) -> Drone {
        DroneRegistration::new("SN-T", DroneModel::Cruiserweight, battery)
            .with_state(state)
            .into_drone(DroneId::new(1))
            .unwrap()
    }

    #[test]
    fn test_all_pairs() {
        let mut checked = 0;
        for from in DroneState::ALL {
            for to in DroneState::ALL {
                let legal = EDGES.contains(&(from, to));
                let result = transition(drone_in(from, 50), to);
                match result {
                    Ok(drone) => {
                        assert!(legal, "{from} -> {to} should be rejected");
                        assert_eq!(drone.state, to);
                    }
                    Err(err) => {
                        assert!(!legal, "{from} -> {to} should be accepted");
                        assert_eq!(err, Error::InvalidTransition { from, to });
                    }
                }
                checked += 1;
            }
        }
        assert_eq!(checked, 36);
    }

    #[test]
    fn test_delivered_costs_battery() {
        let drone = transition(drone_in(DroneState::Delivering, 50), DroneState::Delivered).unwrap();
        assert_eq!(drone.battery_capacity, 40);

        let drone = transition(drone_in(DroneState::Delivering, 4), DroneState::Delivered).unwrap();
        assert_eq!(drone.battery_capacity, 0);
    }

    #[test]
    fn test_other_transitions_keep_battery() {
        for (from, to) in EDGES.into_iter().filter(|(_, to)| *to != DroneState::Delivered) {
            let drone = transition(drone_in(from, 50), to).unwrap();
            assert_eq!(drone.battery_capacity, 50, "{from} -> {to}");
        }
    }

    #[test]
    fn test_rejected_transition_costs_nothing() {
        let err = transition(drone_in(DroneState::Idle, 50), DroneState::Delivered).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTransition {
                from: DroneState::Idle,
                to: DroneState::Delivered
            }
        );
    }

    #[test]
    fn test_transition_by_name() {
        let drone = transition_by_name(drone_in(DroneState::Loaded, 50), "delivering").unwrap();
        assert_eq!(drone.state, DroneState::Delivering);

        let err = transition_by_name(drone_in(DroneState::Loaded, 50), "teleporting").unwrap_err();
        assert_eq!(err, Error::UnknownState("teleporting".to_string()));
    }
}
