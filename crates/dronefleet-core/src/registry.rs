//! Registry traits - the persistence seam
//!
//! Coordinators only talk to storage through these traits. Implementations
//! must assign ids, keep `serial_number` and medication `code` unique, and
//! be safe to share between threads.

use crate::{
    Drone, DroneId, DroneRegistration, DroneState, Medication, MedicationId, NewMedication, Result,
};

/// Storage for drones
pub trait DroneRegistry: Send + Sync {
    /// Validate, assign an id and store a new drone
    ///
    /// Fails with `Duplicate { field: "serial_number" }` when the serial
    /// number is taken.
    fn insert_drone(&self, registration: DroneRegistration) -> Result<Drone>;

    /// Look up a drone by id
    fn drone(&self, id: DroneId) -> Result<Option<Drone>>;

    /// Look up a drone by serial number
    fn drone_by_serial(&self, serial_number: &str) -> Result<Option<Drone>>;

    /// Overwrite a stored drone
    fn save_drone(&self, drone: &Drone) -> Result<()>;

    /// All drones, in id order
    fn all_drones(&self) -> Result<Vec<Drone>>;

    /// Drones currently in `state`
    fn drones_in_state(&self, state: DroneState) -> Result<Vec<Drone>> {
        Ok(self
            .all_drones()?
            .into_iter()
            .filter(|d| d.state == state)
            .collect())
    }

    /// Idle drones with at least `min_battery` percent left
    fn available_drones(&self, min_battery: u8) -> Result<Vec<Drone>> {
        Ok(self
            .drones_in_state(DroneState::Idle)?
            .into_iter()
            .filter(|d| d.battery_capacity >= min_battery)
            .collect())
    }

    /// Drones with battery strictly below `threshold`
    fn low_battery_drones(&self, threshold: u8) -> Result<Vec<Drone>> {
        Ok(self
            .all_drones()?
            .into_iter()
            .filter(|d| d.battery_capacity < threshold)
            .collect())
    }
}

/// Storage for medications
pub trait MedicationRegistry: Send + Sync {
    /// Validate, assign an id and store a new medication
    ///
    /// Fails with `Duplicate { field: "code" }` when the code is taken.
    fn insert_medication(&self, medication: NewMedication) -> Result<Medication>;

    /// Look up a medication by id
    fn medication(&self, id: MedicationId) -> Result<Option<Medication>>;

    /// Look up a medication by its unique code
    fn medication_by_code(&self, code: &str) -> Result<Option<Medication>>;

    /// Overwrite a stored medication, keeping `code` unique
    fn save_medication(&self, medication: &Medication) -> Result<()>;

    /// Remove a medication; returns whether it existed
    fn remove_medication(&self, id: MedicationId) -> Result<bool>;

    /// All medications, in id order
    fn all_medications(&self) -> Result<Vec<Medication>>;

    /// Medications whose `drone_id` is `drone`
    fn medications_for_drone(&self, drone: DroneId) -> Result<Vec<Medication>> {
        Ok(self
            .all_medications()?
            .into_iter()
            .filter(|m| m.is_assigned_to(drone))
            .collect())
    }

    /// Resolve the given ids, silently skipping the ones that do not exist
    fn medications_by_ids(&self, ids: &[MedicationId]) -> Result<Vec<Medication>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(medication) = self.medication(*id)? {
                found.push(medication);
            }
        }
        Ok(found)
    }
}

/// Sum of the weights of the medications assigned to `drone`
pub fn current_load<R: MedicationRegistry + ?Sized>(registry: &R, drone: DroneId) -> Result<u32> {
    Ok(registry
        .medications_for_drone(drone)?
        .iter()
        .fold(0u32, |load, m| load.saturating_add(m.weight)))
}
