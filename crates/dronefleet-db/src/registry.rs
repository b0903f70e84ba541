//! Registry trait implementations backed by the store.

use crate::store::Store;
use dronefleet_core::{
    Drone, DroneId, DroneRegistration, DroneRegistry, DroneState, Medication, MedicationId,
    MedicationRegistry, NewMedication, Result,
};

impl DroneRegistry for Store {
    fn insert_drone(&self, registration: DroneRegistration) -> Result<Drone> {
        Ok(Store::insert_drone(self, registration)?)
    }

    fn drone(&self, id: DroneId) -> Result<Option<Drone>> {
        Ok(self.load_drone(id)?)
    }

    fn drone_by_serial(&self, serial_number: &str) -> Result<Option<Drone>> {
        Ok(self.load_drone_by_serial(serial_number)?)
    }

    fn save_drone(&self, drone: &Drone) -> Result<()> {
        Ok(self.update_drone(drone)?)
    }

    fn all_drones(&self) -> Result<Vec<Drone>> {
        Ok(self.load_all_drones()?)
    }

    fn drones_in_state(&self, state: DroneState) -> Result<Vec<Drone>> {
        Ok(self.drones_by_state(state)?)
    }

    fn available_drones(&self, min_battery: u8) -> Result<Vec<Drone>> {
        Ok(self.idle_drones_with_battery(min_battery)?)
    }

    fn low_battery_drones(&self, threshold: u8) -> Result<Vec<Drone>> {
        Ok(self.drones_below_battery(threshold)?)
    }
}

impl MedicationRegistry for Store {
    fn insert_medication(&self, medication: NewMedication) -> Result<Medication> {
        Ok(Store::insert_medication(self, medication)?)
    }

    fn medication(&self, id: MedicationId) -> Result<Option<Medication>> {
        Ok(self.load_medication(id)?)
    }

    fn medication_by_code(&self, code: &str) -> Result<Option<Medication>> {
        Ok(self.load_medication_by_code(code)?)
    }

    fn save_medication(&self, medication: &Medication) -> Result<()> {
        Ok(self.update_medication(medication)?)
    }

    fn remove_medication(&self, id: MedicationId) -> Result<bool> {
        Ok(self.delete_medication(id)?)
    }

    fn all_medications(&self) -> Result<Vec<Medication>> {
        Ok(self.load_all_medications()?)
    }

    fn medications_for_drone(&self, drone: DroneId) -> Result<Vec<Medication>> {
        Ok(self.medications_by_drone(drone)?)
    }
}
