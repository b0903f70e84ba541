//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use dronefleet_core::{
    Drone, DroneId, DroneRegistration, Medication, MedicationId, NewMedication,
};
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredDrone>().unwrap();
    models.define::<StoredMedication>().unwrap();
    models.define::<StoredSequence>().unwrap();
    models
});

/// Database store for the fleet registries.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Register a drone, assigning the next drone id.
    pub fn insert_drone(&self, registration: DroneRegistration) -> Result<Drone> {
        registration.validate()?;
        let rw = self.db.rw_transaction()?;

        let taken: Option<StoredDrone> = rw
            .get()
            .secondary(StoredDroneKey::serial_number, registration.serial_number.clone())?;
        if taken.is_some() {
            return Err(Error::DuplicateKey {
                field: "serial_number",
                value: registration.serial_number,
            });
        }

        let sequence: Option<StoredSequence> = rw.get().primary(DRONE_SEQUENCE.to_string())?;
        let id = sequence.map(|s| s.last).unwrap_or(0) + 1;
        rw.upsert(StoredSequence {
            name: DRONE_SEQUENCE.to_string(),
            last: id,
        })?;

        let drone = registration.into_drone(DroneId::new(id))?;
        rw.insert(StoredDrone::from_drone(&drone))?;
        rw.commit()?;
        Ok(drone)
    }

    /// Load a drone by ID.
    pub fn load_drone(&self, id: DroneId) -> Result<Option<Drone>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredDrone> = r.get().primary(id.raw())?;
        stored.map(|s| s.to_drone()).transpose()
    }

    /// Load a drone by serial number.
    pub fn load_drone_by_serial(&self, serial_number: &str) -> Result<Option<Drone>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredDrone> = r
            .get()
            .secondary(StoredDroneKey::serial_number, serial_number.to_string())?;
        stored.map(|s| s.to_drone()).transpose()
    }

    /// Overwrite an existing drone.
    pub fn update_drone(&self, drone: &Drone) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let existing: Option<StoredDrone> = rw.get().primary(drone.id.raw())?;
        if existing.is_none() {
            return Err(Error::NotFound(drone.id.to_string()));
        }
        let owner: Option<StoredDrone> = rw
            .get()
            .secondary(StoredDroneKey::serial_number, drone.serial_number.clone())?;
        if owner.is_some_and(|o| o.id != drone.id.raw()) {
            return Err(Error::DuplicateKey {
                field: "serial_number",
                value: drone.serial_number.clone(),
            });
        }
        rw.upsert(StoredDrone::from_drone(drone))?;
        rw.commit()?;
        Ok(())
    }

    /// Load all drones.
    pub fn load_all_drones(&self) -> Result<Vec<Drone>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredDrone>()?;
        let iter = scan.all()?;
        let drones: std::result::Result<Vec<StoredDrone>, _> = iter.collect();
        let drones = drones.map_err(|e| Error::Database(e.to_string()))?;
        drones.iter().map(StoredDrone::to_drone).collect()
    }

    /// Create a medication, assigning the next medication id.
    pub fn insert_medication(&self, medication: NewMedication) -> Result<Medication> {
        medication.validate()?;
        let rw = self.db.rw_transaction()?;

        let taken: Option<StoredMedication> = rw
            .get()
            .secondary(StoredMedicationKey::code, medication.code.clone())?;
        if taken.is_some() {
            return Err(Error::DuplicateKey {
                field: "code",
                value: medication.code,
            });
        }

        let sequence: Option<StoredSequence> = rw.get().primary(MEDICATION_SEQUENCE.to_string())?;
        let id = sequence.map(|s| s.last).unwrap_or(0) + 1;
        rw.upsert(StoredSequence {
            name: MEDICATION_SEQUENCE.to_string(),
            last: id,
        })?;

        let medication = medication.into_medication(MedicationId::new(id))?;
        rw.insert(StoredMedication::from_medication(&medication))?;
        rw.commit()?;
        Ok(medication)
    }

    /// Load a medication by ID.
    pub fn load_medication(&self, id: MedicationId) -> Result<Option<Medication>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredMedication> = r.get().primary(id.raw())?;
        Ok(stored.map(|s| s.to_medication()))
    }

    /// Load a medication by code.
    pub fn load_medication_by_code(&self, code: &str) -> Result<Option<Medication>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredMedication> = r
            .get()
            .secondary(StoredMedicationKey::code, code.to_string())?;
        Ok(stored.map(|s| s.to_medication()))
    }

    /// Overwrite an existing medication.
    pub fn update_medication(&self, medication: &Medication) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let existing: Option<StoredMedication> = rw.get().primary(medication.id.raw())?;
        if existing.is_none() {
            return Err(Error::NotFound(medication.id.to_string()));
        }
        let owner: Option<StoredMedication> = rw
            .get()
            .secondary(StoredMedicationKey::code, medication.code.clone())?;
        if owner.is_some_and(|o| o.id != medication.id.raw()) {
            return Err(Error::DuplicateKey {
                field: "code",
                value: medication.code.clone(),
            });
        }
        rw.upsert(StoredMedication::from_medication(medication))?;
        rw.commit()?;
        Ok(())
    }

    /// Delete a medication; returns whether it existed.
    pub fn delete_medication(&self, id: MedicationId) -> Result<bool> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredMedication> = rw.get().primary(id.raw())?;
        let existed = stored.is_some();
        if let Some(s) = stored {
            rw.remove(s)?;
        }
        rw.commit()?;
        Ok(existed)
    }

    /// Load all medications.
    pub fn load_all_medications(&self) -> Result<Vec<Medication>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredMedication>()?;
        let iter = scan.all()?;
        let medications: std::result::Result<Vec<StoredMedication>, _> = iter.collect();
        let medications = medications.map_err(|e| Error::Database(e.to_string()))?;
        Ok(medications.into_iter().map(|m| m.to_medication()).collect())
    }
}
