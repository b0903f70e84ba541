//! In-memory registry

use crate::{
    Drone, DroneId, DroneRegistration, DroneRegistry, Error, Medication, MedicationId,
    MedicationRegistry, NewMedication, Result,
};
use indexmap::IndexMap;
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct Tables {
    drones: IndexMap<DroneId, Drone>,
    medications: IndexMap<MedicationId, Medication>,
    /// Index: serial number -> drone
    by_serial: IndexMap<String, DroneId>,
    /// Index: code -> medication
    by_code: IndexMap<String, MedicationId>,
    next_drone_id: u64,
    next_medication_id: u64,
}

/// Registry holding both record sets in process memory
///
/// Ids start at 1. Useful for tests and for running without a database.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    tables: RwLock<Tables>,
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl DroneRegistry for MemoryRegistry {
    fn insert_drone(&self, registration: DroneRegistration) -> Result<Drone> {
        registration.validate()?;
        let mut tables = self.tables.write();
        if tables.by_serial.contains_key(&registration.serial_number) {
            return Err(Error::Duplicate {
                field: "serial_number",
                value: registration.serial_number,
            });
        }
        tables.next_drone_id += 1;
        let drone = registration.into_drone(DroneId::new(tables.next_drone_id))?;
        tables.by_serial.insert(drone.serial_number.clone(), drone.id);
        tables.drones.insert(drone.id, drone.clone());
        Ok(drone)
    }

    fn drone(&self, id: DroneId) -> Result<Option<Drone>> {
        Ok(self.tables.read().drones.get(&id).cloned())
    }

    fn drone_by_serial(&self, serial_number: &str) -> Result<Option<Drone>> {
        let tables = self.tables.read();
        Ok(tables
            .by_serial
            .get(serial_number)
            .and_then(|id| tables.drones.get(id))
            .cloned())
    }

    fn save_drone(&self, drone: &Drone) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.drones.contains_key(&drone.id) {
            return Err(Error::Storage(format!("Record not found: {}", drone.id)));
        }
        if let Some(owner) = tables.by_serial.get(&drone.serial_number) {
            if *owner != drone.id {
                return Err(Error::Duplicate {
                    field: "serial_number",
                    value: drone.serial_number.clone(),
                });
            }
        }
        if let Some(previous) = tables.drones.insert(drone.id, drone.clone()) {
            tables.by_serial.shift_remove(&previous.serial_number);
        }
        tables.by_serial.insert(drone.serial_number.clone(), drone.id);
        Ok(())
    }

    fn all_drones(&self) -> Result<Vec<Drone>> {
        Ok(self.tables.read().drones.values().cloned().collect())
    }
}

impl MedicationRegistry for MemoryRegistry {
    fn insert_medication(&self, medication: NewMedication) -> Result<Medication> {
        medication.validate()?;
        let mut tables = self.tables.write();
        if tables.by_code.contains_key(&medication.code) {
            return Err(Error::Duplicate {
                field: "code",
                value: medication.code,
            });
        }
        tables.next_medication_id += 1;
        let medication = medication.into_medication(MedicationId::new(tables.next_medication_id))?;
        tables.by_code.insert(medication.code.clone(), medication.id);
        tables.medications.insert(medication.id, medication.clone());
        Ok(medication)
    }

    fn medication(&self, id: MedicationId) -> Result<Option<Medication>> {
        Ok(self.tables.read().medications.get(&id).cloned())
    }

    fn medication_by_code(&self, code: &str) -> Result<Option<Medication>> {
        let tables = self.tables.read();
        Ok(tables
            .by_code
            .get(code)
            .and_then(|id| tables.medications.get(id))
            .cloned())
    }

    fn save_medication(&self, medication: &Medication) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.medications.contains_key(&medication.id) {
            return Err(Error::Storage(format!("Record not found: {}", medication.id)));
        }
        if let Some(owner) = tables.by_code.get(&medication.code) {
            if *owner != medication.id {
                return Err(Error::Duplicate {
                    field: "code",
                    value: medication.code.clone(),
                });
            }
        }
        if let Some(previous) = tables.medications.insert(medication.id, medication.clone()) {
            tables.by_code.shift_remove(&previous.code);
        }
        tables.by_code.insert(medication.code.clone(), medication.id);
        Ok(())
    }

    fn remove_medication(&self, id: MedicationId) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.medications.shift_remove(&id) {
            Some(removed) => {
                tables.by_code.shift_remove(&removed.code);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn all_medications(&self) -> Result<Vec<Medication>> {
        Ok(self.tables.read().medications.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{current_load, DroneModel, DroneState};

    #[test]
    fn test_ids_are_sequential() {
        let registry = MemoryRegistry::new();
        let a = registry
            .insert_drone(DroneRegistration::new("A", DroneModel::Lightweight, 90))
            .unwrap();
        let b = registry
            .insert_drone(DroneRegistration::new("B", DroneModel::Lightweight, 90))
            .unwrap();
        assert_eq!(a.id, DroneId::new(1));
        assert_eq!(b.id, DroneId::new(2));
    }

    #[test]
    fn test_serial_is_unique() {
        let registry = MemoryRegistry::new();
        registry
            .insert_drone(DroneRegistration::new("DUP", DroneModel::Lightweight, 90))
            .unwrap();
        let err = registry
            .insert_drone(DroneRegistration::new("DUP", DroneModel::Heavyweight, 90))
            .unwrap_err();
        assert!(matches!(err, Error::Duplicate { field: "serial_number", .. }));
        assert_eq!(registry.all_drones().unwrap().len(), 1);
    }

    #[test]
    fn test_code_is_unique_on_insert_and_save() {
        let registry = MemoryRegistry::new();
        let first = registry.insert_medication(NewMedication::new("a", 1, "A")).unwrap();
        let mut second = registry.insert_medication(NewMedication::new("b", 1, "B")).unwrap();

        let err = registry
            .insert_medication(NewMedication::new("c", 1, "A"))
            .unwrap_err();
        assert!(matches!(err, Error::Duplicate { field: "code", .. }));

        second.code = first.code.clone();
        assert!(registry.save_medication(&second).is_err());

        second.code = "B2".to_string();
        registry.save_medication(&second).unwrap();
        assert!(registry.medication_by_code("B").unwrap().is_none());
        assert_eq!(registry.medication_by_code("B2").unwrap().unwrap().id, second.id);
    }

    #[test]
    fn test_queries() {
        let registry = MemoryRegistry::new();
        let fixtures = [
            ("IDLE-FULL", DroneState::Idle, 100),
            ("IDLE-EDGE", DroneState::Idle, 25),
            ("IDLE-LOW", DroneState::Idle, 24),
            ("LOADED", DroneState::Loaded, 90),
        ];
        for (serial, state, battery) in fixtures {
            registry
                .insert_drone(
                    DroneRegistration::new(serial, DroneModel::Middleweight, battery).with_state(state),
                )
                .unwrap();
        }

        let available: Vec<_> = registry
            .available_drones(25)
            .unwrap()
            .into_iter()
            .map(|d| d.serial_number)
            .collect();
        assert_eq!(available, vec!["IDLE-FULL", "IDLE-EDGE"]);

        let low = registry.low_battery_drones(25).unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].serial_number, "IDLE-LOW");

        assert_eq!(registry.drones_in_state(DroneState::Loaded).unwrap().len(), 1);
        assert!(registry.drones_in_state(DroneState::Returning).unwrap().is_empty());
    }

    #[test]
    fn test_medications_for_drone_and_load() {
        let registry = MemoryRegistry::new();
        let drone = registry
            .insert_drone(DroneRegistration::new("D", DroneModel::Heavyweight, 90))
            .unwrap();
        registry
            .insert_medication(NewMedication::new("a", 100, "A").with_drone(drone.id))
            .unwrap();
        registry
            .insert_medication(NewMedication::new("b", 50, "B").with_drone(drone.id))
            .unwrap();
        registry.insert_medication(NewMedication::new("c", 70, "C")).unwrap();

        assert_eq!(registry.medications_for_drone(drone.id).unwrap().len(), 2);
        assert_eq!(current_load(&registry, drone.id).unwrap(), 150);
    }

    #[test]
    fn test_remove_medication_frees_code() {
        let registry = MemoryRegistry::new();
        let med = registry.insert_medication(NewMedication::new("a", 1, "A")).unwrap();
        assert!(registry.remove_medication(med.id).unwrap());
        assert!(!registry.remove_medication(med.id).unwrap());
        registry.insert_medication(NewMedication::new("a", 1, "A")).unwrap();
    }

    #[test]
    fn test_save_rejects_missing_records() {
        let registry = MemoryRegistry::new();
        let drone = registry
            .insert_drone(DroneRegistration::new("SN-1", DroneModel::Lightweight, 80))
            .unwrap();
        let mut ghost_drone = drone.clone();
        ghost_drone.id = DroneId::new(42);
        ghost_drone.serial_number = "SN-GHOST".to_string();
        assert!(matches!(registry.save_drone(&ghost_drone), Err(Error::Storage(_))));
        assert!(registry.drone(DroneId::new(42)).unwrap().is_none());
        assert!(registry.drone_by_serial("SN-GHOST").unwrap().is_none());

        let med = registry.insert_medication(NewMedication::new("a", 1, "A")).unwrap();
        assert!(registry.remove_medication(med.id).unwrap());
        assert!(matches!(registry.save_medication(&med), Err(Error::Storage(_))));
        assert!(registry.medication(med.id).unwrap().is_none());
        assert!(registry.medication_by_code("A").unwrap().is_none());
    }

    #[test]
    fn test_medications_by_ids_skips_missing() {
        let registry = MemoryRegistry::new();
        let med = registry.insert_medication(NewMedication::new("a", 1, "A")).unwrap();
        let found = registry
            .medications_by_ids(&[med.id, MedicationId::new(99)])
            .unwrap();
        assert_eq!(found, vec![med]);
    }
}
