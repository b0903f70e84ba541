//! Medication model for database storage.

use dronefleet_core::{DroneId, Medication, MedicationId};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored medication row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredMedication {
    /// Primary key - medication ID.
    #[primary_key]
    pub id: u64,
    /// Unique medication code.
    #[secondary_key(unique)]
    pub code: String,
    pub name: String,
    /// Weight in grams.
    pub weight: u32,
    /// Raw image bytes.
    pub image: Option<Vec<u8>>,
    /// Carrying drone, if assigned.
    pub drone_id: Option<u64>,
}

impl StoredMedication {
    /// Create from a domain medication.
    pub fn from_medication(medication: &Medication) -> Self {
        Self {
            id: medication.id.raw(),
            code: medication.code.clone(),
            name: medication.name.clone(),
            weight: medication.weight,
            image: medication.image.clone(),
            drone_id: medication.drone_id.map(|d| d.raw()),
        }
    }

    /// Convert to a domain medication.
    pub fn to_medication(&self) -> Medication {
        Medication {
            id: MedicationId::new(self.id),
            name: self.name.clone(),
            weight: self.weight,
            code: self.code.clone(),
            image: self.image.clone(),
            drone_id: self.drone_id.map(DroneId::new),
        }
    }
}
