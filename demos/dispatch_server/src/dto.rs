//! JSON shapes exchanged with clients
//!
//! Drones go over the wire as [`DroneView`](dronefleet_core::DroneView) and
//! registrations as [`DroneRegistration`](dronefleet_core::DroneRegistration)
//! directly; medications need a wrapper because images travel as base64.

use crate::error::{invalid, ApiError};
use base64::{engine::general_purpose, Engine as _};
use dronefleet_core::{DroneId, Medication, MedicationId, MedicationUpdate, NewMedication};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/drones/load`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub drone_id: DroneId,
    pub medication_ids: Vec<MedicationId>,
}

/// Body of medication create and update requests
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationBody {
    pub name: Option<String>,
    pub weight: Option<u32>,
    pub code: Option<String>,
    pub drone_id: Option<DroneId>,
    pub image_base64: Option<String>,
}

impl MedicationBody {
    /// Creation input; name, weight and code are required
    pub fn into_new(self) -> Result<NewMedication, ApiError> {
        let image = decode_image(self.image_base64.as_deref())?;
        let mut medication = NewMedication::new(
            self.name.ok_or_else(|| invalid("name", "is required"))?,
            self.weight.ok_or_else(|| invalid("weight", "is required"))?,
            self.code.ok_or_else(|| invalid("code", "is required"))?,
        );
        medication.drone_id = self.drone_id;
        medication.image = image;
        Ok(medication)
    }

    /// Patch input; absent fields are kept
    pub fn into_update(self) -> Result<MedicationUpdate, ApiError> {
        Ok(MedicationUpdate {
            image: decode_image(self.image_base64.as_deref())?,
            name: self.name,
            weight: self.weight,
            code: self.code,
            drone_id: self.drone_id,
        })
    }
}

fn decode_image(encoded: Option<&str>) -> Result<Option<Vec<u8>>, ApiError> {
    encoded
        .map(|data| {
            general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| invalid("image", format!("not valid base64: {}", e)))
        })
        .transpose()
}

/// Medication as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationResponse {
    pub id: MedicationId,
    pub name: String,
    pub weight: u32,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    pub drone_id: Option<DroneId>,
}

impl From<Medication> for MedicationResponse {
    fn from(medication: Medication) -> Self {
        Self {
            id: medication.id,
            name: medication.name,
            weight: medication.weight,
            code: medication.code,
            image_base64: medication
                .image
                .map(|bytes| general_purpose::STANDARD.encode(bytes)),
            drone_id: medication.drone_id,
        }
    }
}

/// Body of `GET /api/drones/{id}/battery`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryResponse {
    pub drone_id: DroneId,
    pub battery_level: u8,
    pub unit: &'static str,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    /// RFC 3339
    pub timestamp: String,
}

impl ErrorBody {
    pub fn now(message: String) -> Self {
        Self {
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
