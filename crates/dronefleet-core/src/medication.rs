//! Medication records, creation input and patch updates

use crate::{DroneId, Error, MedicationId, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid name pattern"));

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("valid code pattern"));

/// A deliverable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    /// Weight in grams, at least 1
    pub weight: u32,
    /// Unique code
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
    /// Drone currently carrying this medication
    #[serde(default)]
    pub drone_id: Option<DroneId>,
}

impl Medication {
    pub fn is_assigned_to(&self, drone: DroneId) -> bool {
        self.drone_id == Some(drone)
    }
}

/// Input for creating a medication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedication {
    pub name: String,
    pub weight: u32,
    pub code: String,
    #[serde(default)]
    pub drone_id: Option<DroneId>,
    #[serde(default)]
    pub image: Option<Vec<u8>>,
}

impl NewMedication {
    pub fn new(name: impl Into<String>, weight: u32, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight,
            code: code.into(),
            drone_id: None,
            image: None,
        }
    }

    pub fn with_drone(mut self, drone_id: DroneId) -> Self {
        self.drone_id = Some(drone_id);
        self
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Check field constraints
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_weight(self.weight)?;
        validate_code(&self.code)
    }

    /// Validate and build the medication record under the given id
    pub fn into_medication(self, id: MedicationId) -> Result<Medication> {
        self.validate()?;
        Ok(Medication {
            id,
            name: self.name,
            weight: self.weight,
            code: self.code,
            image: self.image,
            drone_id: self.drone_id,
        })
    }
}

/// Patch applied to an existing medication; absent fields are kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub image: Option<Vec<u8>>,
    #[serde(default)]
    pub drone_id: Option<DroneId>,
}

impl MedicationUpdate {
    /// Check the fields that are present
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(weight) = self.weight {
            validate_weight(weight)?;
        }
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        Ok(())
    }

    /// Validate and apply onto `medication`, returning the patched copy
    pub fn apply_to(self, medication: &Medication) -> Result<Medication> {
        self.validate()?;
        let mut patched = medication.clone();
        if let Some(name) = self.name {
            patched.name = name;
        }
        if let Some(weight) = self.weight {
            patched.weight = weight;
        }
        if let Some(code) = self.code {
            patched.code = code;
        }
        if let Some(image) = self.image {
            patched.image = Some(image);
        }
        if let Some(drone_id) = self.drone_id {
            patched.drone_id = Some(drone_id);
        }
        Ok(patched)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(Error::validation(
            "name",
            "can only contain letters, numbers, hyphen and underscore",
        ))
    }
}

fn validate_code(code: &str) -> Result<()> {
    if CODE_PATTERN.is_match(code) {
        Ok(())
    } else {
        Err(Error::validation(
            "code",
            "can only contain uppercase letters, underscore and numbers",
        ))
    }
}

fn validate_weight(weight: u32) -> Result<()> {
    if weight >= 1 {
        Ok(())
    } else {
        Err(Error::validation("weight", "must be at least 1g"))
    }
}
