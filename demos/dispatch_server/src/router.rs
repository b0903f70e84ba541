//! Request routing for the dispatch API

use crate::error::ApiError;
use dronefleet_core::{DroneId, MedicationId};
use percent_encoding::percent_decode_str;

/// A matched API endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    RegisterDrone,
    ListDrones,
    AvailableDrones,
    LowBatteryDrones,
    LoadDrone,
    Drone(DroneId),
    DroneBySerial(String),
    DroneMedications(DroneId),
    DroneBattery(DroneId),
    UpdateDroneState(DroneId),
    CreateMedication,
    ListMedications,
    Medication(MedicationId),
    MedicationByCode(String),
    UpdateMedication(MedicationId),
    DeleteMedication(MedicationId),
}

impl Route {
    /// Match a method and path
    pub fn parse(method: &str, path: &str) -> Result<Route, ApiError> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match (method, segments.as_slice()) {
            ("POST", ["api", "drones"]) => Route::RegisterDrone,
            ("GET", ["api", "drones"]) => Route::ListDrones,
            ("GET", ["api", "drones", "available"]) => Route::AvailableDrones,
            ("GET", ["api", "drones", "low-battery"]) => Route::LowBatteryDrones,
            ("POST", ["api", "drones", "load"]) => Route::LoadDrone,
            ("GET", ["api", "drones", "serial", serial]) => Route::DroneBySerial(decode(serial)?),
            ("GET", ["api", "drones", id]) => Route::Drone(drone_id(id)?),
            ("GET", ["api", "drones", id, "medications"]) => Route::DroneMedications(drone_id(id)?),
            ("GET", ["api", "drones", id, "battery"]) => Route::DroneBattery(drone_id(id)?),
            ("PUT", ["api", "drones", id, "state"]) => Route::UpdateDroneState(drone_id(id)?),
            ("POST", ["api", "medications"]) => Route::CreateMedication,
            ("GET", ["api", "medications"]) => Route::ListMedications,
            ("GET", ["api", "medications", "code", code]) => Route::MedicationByCode(decode(code)?),
            ("GET", ["api", "medications", id]) => Route::Medication(medication_id(id)?),
            ("PUT", ["api", "medications", id]) => Route::UpdateMedication(medication_id(id)?),
            ("DELETE", ["api", "medications", id]) => Route::DeleteMedication(medication_id(id)?),
            _ => {
                return Err(ApiError::NoRoute {
                    method: method.to_string(),
                    path: path.to_string(),
                })
            }
        };
        Ok(route)
    }
}

/// Value of query parameter `name`, percent-decoded
pub fn query_param(query: Option<&str>, name: &str) -> Result<Option<String>, ApiError> {
    let Some(query) = query else {
        return Ok(None);
    };
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == name {
            return decode(&value.replace('+', " ")).map(Some);
        }
    }
    Ok(None)
}

fn decode(segment: &str) -> Result<String, ApiError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ApiError::Param {
            field: "path",
            message: e.to_string(),
        })
}

fn parse_id(segment: &str) -> Result<u64, ApiError> {
    segment.parse().map_err(|_| ApiError::Param {
        field: "id",
        message: format!("'{}' is not a number", segment),
    })
}

fn drone_id(segment: &str) -> Result<DroneId, ApiError> {
    parse_id(segment).map(DroneId::new)
}

fn medication_id(segment: &str) -> Result<MedicationId, ApiError> {
    parse_id(segment).map(MedicationId::new)
}
