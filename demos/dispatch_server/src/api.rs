//! Endpoint handlers
//!
//! Handlers are synchronous: the hub takes blocking per-drone locks and the
//! store does blocking I/O, so the server calls [`Api::handle`] from
//! `spawn_blocking`.

use crate::dto::{BatteryResponse, ErrorBody, LoadRequest, MedicationBody, MedicationResponse};
use crate::error::{invalid, ApiError};
use crate::router::{query_param, Route};
use dronefleet_core::{DroneRegistration, DroneState, Medication};
use dronefleet_hub::{FleetHub, FleetRegistry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Status plus encoded JSON body
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Reply {
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ApiError::Internal(format!("encoding response: {}", e)))?;
        Ok(Self {
            status,
            body: Bytes::from(body),
        })
    }

    fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: Bytes::new(),
        }
    }

    /// Error reply with a `{message, timestamp}` body
    pub fn from_error(err: &ApiError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            error!(error = %err, "request failed");
        } else {
            debug!(status = status.as_u16(), error = %err, "request rejected");
        }
        let body = serde_json::to_vec(&ErrorBody::now(err.public_message())).unwrap_or_default();
        Self {
            status,
            body: Bytes::from(body),
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let has_body = !self.body.is_empty();
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        if has_body {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        response
    }
}

/// The dispatch API over a fleet hub
pub struct Api<R> {
    hub: Arc<FleetHub<R>>,
}

impl<R: FleetRegistry> Api<R> {
    pub fn new(hub: Arc<FleetHub<R>>) -> Self {
        Self { hub }
    }

    /// Serve one request
    pub fn handle(&self, method: &str, path: &str, query: Option<&str>, body: &[u8]) -> Reply {
        Route::parse(method, path)
            .and_then(|route| self.dispatch(route, query, body))
            .unwrap_or_else(|err| Reply::from_error(&err))
    }

    fn dispatch(&self, route: Route, query: Option<&str>, body: &[u8]) -> Result<Reply, ApiError> {
        let hub = &self.hub;
        match route {
            Route::RegisterDrone => {
                let registration: DroneRegistration = parse_body(body)?;
                Reply::json(StatusCode::CREATED, &hub.register_drone(registration)?)
            }
            Route::ListDrones => match query_param(query, "state")? {
                Some(state) => {
                    let state: DroneState = state.parse().map_err(dronefleet_hub::Error::from)?;
                    ok(&hub.drones_in_state(state)?)
                }
                None => ok(&hub.drones()?),
            },
            Route::AvailableDrones => ok(&hub.available_drones()?),
            Route::LowBatteryDrones => {
                let threshold = match query_param(query, "threshold")? {
                    Some(raw) => raw
                        .trim()
                        .parse::<u8>()
                        .map_err(|_| invalid("threshold", "must be a percentage"))?,
                    None => hub.config().low_battery_threshold(),
                };
                ok(&hub.low_battery_drones(threshold)?)
            }
            Route::LoadDrone => {
                let request: LoadRequest = parse_body(body)?;
                ok(&hub.load_drone(request.drone_id, &request.medication_ids)?)
            }
            Route::Drone(id) => ok(&hub.drone(id)?),
            Route::DroneBySerial(serial) => ok(&hub.drone_by_serial(&serial)?),
            Route::DroneMedications(id) => ok(&responses(hub.drone_medications(id)?)),
            Route::DroneBattery(id) => ok(&BatteryResponse {
                drone_id: id,
                battery_level: hub.battery(id)?,
                unit: "%",
            }),
            Route::UpdateDroneState(id) => {
                let state = query_param(query, "state")?
                    .ok_or_else(|| invalid("state", "query parameter is required"))?;
                ok(&hub.update_drone_state(id, &state)?)
            }
            Route::CreateMedication => {
                let medication = parse_body::<MedicationBody>(body)?.into_new()?;
                Reply::json(
                    StatusCode::CREATED,
                    &MedicationResponse::from(hub.create_medication(medication)?),
                )
            }
            Route::ListMedications => ok(&responses(hub.medications()?)),
            Route::Medication(id) => ok(&MedicationResponse::from(hub.medication(id)?)),
            Route::MedicationByCode(code) => {
                ok(&MedicationResponse::from(hub.medication_by_code(&code)?))
            }
            Route::UpdateMedication(id) => {
                let update = parse_body::<MedicationBody>(body)?.into_update()?;
                ok(&MedicationResponse::from(hub.update_medication(id, update)?))
            }
            Route::DeleteMedication(id) => {
                hub.delete_medication(id)?;
                Ok(Reply::no_content())
            }
        }
    }
}

fn ok<T: Serialize>(value: &T) -> Result<Reply, ApiError> {
    Reply::json(StatusCode::OK, value)
}

fn responses(medications: Vec<Medication>) -> Vec<MedicationResponse> {
    medications.into_iter().map(MedicationResponse::from).collect()
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Body(e.to_string()))
}
