//! FleetHub - Drone and medication operations over the registries
//!
//! The hub owns the registry handle, the fleet configuration and the
//! drone and medication lock tables. Loading lives in [`loading`](crate::loading); this
//! module holds registration, lookups, state updates and medication
//! maintenance.

use crate::config::FleetConfig;
use crate::error::{DroneLookup, Error, MedicationLookup, Result};
use crate::locks::KeyedLocks;
use dronefleet_core::{
    current_load, transition, transition_by_name, Drone, DroneId, DroneRegistration,
    DroneRegistry, DroneState, DroneView, Medication, MedicationId, MedicationRegistry,
    MedicationUpdate, NewMedication,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Storage the hub runs on
pub trait FleetRegistry: DroneRegistry + MedicationRegistry {}

impl<T: DroneRegistry + MedicationRegistry> FleetRegistry for T {}

/// Entry point for every fleet operation
///
/// Safe to share between request handlers and the sweep; mutations of a
/// single drone or medication are serialized through its lock, unrelated
/// records proceed in parallel.
pub struct FleetHub<R> {
    pub(crate) registry: Arc<R>,
    pub(crate) config: FleetConfig,
    pub(crate) drone_locks: KeyedLocks<DroneId>,
    pub(crate) medication_locks: KeyedLocks<MedicationId>,
}

impl<R: FleetRegistry> FleetHub<R> {
    /// Create a hub over `registry`
    pub fn new(registry: Arc<R>, config: FleetConfig) -> Self {
        Self {
            registry,
            config,
            drone_locks: KeyedLocks::new(),
            medication_locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    // ---- drones ----

    /// Register a new drone; weight limit and state default from the model
    pub fn register_drone(&self, registration: DroneRegistration) -> Result<DroneView> {
        let drone = self.registry.insert_drone(registration)?;
        info!(
            drone = %drone.id,
            serial = %drone.serial_number,
            model = %drone.model,
            "registered new drone"
        );
        self.view(drone)
    }

    pub fn drone(&self, id: DroneId) -> Result<DroneView> {
        let drone = self.require_drone(id)?;
        self.view(drone)
    }

    pub fn drone_by_serial(&self, serial_number: &str) -> Result<DroneView> {
        let drone = self
            .registry
            .drone_by_serial(serial_number)?
            .ok_or_else(|| Error::DroneNotFound(DroneLookup::Serial(serial_number.to_string())))?;
        self.view(drone)
    }

    pub fn drones(&self) -> Result<Vec<DroneView>> {
        self.views(self.registry.all_drones()?)
    }

    /// Idle drones with at least the configured minimum battery
    pub fn available_drones(&self) -> Result<Vec<DroneView>> {
        self.views(
            self.registry
                .available_drones(self.config.min_battery_level())?,
        )
    }

    /// Drones with battery strictly below `threshold`
    pub fn low_battery_drones(&self, threshold: u8) -> Result<Vec<DroneView>> {
        self.views(self.registry.low_battery_drones(threshold)?)
    }

    pub fn drones_in_state(&self, state: DroneState) -> Result<Vec<DroneView>> {
        self.views(self.registry.drones_in_state(state)?)
    }

    /// Medications currently assigned to the drone
    pub fn drone_medications(&self, id: DroneId) -> Result<Vec<Medication>> {
        self.require_drone(id)?;
        Ok(self.registry.medications_for_drone(id)?)
    }

    /// Battery percentage of the drone
    pub fn battery(&self, id: DroneId) -> Result<u8> {
        let drone = self.require_drone(id)?;
        info!(
            drone = %drone.id,
            serial = %drone.serial_number,
            battery = drone.battery_capacity,
            "battery level read"
        );
        Ok(drone.battery_capacity)
    }

    /// Move a drone to the state named `target`
    pub fn update_drone_state(&self, id: DroneId, target: &str) -> Result<DroneView> {
        self.drone_locks.with_key(id, || {
            let drone = self.require_drone(id)?;
            let from = drone.state;
            let updated = transition_by_name(drone, target)?;
            self.commit_transition(from, updated)
        })
    }

    /// Move a drone to `target`
    pub fn transition_drone(&self, id: DroneId, target: DroneState) -> Result<DroneView> {
        self.drone_locks.with_key(id, || {
            let drone = self.require_drone(id)?;
            let from = drone.state;
            let updated = transition(drone, target)?;
            self.commit_transition(from, updated)
        })
    }

    /// Move a drone from `expected` to `target`, or do nothing if it is no
    /// longer in `expected` by the time its lock is held
    pub fn advance_if(
        &self,
        id: DroneId,
        expected: DroneState,
        target: DroneState,
    ) -> Result<Option<DroneView>> {
        self.drone_locks.with_key(id, || {
            let drone = self.require_drone(id)?;
            if drone.state != expected {
                debug!(drone = %id, state = %drone.state, expected = %expected, "skipping advance");
                return Ok(None);
            }
            let updated = transition(drone, target)?;
            self.commit_transition(expected, updated).map(Some)
        })
    }

    // ---- medications ----

    /// Create a medication, optionally assigned to a drone
    ///
    /// An assignment must fit into the drone's remaining capacity.
    pub fn create_medication(&self, medication: NewMedication) -> Result<Medication> {
        medication.validate()?;
        let created = match medication.drone_id {
            Some(drone_id) => self.drone_locks.with_key(drone_id, || {
                let drone = self.require_drone(drone_id)?;
                self.ensure_room(&drone, 0, medication.weight)?;
                Ok::<_, Error>(self.registry.insert_medication(medication)?)
            })?,
            None => self.registry.insert_medication(medication)?,
        };
        info!(medication = %created.id, code = %created.code, "created new medication");
        Ok(created)
    }

    pub fn medication(&self, id: MedicationId) -> Result<Medication> {
        self.require_medication(id)
    }

    pub fn medication_by_code(&self, code: &str) -> Result<Medication> {
        self.registry
            .medication_by_code(code)?
            .ok_or_else(|| Error::MedicationNotFound(MedicationLookup::Code(code.to_string())))
    }

    pub fn medications(&self) -> Result<Vec<Medication>> {
        Ok(self.registry.all_medications()?)
    }

    /// Patch a medication
    ///
    /// Moving it to a drone, or making it heavier while assigned, is checked
    /// against the carrying drone's capacity under that drone's lock.
    pub fn update_medication(&self, id: MedicationId, update: MedicationUpdate) -> Result<Medication> {
        update.validate()?;
        loop {
            let seen = self.require_medication(id)?;
            let carrier = update.drone_id.or(seen.drone_id);
            let attempt = || {
                self.medication_locks
                    .with_key(id, || self.apply_update(id, carrier, update.clone()))
            };
            let outcome = match carrier {
                Some(drone_id) => self.drone_locks.with_key(drone_id, attempt)?,
                None => attempt()?,
            };
            // None: the medication changed carrier while we waited for the lock.
            if let Some(updated) = outcome {
                info!(medication = %updated.id, "updated medication");
                return Ok(updated);
            }
        }
    }

    /// Remove a medication; waits for any load holding it to finish
    pub fn delete_medication(&self, id: MedicationId) -> Result<()> {
        let removed = self
            .medication_locks
            .with_key(id, || self.registry.remove_medication(id))?;
        if !removed {
            return Err(Error::MedicationNotFound(MedicationLookup::Id(id)));
        }
        info!(medication = %id, "deleted medication");
        Ok(())
    }

    // ---- helpers ----

    pub(crate) fn require_drone(&self, id: DroneId) -> Result<Drone> {
        self.registry
            .drone(id)?
            .ok_or_else(|| Error::drone_not_found(id))
    }

    pub(crate) fn require_medication(&self, id: MedicationId) -> Result<Medication> {
        self.registry
            .medication(id)?
            .ok_or_else(|| Error::MedicationNotFound(MedicationLookup::Id(id)))
    }

    pub(crate) fn view(&self, drone: Drone) -> Result<DroneView> {
        let current_load = current_load(&*self.registry, drone.id)?;
        Ok(DroneView {
            drone,
            current_load,
        })
    }

    fn views(&self, drones: Vec<Drone>) -> Result<Vec<DroneView>> {
        drones.into_iter().map(|d| self.view(d)).collect()
    }

    /// Fail unless `added` grams fit on the drone once `released` grams
    /// already counted in its load are taken off
    fn ensure_room(&self, drone: &Drone, released: u32, added: u32) -> Result<()> {
        let current = current_load(&*self.registry, drone.id)?.saturating_sub(released);
        if !drone.can_carry(current, added) {
            return Err(Error::DroneOverloaded {
                current,
                incoming: added,
                capacity: drone.weight_limit,
            });
        }
        Ok(())
    }

    /// Apply `update` if the medication's carrier is still `locked`
    fn apply_update(
        &self,
        id: MedicationId,
        locked: Option<DroneId>,
        update: MedicationUpdate,
    ) -> Result<Option<Medication>> {
        let existing = self.require_medication(id)?;
        let patched = update.apply_to(&existing)?;
        if patched.drone_id != locked {
            return Ok(None);
        }
        if let Some(drone_id) = patched.drone_id {
            let already_counted = if existing.is_assigned_to(drone_id) {
                existing.weight
            } else {
                0
            };
            if patched.weight > already_counted {
                let drone = self.require_drone(drone_id)?;
                self.ensure_room(&drone, already_counted, patched.weight)?;
            }
        }
        self.registry.save_medication(&patched)?;
        Ok(Some(patched))
    }

    fn commit_transition(&self, from: DroneState, updated: Drone) -> Result<DroneView> {
        self.registry.save_drone(&updated)?;
        info!(
            drone = %updated.id,
            serial = %updated.serial_number,
            from = %from,
            to = %updated.state,
            battery = updated.battery_capacity,
            "drone state changed"
        );
        if updated.state == DroneState::Delivered {
            info!(
                drone = %updated.id,
                battery = updated.battery_capacity,
                "battery reduced after delivery"
            );
        }
        self.view(updated)
    }
}
