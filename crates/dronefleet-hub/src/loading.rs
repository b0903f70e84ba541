//! Loading coordinator
//!
//! Assigns a batch of medications to a drone. The whole check-then-assign
//! sequence runs under the drone's lock and the locks of every medication in
//! the batch, so concurrent loads of the same drone can never push it past
//! its weight limit and a medication cannot be edited or deleted mid-load.

use crate::config::LoadFailurePolicy;
use crate::error::{Error, MedicationLookup, Result};
use crate::hub::{FleetHub, FleetRegistry};
use dronefleet_core::{
    current_load, transition, Drone, DroneId, DroneState, DroneView, Medication, MedicationId,
};
use std::collections::HashSet;
use tracing::{error, info, warn};

impl<R: FleetRegistry> FleetHub<R> {
    /// Load `medication_ids` onto drone `drone_id`
    ///
    /// On success every medication points at the drone and the drone is
    /// `LOADED`. On failure no medication is reassigned; a drone this call
    /// moved to `LOADING` is moved back to `IDLE` unless the configured
    /// [`LoadFailurePolicy`] is `KeepLoading`.
    pub fn load_drone(&self, drone_id: DroneId, medication_ids: &[MedicationId]) -> Result<DroneView> {
        check_request(medication_ids)?;
        self.drone_locks.with_key(drone_id, || {
            self.medication_locks
                .with_keys(medication_ids, || self.load_locked(drone_id, medication_ids))
        })
    }

    /// Body of [`load_drone`](Self::load_drone); runs with every lock held
    fn load_locked(&self, drone_id: DroneId, medication_ids: &[MedicationId]) -> Result<DroneView> {
        let drone = self.require_drone(drone_id)?;
        if !drone.can_be_loaded() {
            return Err(Error::InvalidDroneState {
                id: drone.id,
                state: drone.state,
            });
        }
        let minimum = self.config.min_battery_level();
        if drone.battery_capacity < minimum {
            return Err(Error::LowBattery {
                battery: drone.battery_capacity,
                minimum,
            });
        }

        let (drone, flipped) = if drone.state == DroneState::Idle {
            let loading = transition(drone, DroneState::Loading)?;
            self.registry.save_drone(&loading)?;
            (loading, true)
        } else {
            (drone, false)
        };

        match self.assign(&drone, medication_ids) {
            Ok(view) => Ok(view),
            Err(err) => {
                if flipped {
                    self.undo_flip(drone, &err);
                }
                Err(err)
            }
        }
    }

    /// Steps after the drone is in `LOADING`
    fn assign(&self, drone: &Drone, medication_ids: &[MedicationId]) -> Result<DroneView> {
        let medications = self.registry.medications_by_ids(medication_ids)?;
        if medications.len() != medication_ids.len() {
            let found: HashSet<MedicationId> = medications.iter().map(|m| m.id).collect();
            let missing = medication_ids
                .iter()
                .copied()
                .filter(|id| !found.contains(id))
                .collect();
            return Err(Error::MedicationNotFound(MedicationLookup::Missing(missing)));
        }

        let incoming = medications
            .iter()
            .fold(0u32, |total, m| total.saturating_add(m.weight));
        let current = current_load(&*self.registry, drone.id)?;
        if !drone.can_carry(current, incoming) {
            return Err(Error::DroneOverloaded {
                current,
                incoming,
                capacity: drone.weight_limit,
            });
        }

        self.attach(drone.id, &medications)?;

        let loaded = transition(drone.clone(), DroneState::Loaded)?;
        if let Err(err) = self.registry.save_drone(&loaded) {
            self.restore(&medications);
            return Err(err.into());
        }
        info!(
            drone = %loaded.id,
            serial = %loaded.serial_number,
            count = medications.len(),
            weight = incoming,
            "loaded medications onto drone"
        );
        self.view(loaded)
    }

    /// Point every medication at `drone`, restoring the ones already saved
    /// if one has vanished or a save fails
    fn attach(&self, drone: DroneId, medications: &[Medication]) -> Result<()> {
        let mut saved: Vec<Medication> = Vec::with_capacity(medications.len());
        for medication in medications {
            let current = match self.registry.medication(medication.id) {
                Ok(Some(current)) => current,
                Ok(None) => {
                    self.restore(&saved);
                    return Err(Error::MedicationNotFound(MedicationLookup::Missing(vec![
                        medication.id,
                    ])));
                }
                Err(err) => {
                    self.restore(&saved);
                    return Err(err.into());
                }
            };
            let mut assigned = current.clone();
            assigned.drone_id = Some(drone);
            if let Err(err) = self.registry.save_medication(&assigned) {
                self.restore(&saved);
                return Err(err.into());
            }
            saved.push(current);
        }
        Ok(())
    }

    /// Put medications back the way they were before `attach`
    fn restore(&self, medications: &[Medication]) {
        for medication in medications {
            if let Err(err) = self.registry.save_medication(medication) {
                error!(medication = %medication.id, error = %err, "failed to restore medication");
            }
        }
    }

    fn undo_flip(&self, drone: Drone, cause: &Error) {
        match self.config.load_failure_policy {
            LoadFailurePolicy::KeepLoading => {
                warn!(drone = %drone.id, error = %cause, "loading failed; drone left in LOADING");
            }
            LoadFailurePolicy::Rollback => {
                let id = drone.id;
                let rolled_back = transition(drone, DroneState::Idle)
                    .map_err(Error::from)
                    .and_then(|idle| Ok(self.registry.save_drone(&idle)?));
                match rolled_back {
                    Ok(()) => warn!(drone = %id, error = %cause, "loading failed; drone returned to IDLE"),
                    Err(err) => error!(drone = %id, error = %err, "failed to roll back drone to IDLE"),
                }
            }
        }
    }
}

/// Reject empty and duplicated id lists before touching the drone
fn check_request(medication_ids: &[MedicationId]) -> Result<()> {
    if medication_ids.is_empty() {
        return Err(dronefleet_core::Error::validation(
            "medication_ids",
            "at least one medication is required",
        )
        .into());
    }
    let mut seen = HashSet::with_capacity(medication_ids.len());
    if let Some(duplicate) = medication_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(dronefleet_core::Error::validation(
            "medication_ids",
            format!("duplicate medication id {}", duplicate.raw()),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, FleetConfig, FleetHub, LoadFailurePolicy};
    use dronefleet_core::{
        Drone, DroneId, DroneModel, DroneRegistration, DroneRegistry, DroneState, Medication,
        MedicationId, MedicationRegistry, MedicationUpdate, MemoryRegistry, NewMedication,
    };
    use parking_lot::Mutex;
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::sync::Arc;
    use std::time::Duration;

    fn hub_with(config: FleetConfig) -> FleetHub<MemoryRegistry> {
        FleetHub::new(Arc::new(MemoryRegistry::new()), config)
    }

    fn hub() -> FleetHub<MemoryRegistry> {
        hub_with(FleetConfig::default())
    }

    fn drone(hub: &FleetHub<MemoryRegistry>, limit: u32, battery: u8, state: DroneState) -> DroneId {
        hub.register_drone(
            DroneRegistration::new(format!("SN-{}-{}", limit, battery), DroneModel::Heavyweight, battery)
                .with_weight_limit(limit)
                .with_state(state),
        )
        .unwrap()
        .drone
        .id
    }

    fn medication(hub: &FleetHub<MemoryRegistry>, code: &str, weight: u32) -> MedicationId {
        hub.create_medication(NewMedication::new(code.to_lowercase(), weight, code))
            .unwrap()
            .id
    }

    #[test]
    fn test_load_idle_drone() {
        let hub = hub();
        let id = drone(&hub, 500, 80, DroneState::Idle);
        let a = medication(&hub, "A", 100);
        let b = medication(&hub, "B", 150);

        let view = hub.load_drone(id, &[a, b]).unwrap();
        assert_eq!(view.drone.state, DroneState::Loaded);
        assert_eq!(view.current_load, 250);
        assert_eq!(hub.medication(a).unwrap().drone_id, Some(id));
        assert_eq!(hub.drone_medications(id).unwrap().len(), 2);
    }

    #[test]
    fn test_load_drone_already_loading() {
        let hub = hub();
        let id = drone(&hub, 500, 80, DroneState::Loading);
        let a = medication(&hub, "A", 100);

        let view = hub.load_drone(id, &[a]).unwrap();
        assert_eq!(view.drone.state, DroneState::Loaded);
    }

    #[test]
    fn test_load_exactly_to_limit() {
        let hub = hub();
        let id = drone(&hub, 300, 80, DroneState::Idle);
        let a = medication(&hub, "A", 100);
        let b = medication(&hub, "B", 200);
        assert_eq!(hub.load_drone(id, &[a, b]).unwrap().current_load, 300);
    }

    #[test]
    fn test_battery_boundary() {
        let hub = hub();
        let ok = drone(&hub, 500, 25, DroneState::Idle);
        let low = drone(&hub, 400, 24, DroneState::Idle);
        let a = medication(&hub, "A", 10);
        let b = medication(&hub, "B", 10);

        assert!(hub.load_drone(ok, &[a]).is_ok());
        let err = hub.load_drone(low, &[b]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LowBattery);
        assert_eq!(hub.drone(low).unwrap().drone.state, DroneState::Idle);
        assert_eq!(hub.medication(b).unwrap().drone_id, None);
    }

    #[test]
    fn test_rejects_wrong_state() {
        let hub = hub();
        let a = medication(&hub, "A", 10);
        for (limit, state) in [
            (101, DroneState::Loaded),
            (102, DroneState::Delivering),
            (103, DroneState::Delivered),
            (104, DroneState::Returning),
        ] {
            let id = drone(&hub, limit, 90, state);
            let err = hub.load_drone(id, &[a]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidDroneState);
            assert_eq!(hub.drone(id).unwrap().drone.state, state);
        }
        assert_eq!(hub.medication(a).unwrap().drone_id, None);
    }

    #[test]
    fn test_state_is_checked_before_battery_and_weight() {
        let hub = hub();
        let id = drone(&hub, 50, 10, DroneState::Delivering);
        let heavy = medication(&hub, "HEAVY", 400);

        let err = hub.load_drone(id, &[heavy]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDroneState);
        let view = hub.drone(id).unwrap();
        assert_eq!(view.drone.state, DroneState::Delivering);
        assert_eq!(view.drone.battery_capacity, 10);
        assert_eq!(hub.medication(heavy).unwrap().drone_id, None);
    }

    #[test]
    fn test_unknown_drone() {
        let hub = hub();
        let a = medication(&hub, "A", 10);
        let err = hub.load_drone(DroneId::new(77), &[a]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_id_lists() {
        let hub = hub();
        let id = drone(&hub, 500, 80, DroneState::Idle);
        let a = medication(&hub, "A", 10);

        assert_eq!(hub.load_drone(id, &[]).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            hub.load_drone(id, &[a, a]).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(hub.drone(id).unwrap().drone.state, DroneState::Idle);
    }

    #[test]
    fn test_missing_medication_rolls_back() {
        let hub = hub();
        let id = drone(&hub, 500, 80, DroneState::Idle);
        let a = medication(&hub, "A", 10);

        let err = hub.load_drone(id, &[a, MedicationId::new(999)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("999"));
        assert_eq!(hub.drone(id).unwrap().drone.state, DroneState::Idle);
        assert_eq!(hub.medication(a).unwrap().drone_id, None);
    }

    #[test]
    fn test_overload_rolls_back() {
        let hub = hub();
        let id = drone(&hub, 100, 80, DroneState::Idle);
        let a = medication(&hub, "A", 60);
        let b = medication(&hub, "B", 41);

        let err = hub.load_drone(id, &[a, b]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DroneOverloaded);
        assert!(err.to_string().contains("Current load: 0g"));
        assert!(err.to_string().contains("New medications: 101g"));
        assert!(err.to_string().contains("Maximum capacity: 100g"));

        let view = hub.drone(id).unwrap();
        assert_eq!(view.drone.state, DroneState::Idle);
        assert_eq!(view.current_load, 0);
    }

    #[test]
    fn test_overload_counts_existing_cargo() {
        let hub = hub();
        let id = drone(&hub, 100, 80, DroneState::Loading);
        hub.create_medication(NewMedication::new("held", 70, "HELD").with_drone(id))
            .unwrap();
        let b = medication(&hub, "B", 31);

        let err = hub.load_drone(id, &[b]).unwrap_err();
        assert!(err.to_string().contains("Current load: 70g"));
        // Not flipped by this call, so it stays LOADING under either policy.
        assert_eq!(hub.drone(id).unwrap().drone.state, DroneState::Loading);
    }

    #[test]
    fn test_keep_loading_policy() {
        let hub = hub_with(
            FleetConfig::default().with_load_failure_policy(LoadFailurePolicy::KeepLoading),
        );
        let id = drone(&hub, 100, 80, DroneState::Idle);
        let a = medication(&hub, "A", 200);

        assert!(hub.load_drone(id, &[a]).is_err());
        let view = hub.drone(id).unwrap();
        assert_eq!(view.drone.state, DroneState::Loading);
        assert_eq!(view.current_load, 0);
    }

    #[test]
    fn test_custom_minimum_battery() {
        let hub = hub_with(FleetConfig::default().with_min_battery_level(50));
        let id = drone(&hub, 100, 49, DroneState::Idle);
        let a = medication(&hub, "A", 10);
        assert_eq!(hub.load_drone(id, &[a]).unwrap_err().kind(), ErrorKind::LowBattery);
    }

    #[test]
    fn test_medication_moves_between_drones() {
        let hub = hub();
        let first = drone(&hub, 500, 80, DroneState::Idle);
        let second = drone(&hub, 400, 80, DroneState::Idle);
        let a = medication(&hub, "A", 50);

        hub.load_drone(first, &[a]).unwrap();
        hub.load_drone(second, &[a]).unwrap();
        assert_eq!(hub.drone(first).unwrap().current_load, 0);
        assert_eq!(hub.drone(second).unwrap().current_load, 50);
    }

    #[test]
    fn test_concurrent_loads_never_exceed_limit() {
        let hub = hub();
        let id = drone(&hub, 100, 90, DroneState::Idle);
        let ids: Vec<MedicationId> = (0..8)
            .map(|i| medication(&hub, &format!("M{}", i), 30))
            .collect();

        let loaded: usize = std::thread::scope(|s| {
            let handles: Vec<_> = ids
                .iter()
                .map(|m| {
                    let hub = &hub;
                    s.spawn(move || loop {
                        match hub.load_drone(id, &[*m]) {
                            Ok(_) => {
                                // Back to IDLE so the next batch can be loaded on top.
                                hub.transition_drone(id, DroneState::Idle).unwrap();
                                return 1usize;
                            }
                            Err(err) if err.kind() == ErrorKind::InvalidDroneState => {
                                std::thread::yield_now();
                            }
                            Err(_) => return 0,
                        }
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        let view = hub.drone(id).unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(view.current_load, 90);
        assert!(view.current_load <= view.drone.weight_limit);
        assert_eq!(view.drone.state, DroneState::Idle);
    }

    /// Memory registry that stalls the first batch lookup, so another
    /// operation can be started while a load holds its locks
    struct StallingRegistry {
        inner: MemoryRegistry,
        stalled: Mutex<Option<Sender<()>>>,
    }

    impl StallingRegistry {
        fn new() -> (Self, Receiver<()>) {
            let (tx, rx) = channel();
            let registry = Self {
                inner: MemoryRegistry::new(),
                stalled: Mutex::new(Some(tx)),
            };
            (registry, rx)
        }
    }

    impl DroneRegistry for StallingRegistry {
        fn insert_drone(&self, registration: DroneRegistration) -> dronefleet_core::Result<Drone> {
            self.inner.insert_drone(registration)
        }

        fn drone(&self, id: DroneId) -> dronefleet_core::Result<Option<Drone>> {
            self.inner.drone(id)
        }

        fn drone_by_serial(&self, serial_number: &str) -> dronefleet_core::Result<Option<Drone>> {
            self.inner.drone_by_serial(serial_number)
        }

        fn save_drone(&self, drone: &Drone) -> dronefleet_core::Result<()> {
            self.inner.save_drone(drone)
        }

        fn all_drones(&self) -> dronefleet_core::Result<Vec<Drone>> {
            self.inner.all_drones()
        }
    }

    impl MedicationRegistry for StallingRegistry {
        fn insert_medication(&self, medication: NewMedication) -> dronefleet_core::Result<Medication> {
            self.inner.insert_medication(medication)
        }

        fn medication(&self, id: MedicationId) -> dronefleet_core::Result<Option<Medication>> {
            self.inner.medication(id)
        }

        fn medication_by_code(&self, code: &str) -> dronefleet_core::Result<Option<Medication>> {
            self.inner.medication_by_code(code)
        }

        fn save_medication(&self, medication: &Medication) -> dronefleet_core::Result<()> {
            self.inner.save_medication(medication)
        }

        fn remove_medication(&self, id: MedicationId) -> dronefleet_core::Result<bool> {
            self.inner.remove_medication(id)
        }

        fn all_medications(&self) -> dronefleet_core::Result<Vec<Medication>> {
            self.inner.all_medications()
        }

        fn medications_by_ids(&self, ids: &[MedicationId]) -> dronefleet_core::Result<Vec<Medication>> {
            let found = self.inner.medications_by_ids(ids)?;
            if let Some(tx) = self.stalled.lock().take() {
                let _ = tx.send(());
                std::thread::sleep(Duration::from_millis(50));
            }
            Ok(found)
        }
    }

    fn stalling_hub() -> (FleetHub<StallingRegistry>, Receiver<()>) {
        let (registry, stalled) = StallingRegistry::new();
        (FleetHub::new(Arc::new(registry), FleetConfig::default()), stalled)
    }

    fn setup(hub: &FleetHub<StallingRegistry>, codes: &[&str]) -> (DroneId, Vec<MedicationId>) {
        let id = hub
            .register_drone(DroneRegistration::new("SN-STALL", DroneModel::Heavyweight, 90))
            .unwrap()
            .drone
            .id;
        let medications = codes
            .iter()
            .map(|code| {
                hub.create_medication(NewMedication::new(code.to_lowercase(), 10, *code))
                    .unwrap()
                    .id
            })
            .collect();
        (id, medications)
    }

    #[test]
    fn test_delete_waits_for_load_holding_the_medication() {
        let (hub, stalled) = stalling_hub();
        let (id, meds) = setup(&hub, &["A"]);

        let (loaded, deleted) = std::thread::scope(|s| {
            let load = s.spawn(|| hub.load_drone(id, &meds));
            stalled.recv().unwrap();
            let deleted = hub.delete_medication(meds[0]);
            (load.join().unwrap(), deleted)
        });

        assert_eq!(loaded.unwrap().current_load, 10);
        deleted.unwrap();
        assert_eq!(hub.medication(meds[0]).unwrap_err().kind(), ErrorKind::NotFound);
        let view = hub.drone(id).unwrap();
        assert_eq!(view.current_load, 0);
        assert_eq!(view.drone.state, DroneState::Loaded);
    }

    #[test]
    fn test_update_during_load_is_not_overwritten() {
        let (hub, stalled) = stalling_hub();
        let (id, meds) = setup(&hub, &["A"]);

        let (loaded, updated) = std::thread::scope(|s| {
            let load = s.spawn(|| hub.load_drone(id, &meds));
            stalled.recv().unwrap();
            let updated = hub.update_medication(
                meds[0],
                MedicationUpdate {
                    weight: Some(40),
                    ..Default::default()
                },
            );
            (load.join().unwrap(), updated)
        });

        loaded.unwrap();
        let updated = updated.unwrap();
        assert_eq!(updated.weight, 40);
        assert_eq!(updated.drone_id, Some(id));
        assert_eq!(hub.medication(meds[0]).unwrap(), updated);
        assert_eq!(hub.drone(id).unwrap().current_load, 40);
    }

    #[test]
    fn test_medication_removed_behind_the_hub_fails_the_load() {
        let (hub, stalled) = stalling_hub();
        let (id, meds) = setup(&hub, &["A", "B"]);

        let loaded = std::thread::scope(|s| {
            let load = s.spawn(|| hub.load_drone(id, &meds));
            stalled.recv().unwrap();
            // Bypasses the hub and its locks.
            assert!(hub.registry().remove_medication(meds[1]).unwrap());
            load.join().unwrap()
        });

        let err = loaded.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            format!("Medication not found with ids: {}", meds[1].raw())
        );
        assert!(hub.medication(meds[1]).is_err());
        assert_eq!(hub.medication(meds[0]).unwrap().drone_id, None);
        let view = hub.drone(id).unwrap();
        assert_eq!(view.drone.state, DroneState::Idle);
        assert_eq!(view.current_load, 0);
    }

    #[test]
    fn test_load_with_native_db_store() {
        let store = Arc::new(dronefleet_db::Store::in_memory().unwrap());
        let hub = FleetHub::new(store, FleetConfig::default());
        let id = hub
            .register_drone(DroneRegistration::new("DB-1", DroneModel::Middleweight, 70))
            .unwrap()
            .drone
            .id;
        let a = hub
            .create_medication(NewMedication::new("ibuprofen", 120, "IBU"))
            .unwrap()
            .id;
        let b = hub
            .create_medication(NewMedication::new("paracetamol", 200, "PARA"))
            .unwrap()
            .id;

        let err = hub.load_drone(id, &[a, b]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DroneOverloaded);
        assert_eq!(hub.drone(id).unwrap().drone.state, DroneState::Idle);

        let view = hub.load_drone(id, &[a]).unwrap();
        assert_eq!(view.drone.state, DroneState::Loaded);
        assert_eq!(view.current_load, 120);
        assert_eq!(hub.drone_medications(id).unwrap()[0].code, "IBU");
    }
}
