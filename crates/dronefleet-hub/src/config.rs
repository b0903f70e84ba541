//! Fleet Configuration - Battery thresholds, sweep cadence and load policy
//!
//! Configuration is passed explicitly to [`FleetHub::new`](crate::FleetHub::new);
//! nothing here is global. Every field has a default so a partial RON
//! document deserializes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to a drone that this call flipped from `IDLE` to `LOADING`
/// when a later loading step fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadFailurePolicy {
    /// Transition back to `IDLE` before returning the error
    #[default]
    Rollback,
    /// Leave the drone in `LOADING`
    KeepLoading,
}

/// Configuration for fleet operations
///
/// # Example
///
/// ```
/// use dronefleet_hub::{FleetConfig, LoadFailurePolicy};
///
/// let config = FleetConfig::default();
/// assert_eq!(config.min_battery_level(), 25);
/// assert_eq!(config.battery_audit_interval().as_secs(), 60);
/// assert_eq!(config.load_failure_policy, LoadFailurePolicy::Rollback);
///
/// let config = FleetConfig::default().with_min_battery_level(140);
/// assert_eq!(config.min_battery_level(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Minimum battery percentage required to load a drone
    pub min_battery_level: u8,
    /// Battery percentage below which the audit sweep warns
    pub low_battery_threshold: u8,
    /// Seconds between battery audits
    pub battery_audit_interval_secs: u64,
    /// Seconds between automatic state advances
    pub auto_transition_interval_secs: u64,
    /// Behaviour when loading fails after the `IDLE -> LOADING` flip
    pub load_failure_policy: LoadFailurePolicy,
}

impl FleetConfig {
    /// Set the minimum battery level, clamped to `[0, 100]`
    pub fn with_min_battery_level(mut self, level: u8) -> Self {
        self.min_battery_level = level.min(100);
        self
    }

    /// Set the low-battery audit threshold, clamped to `[0, 100]`
    pub fn with_low_battery_threshold(mut self, threshold: u8) -> Self {
        self.low_battery_threshold = threshold.min(100);
        self
    }

    pub fn with_load_failure_policy(mut self, policy: LoadFailurePolicy) -> Self {
        self.load_failure_policy = policy;
        self
    }

    /// Effective minimum battery level
    pub fn min_battery_level(&self) -> u8 {
        self.min_battery_level.min(100)
    }

    /// Effective low-battery threshold
    pub fn low_battery_threshold(&self) -> u8 {
        self.low_battery_threshold.min(100)
    }

    /// Interval between battery audits, at least one second
    pub fn battery_audit_interval(&self) -> Duration {
        Duration::from_secs(self.battery_audit_interval_secs.max(1))
    }

    /// Interval between automatic state advances, at least one second
    pub fn auto_transition_interval(&self) -> Duration {
        Duration::from_secs(self.auto_transition_interval_secs.max(1))
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            min_battery_level: 25,
            low_battery_threshold: 25,
            battery_audit_interval_secs: 60,
            auto_transition_interval_secs: 120,
            load_failure_policy: LoadFailurePolicy::Rollback,
        }
    }
}
