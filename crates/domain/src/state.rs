//! Mode state of a unit: enslaved mode, manual snapshot and scheduler override.
//!
//! These are plain values. The transitions that mutate them live in the
//! application layer, which also talks to the actuator.

use serde::{Deserialize, Serialize};

use crate::hvac::HvacMode;
use crate::mode::EnslavedMode;

/// Setpoint and HVAC mode of an actuator at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub temperature: f64,
    pub hvac_mode: HvacMode,
}

impl ActuatorState {
    #[must_use]
    pub fn new(temperature: f64, hvac_mode: HvacMode) -> Self {
        Self {
            temperature,
            hvac_mode,
        }
    }
}

/// Last manually chosen setpoint and HVAC mode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ManualSnapshot {
    pub target_temp: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
}

impl ManualSnapshot {
    /// Snapshot holding both fields of `state`.
    #[must_use]
    pub fn from_actuator(state: ActuatorState) -> Self {
        Self {
            target_temp: Some(state.temperature),
            hvac_mode: Some(state.hvac_mode),
        }
    }

    /// Overwrite the fields that are provided, keep the others.
    pub fn merge(&mut self, target_temp: Option<f64>, hvac_mode: Option<HvacMode>) {
        if target_temp.is_some() {
            self.target_temp = target_temp;
        }
        if hvac_mode.is_some() {
            self.hvac_mode = hvac_mode;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_temp.is_none() && self.hvac_mode.is_none()
    }
}

/// Transient scheduler override. Active iff it holds the pre-override state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulerOverride(Option<ActuatorState>);

impl SchedulerOverride {
    /// Override restored from a persisted snapshot (`None` means inactive).
    #[must_use]
    pub fn from_previous(previous: Option<ActuatorState>) -> Self {
        Self(previous)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    /// State to restore when the override ends.
    #[must_use]
    pub fn previous(&self) -> Option<ActuatorState> {
        self.0
    }

    /// Start the override with `previous` as the state to restore.
    ///
    /// Returns `false`, keeping the stored snapshot, when already active:
    /// the first activation holds the true pre-override state.
    pub fn activate(&mut self, previous: ActuatorState) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(previous);
        true
    }

    /// End the override, returning the snapshot it held.
    pub fn clear(&mut self) -> Option<ActuatorState> {
        self.0.take()
    }
}

/// Enslaved-mode part of an enslaved unit's state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnslavedModeState {
    pub mode: EnslavedMode,
    pub target_temp: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
}

impl EnslavedModeState {
    #[must_use]
    pub fn new(mode: EnslavedMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Target to apply in auto mode, falling back to the actuator's current one.
    #[must_use]
    pub fn effective(&self, actuator: ActuatorState) -> ActuatorState {
        ActuatorState {
            temperature: self.target_temp.unwrap_or(actuator.temperature),
            hvac_mode: self.hvac_mode.unwrap_or(actuator.hvac_mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_first_snapshot_when_activated_twice() {
        let mut scheduler = SchedulerOverride::default();
        assert!(scheduler.activate(ActuatorState::new(20.0, HvacMode::Heat)));
        assert!(!scheduler.activate(ActuatorState::new(23.0, HvacMode::Heat)));
        assert_eq!(
            scheduler.previous(),
            Some(ActuatorState::new(20.0, HvacMode::Heat))
        );
    }

    #[test]
    fn should_become_inactive_when_cleared() {
        let mut scheduler = SchedulerOverride::default();
        scheduler.activate(ActuatorState::new(19.0, HvacMode::Off));
        assert_eq!(
            scheduler.clear(),
            Some(ActuatorState::new(19.0, HvacMode::Off))
        );
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.clear(), None);
    }

    #[test]
    fn should_merge_only_provided_manual_fields() {
        let mut manual = ManualSnapshot::from_actuator(ActuatorState::new(20.0, HvacMode::Heat));
        manual.merge(Some(18.5), None);
        assert_eq!(manual.target_temp, Some(18.5));
        assert_eq!(manual.hvac_mode, Some(HvacMode::Heat));
    }

    #[test]
    fn should_fall_back_to_actuator_for_unset_enslaved_fields() {
        let mut state = EnslavedModeState::new(EnslavedMode::Auto);
        state.target_temp = Some(22.0);
        let effective = state.effective(ActuatorState::new(20.0, HvacMode::Heat));
        assert_eq!(effective, ActuatorState::new(22.0, HvacMode::Heat));
    }

    #[test]
    fn should_serialize_inactive_override_as_null() {
        let json = serde_json::to_string(&SchedulerOverride::default()).unwrap();
        assert_eq!(json, "null");
    }
}
