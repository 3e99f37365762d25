//! Loads a unit's record once and saves it after each command.

use thermolink_domain::hvac::HvacMode;
use thermolink_domain::id::EntityRef;
use thermolink_domain::record::PersistedRecord;
use thermolink_domain::state::ActuatorState;
use thermolink_domain::unit::Unit;

use crate::ports::StateStore;

/// Wraps a [`StateStore`] with the policy used by unit actors: storage
/// failures are logged and never fail a command.
pub struct Persistence<S> {
    store: S,
}

impl<S: StateStore + Sync> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the record of `unit`, treating a failure like a missing record.
    ///
    /// The record is fitted to the unit's current bounds, which may have
    /// narrowed since it was saved: out-of-range targets and unsupported
    /// modes are dropped, saved setpoints are clamped.
    pub async fn load(&self, unit: &Unit) -> Option<PersistedRecord> {
        match self.store.load(&unit.unique_id).await {
            Ok(record) => record.map(|record| fit_to_unit(unit, record)),
            Err(err) => {
                tracing::error!(%err, entity = %unit.unique_id, "failed to load persisted state");
                None
            }
        }
    }

    /// Save the record of `unique_id`.
    pub async fn save(&self, unique_id: &EntityRef, record: &PersistedRecord) {
        if let Err(err) = self.store.save(unique_id, record).await {
            tracing::error!(%err, entity = %unique_id, "failed to save state");
        }
    }
}

fn fit_to_unit(unit: &Unit, mut record: PersistedRecord) -> PersistedRecord {
    record.enslaved_target_temp =
        checked_temperature(unit, "enslaved_target_temp", record.enslaved_target_temp);
    record.enslaved_hvac_mode =
        checked_mode(unit, "enslaved_hvac_mode", record.enslaved_hvac_mode);
    record.manual_target_temp =
        checked_temperature(unit, "manual_target_temp", record.manual_target_temp);
    record.manual_hvac_mode = checked_mode(unit, "manual_hvac_mode", record.manual_hvac_mode);
    record.scheduler_previous_state = clamped_state(
        unit,
        "scheduler_previous_state",
        record.scheduler_previous_state,
    );
    record.actuator_state = clamped_state(unit, "actuator_state", record.actuator_state);
    record
}

fn checked_temperature(unit: &Unit, field: &'static str, value: Option<f64>) -> Option<f64> {
    let temperature = value?;
    match unit.check_temperature(temperature) {
        Ok(()) => Some(temperature),
        Err(err) => {
            tracing::warn!(entity = %unit.unique_id, field, %err, "dropping restored value");
            None
        }
    }
}

fn checked_mode(unit: &Unit, field: &'static str, value: Option<HvacMode>) -> Option<HvacMode> {
    let mode = value?;
    match unit.check_hvac_mode(mode) {
        Ok(()) => Some(mode),
        Err(err) => {
            tracing::warn!(entity = %unit.unique_id, field, %err, "dropping restored value");
            None
        }
    }
}

fn clamped_state(
    unit: &Unit,
    field: &'static str,
    value: Option<ActuatorState>,
) -> Option<ActuatorState> {
    let state = value?;
    let hvac_mode = checked_mode(unit, field, Some(state.hvac_mode))?;
    if let Err(err) = unit.check_temperature(state.temperature) {
        tracing::warn!(entity = %unit.unique_id, field, %err, "clamping restored setpoint");
    }
    let temperature = state.temperature.clamp(unit.min_temp, unit.max_temp);
    Some(ActuatorState::new(temperature, hvac_mode))
}
