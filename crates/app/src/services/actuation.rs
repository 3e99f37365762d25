//! Snapshot capture, replay and rollback, written once against [`Actuator`].

use thermolink_domain::error::{ThermostatError, ValidationError};
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::state::{ActuatorState, ManualSnapshot};
use thermolink_domain::unit::Unit;

use crate::ports::Actuator;

/// Snapshot of the actuator's current setpoint and mode.
pub fn capture<A: Actuator>(actuator: &A) -> ManualSnapshot {
    ManualSnapshot::from_actuator(actuator.state())
}

/// Write the fields present in `snapshot`, setpoint first.
///
/// # Errors
///
/// Returns the first actuator failure.
pub async fn replay<A: Actuator>(
    actuator: &mut A,
    snapshot: ManualSnapshot,
) -> Result<(), ThermostatError> {
    if let Some(temperature) = snapshot.target_temp {
        actuator.set_target_temperature(temperature).await?;
    }
    if let Some(mode) = snapshot.hvac_mode {
        actuator.set_hvac_mode(mode).await?;
    }
    Ok(())
}

/// Write both fields of `state`, setpoint first.
///
/// # Errors
///
/// Returns the first actuator failure.
pub async fn apply<A: Actuator>(actuator: &mut A, state: ActuatorState) -> Result<(), ThermostatError> {
    actuator.set_target_temperature(state.temperature).await?;
    actuator.set_hvac_mode(state.hvac_mode).await
}

/// Write `target`; on failure write `fallback` back and return the original error.
///
/// A failing compensating write is logged and does not replace the error.
///
/// # Errors
///
/// Returns the actuator failure raised while writing `target`.
pub async fn apply_or_rollback<A: Actuator>(
    actuator: &mut A,
    target: ActuatorState,
    fallback: ActuatorState,
) -> Result<(), ThermostatError> {
    let Err(err) = apply(actuator, target).await else {
        return Ok(());
    };
    tracing::warn!(%err, "failed to apply state, restoring previous state");
    if let Err(rollback) = apply(actuator, fallback).await {
        tracing::error!(err = %rollback, "failed to restore previous state");
    }
    Err(err)
}

/// Validate the provided fields of a manual snapshot against `unit`.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] or
/// [`ValidationError::UnsupportedHvacMode`].
pub fn check_manual(
    unit: &Unit,
    temperature: Option<f64>,
    hvac_mode: Option<HvacMode>,
) -> Result<(), ValidationError> {
    if let Some(temperature) = temperature {
        unit.check_temperature(temperature)?;
    }
    if let Some(mode) = hvac_mode {
        unit.check_hvac_mode(mode)?;
    }
    Ok(())
}
