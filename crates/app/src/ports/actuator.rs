//! Actuator port — the heater/cooler a unit drives.

use std::future::Future;

use thermolink_domain::error::ThermostatError;
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::state::ActuatorState;

/// Setpoint and HVAC mode control of a single heater.
///
/// Getters are synchronous: an actuator always knows its last commanded
/// values. Failures are reported as [`ThermostatError::Actuator`].
pub trait Actuator: Send {
    /// Current setpoint.
    fn target_temperature(&self) -> f64;

    /// Current HVAC mode.
    fn hvac_mode(&self) -> HvacMode;

    /// Temperature measured by the actuator's own sensor, if any.
    fn current_temperature(&self) -> Option<f64> {
        None
    }

    /// Both commanded values at once.
    fn state(&self) -> ActuatorState {
        ActuatorState::new(self.target_temperature(), self.hvac_mode())
    }

    /// Change the setpoint.
    fn set_target_temperature(
        &mut self,
        temperature: f64,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send;

    /// Change the HVAC mode.
    fn set_hvac_mode(
        &mut self,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send;
}
