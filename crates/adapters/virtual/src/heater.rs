//! A simulated heater: setpoint, mode and a drifting sensor reading.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use thermolink_app::ports::Actuator;
use thermolink_domain::error::{ActuatorError, ThermostatError};
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::state::ActuatorState;
use thermolink_domain::unit::Unit;

/// Temperature the room drifts to while the heater is off.
const AMBIENT: f64 = 16.0;
/// Sensor change per simulation step, in degrees.
const STEP: f64 = 0.1;

#[derive(Debug)]
struct HeaterState {
    commanded: ActuatorState,
    sensor: f64,
    min_temp: f64,
    max_temp: f64,
    supported: BTreeSet<HvacMode>,
}

/// A simulated heater.
///
/// Clones share the same device: the unit owns one clone as its actuator,
/// the [`HeaterSimulation`](crate::HeaterSimulation) another to move the sensor.
#[derive(Debug, Clone)]
pub struct VirtualHeater {
    state: Arc<Mutex<HeaterState>>,
}

impl VirtualHeater {
    /// Heater accepting what `unit` accepts, starting at `commanded` with
    /// the sensor reading `sensor`.
    #[must_use]
    pub fn for_unit(unit: &Unit, commanded: ActuatorState, sensor: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeaterState {
                commanded,
                sensor,
                min_temp: unit.min_temp,
                max_temp: unit.max_temp,
                supported: unit.supported_hvac_modes.clone(),
            })),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut HeaterState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Current sensor reading.
    #[must_use]
    pub fn reading(&self) -> f64 {
        self.with_state(|state| state.sensor)
    }

    /// Advance the simulation by one step and return the new reading.
    ///
    /// Heating raises the reading toward the setpoint, cooling lowers it,
    /// and any other mode lets it drift toward the ambient temperature.
    pub fn tick(&self) -> f64 {
        self.with_state(|state| {
            let target = match state.commanded.hvac_mode {
                HvacMode::Heat if state.sensor < state.commanded.temperature => {
                    state.commanded.temperature
                }
                HvacMode::Cool if state.sensor > state.commanded.temperature => {
                    state.commanded.temperature
                }
                HvacMode::Heat | HvacMode::Cool => state.sensor,
                _ => AMBIENT,
            };
            let delta = (target - state.sensor).clamp(-STEP, STEP);
            state.sensor = ((state.sensor + delta) * 100.0).round() / 100.0;
            state.sensor
        })
    }
}

impl Actuator for VirtualHeater {
    fn target_temperature(&self) -> f64 {
        self.with_state(|state| state.commanded.temperature)
    }

    fn hvac_mode(&self) -> HvacMode {
        self.with_state(|state| state.commanded.hvac_mode)
    }

    fn current_temperature(&self) -> Option<f64> {
        Some(self.reading())
    }

    fn set_target_temperature(
        &mut self,
        temperature: f64,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        let result: Result<(), ThermostatError> = self.with_state(|state| {
            if (state.min_temp..=state.max_temp).contains(&temperature) {
                state.commanded.temperature = temperature;
                Ok(())
            } else {
                Err(ActuatorError::Rejected {
                    command: "set_target_temperature",
                    reason: format!(
                        "{temperature} outside [{}, {}]",
                        state.min_temp, state.max_temp
                    ),
                }
                .into())
            }
        });
        async { result }
    }

    fn set_hvac_mode(
        &mut self,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        let result: Result<(), ThermostatError> = self.with_state(|state| {
            if state.supported.contains(&mode) {
                state.commanded.hvac_mode = mode;
                Ok(())
            } else {
                Err(ActuatorError::Rejected {
                    command: "set_hvac_mode",
                    reason: format!("{mode} not supported"),
                }
                .into())
            }
        });
        async { result }
    }
}
