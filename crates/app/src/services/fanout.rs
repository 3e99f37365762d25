//! Fan-out actuator — how a virtual unit "drives a heater": it keeps its own
//! setpoint and mode and forwards the kind-specific command to its dependents.

use std::future::Future;

use thermolink_domain::command::Command;
use thermolink_domain::error::ThermostatError;
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::state::ActuatorState;
use thermolink_domain::unit::UnitKind;

use crate::ports::{Actuator, CommandDispatcher};
use crate::services::propagator::{CommandPropagator, Propagation};

/// [`Actuator`] of master and schedulable units.
///
/// - master: a new setpoint becomes `set_enslaved_target_temperature`, a new
///   mode `set_enslaved_hvac_mode`.
/// - schedulable: a new setpoint becomes `start_scheduler_mode` unless the
///   unit is off; mode `off` becomes `stop_scheduler_mode`, any other mode
///   `start_scheduler_mode` with the unit's setpoint.
pub struct FanoutActuator<D> {
    kind: UnitKind,
    state: ActuatorState,
    propagator: CommandPropagator<D>,
}

impl<D: CommandDispatcher + Send + Sync> FanoutActuator<D> {
    pub fn new(kind: UnitKind, state: ActuatorState, propagator: CommandPropagator<D>) -> Self {
        Self {
            kind,
            state,
            propagator,
        }
    }

    /// Overwrite setpoint and mode without notifying the dependents.
    pub fn restore(&mut self, state: ActuatorState) {
        self.state = state;
    }

    pub fn propagator(&self) -> &CommandPropagator<D> {
        &self.propagator
    }

    /// Send `command` to every dependent.
    pub async fn propagate(&self, command: Command) -> Propagation {
        self.propagator.propagate(command).await
    }

    fn on_temperature(&self) -> Option<Command> {
        match self.kind {
            UnitKind::Master => Some(Command::SetEnslavedTargetTemperature {
                temperature: self.state.temperature,
            }),
            UnitKind::Schedulable if self.state.hvac_mode != HvacMode::Off => {
                Some(self.start_scheduler())
            }
            UnitKind::Schedulable | UnitKind::Enslaved => None,
        }
    }

    fn on_hvac_mode(&self) -> Option<Command> {
        match self.kind {
            UnitKind::Master => Some(Command::SetEnslavedHvacMode {
                hvac_mode: self.state.hvac_mode,
            }),
            UnitKind::Schedulable if self.state.hvac_mode == HvacMode::Off => {
                Some(Command::StopSchedulerMode)
            }
            UnitKind::Schedulable => Some(self.start_scheduler()),
            UnitKind::Enslaved => None,
        }
    }

    fn start_scheduler(&self) -> Command {
        Command::StartSchedulerMode {
            temperature: self.state.temperature,
            hvac_mode: Some(self.state.hvac_mode),
        }
    }

    async fn forward(&self, command: Option<Command>) {
        if let Some(command) = command {
            self.propagate(command).await;
        }
    }
}

impl<D: CommandDispatcher + Send + Sync> Actuator for FanoutActuator<D> {
    fn target_temperature(&self) -> f64 {
        self.state.temperature
    }

    fn hvac_mode(&self) -> HvacMode {
        self.state.hvac_mode
    }

    fn set_target_temperature(
        &mut self,
        temperature: f64,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        self.state.temperature = temperature;
        let command = self.on_temperature();
        async move {
            self.forward(command).await;
            Ok(())
        }
    }

    fn set_hvac_mode(
        &mut self,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        self.state.hvac_mode = mode;
        let command = self.on_hvac_mode();
        async move {
            self.forward(command).await;
            Ok(())
        }
    }
}
