//! In-memory fakes shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;

use thermolink_domain::command::Command;
use thermolink_domain::error::{ActuatorError, ForbiddenError, NotFoundError, ThermostatError};
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::id::EntityRef;
use thermolink_domain::state::{ActuatorState, ManualSnapshot};
use thermolink_domain::status::UnitStatus;
use thermolink_domain::unit::UnitKind;

use crate::ports::{Actuator, CommandDispatcher};

pub fn entity(id: &str) -> EntityRef {
    EntityRef::new(id).unwrap()
}

/// Actuator keeping its values in memory, optionally rejecting one HVAC mode.
#[derive(Debug)]
pub struct FakeActuator {
    pub current: ActuatorState,
    pub sensor: Option<f64>,
    pub writes: usize,
    rejected_mode: Option<HvacMode>,
}

impl FakeActuator {
    pub fn new(temperature: f64, hvac_mode: HvacMode) -> Self {
        Self {
            current: ActuatorState::new(temperature, hvac_mode),
            sensor: None,
            writes: 0,
            rejected_mode: None,
        }
    }

    pub fn rejecting_mode(mut self, mode: HvacMode) -> Self {
        self.rejected_mode = Some(mode);
        self
    }
}

impl Actuator for FakeActuator {
    fn target_temperature(&self) -> f64 {
        self.current.temperature
    }

    fn hvac_mode(&self) -> HvacMode {
        self.current.hvac_mode
    }

    fn current_temperature(&self) -> Option<f64> {
        self.sensor
    }

    fn set_target_temperature(
        &mut self,
        temperature: f64,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        self.writes += 1;
        self.current.temperature = temperature;
        async { Ok(()) }
    }

    fn set_hvac_mode(
        &mut self,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        self.writes += 1;
        let result: Result<(), ThermostatError> = if self.rejected_mode == Some(mode) {
            Err(ActuatorError::Rejected {
                command: "set_hvac_mode",
                reason: format!("{mode} is broken"),
            }
            .into())
        } else {
            self.current.hvac_mode = mode;
            Ok(())
        };
        async { result }
    }
}

/// Dispatcher recording every delivered command, failing for chosen targets.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<(EntityRef, Command)>>,
    failing: HashSet<EntityRef>,
    statuses: HashMap<EntityRef, UnitStatus>,
}

impl RecordingDispatcher {
    pub fn failing_for(targets: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: targets.iter().map(|id| entity(id)).collect(),
            statuses: HashMap::new(),
        }
    }

    /// Answer status queries for `status.entity` with `status`.
    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.statuses.insert(status.entity.clone(), status);
        self
    }

    pub fn sent(&self) -> Vec<(EntityRef, Command)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.sent().into_iter().map(|(_, command)| command).collect()
    }
}

impl CommandDispatcher for RecordingDispatcher {
    fn dispatch(
        &self,
        target: &EntityRef,
        command: Command,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send {
        self.sent.lock().unwrap().push((target.clone(), command));
        let result: Result<UnitStatus, ThermostatError> = if self.failing.contains(target) {
            Err(ForbiddenError::SchedulerModeActive.into())
        } else {
            Ok(status_of(target))
        };
        async { result }
    }

    fn status(
        &self,
        target: &EntityRef,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send {
        let result: Result<UnitStatus, ThermostatError> = match self.statuses.get(target) {
            Some(status) => Ok(status.clone()),
            None => Err(NotFoundError {
                kind: "unit",
                id: target.to_string(),
            }
            .into()),
        };
        async { result }
    }
}

pub fn status_of(target: &EntityRef) -> UnitStatus {
    UnitStatus {
        entity: target.clone(),
        name: target.to_string(),
        kind: UnitKind::Enslaved,
        current_temperature: None,
        target_temperature: 20.0,
        hvac_mode: HvacMode::Heat,
        min_temp: 7.0,
        max_temp: 35.0,
        enslaved_mode: None,
        enslaved_target_temp: None,
        enslaved_hvac_mode: None,
        in_scheduler_mode: false,
        scheduler_previous_state: None,
        manual: ManualSnapshot::default(),
        handled_dependents: Vec::new(),
    }
}
