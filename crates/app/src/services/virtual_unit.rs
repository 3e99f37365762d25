//! Virtual thermostat — master and schedulable units.
//!
//! A virtual unit has no heater. Its setpoint and mode live in a
//! [`FanoutActuator`] which forwards changes to the dependents, and its
//! current temperature is the average computed by a [`TemperatureAggregator`].

use thermolink_domain::command::Command;
use thermolink_domain::dependent::{DependentSet, DependentState, HandledPredicate};
use thermolink_domain::error::ThermostatError;
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::mode::EnslavedMode;
use thermolink_domain::record::PersistedRecord;
use thermolink_domain::state::{ActuatorState, ManualSnapshot};
use thermolink_domain::status::UnitStatus;
use thermolink_domain::unit::Unit;

use crate::ports::{Actuator, CommandDispatcher};
use crate::runtime::Thermostat;
use crate::services::actuation;
use crate::services::aggregator::TemperatureAggregator;
use crate::services::fanout::FanoutActuator;
use crate::services::propagator::CommandPropagator;

/// Master or schedulable unit commanding its dependents through `D`.
pub struct VirtualThermostat<D> {
    unit: Unit,
    actuator: FanoutActuator<D>,
    aggregator: TemperatureAggregator,
    manual: ManualSnapshot,
}

impl<D: CommandDispatcher + Send + Sync> VirtualThermostat<D> {
    /// Create a virtual unit starting at `initial`, counting the dependents
    /// for which `is_handled` holds in its reading.
    pub fn new(
        unit: Unit,
        dependents: DependentSet,
        dispatcher: D,
        initial: ActuatorState,
        is_handled: HandledPredicate,
    ) -> Self {
        let propagator =
            CommandPropagator::new(unit.unique_id.clone(), dependents.clone(), dispatcher);
        Self {
            actuator: FanoutActuator::new(unit.kind, initial, propagator),
            aggregator: TemperatureAggregator::new(dependents, is_handled),
            manual: ManualSnapshot::default(),
            unit,
        }
    }

    /// Seed the manual snapshot.
    #[must_use]
    pub fn with_manual(mut self, manual: ManualSnapshot) -> Self {
        self.manual = manual;
        self
    }

    /// Restore the manual snapshot and own setpoint without propagating.
    pub fn restore(&mut self, record: &PersistedRecord) {
        self.manual = ManualSnapshot {
            target_temp: record.manual_target_temp,
            hvac_mode: record.manual_hvac_mode,
        };
        if let Some(state) = record.actuator_state {
            self.actuator.restore(state);
        }
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn actuator(&self) -> &FanoutActuator<D> {
        &self.actuator
    }

    pub fn manual(&self) -> ManualSnapshot {
        self.manual
    }

    /// Fold a dependent notification into the virtual reading.
    pub fn observe(&mut self, state: &DependentState) -> bool {
        self.aggregator.observe(state)
    }

    /// Re-read every dependent's status into the virtual reading.
    ///
    /// Dependents that cannot be reached keep their cached reading.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn resync(&mut self) {
        let propagator = self.actuator.propagator();
        for dependent in propagator.dependents() {
            match propagator.dispatcher().status(dependent).await {
                Ok(status) => {
                    self.aggregator.observe(&status.to_dependent_state());
                }
                Err(err) => tracing::warn!(%dependent, %err, "failed to read dependent status"),
            }
        }
    }

    /// Change the own setpoint, fanning it out.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `temperature` is out of bounds.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_temperature(&mut self, temperature: f64) -> Result<(), ThermostatError> {
        self.unit.check_temperature(temperature)?;
        self.actuator.set_target_temperature(temperature).await
    }

    /// Change the own HVAC mode, fanning it out.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `mode` is unsupported.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_hvac_mode(&mut self, mode: HvacMode) -> Result<(), ThermostatError> {
        self.unit.check_hvac_mode(mode)?;
        self.actuator.set_hvac_mode(mode).await
    }

    /// Forward an enslaved mode to the dependents.
    ///
    /// Switching them to `manual` also hands them the given values, or the
    /// manual snapshot, as direct user actions. Otherwise the given values
    /// become the unit's own setpoint and mode.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a given value is out of bounds.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_enslaved_mode(
        &mut self,
        mode: Option<EnslavedMode>,
        temperature: Option<f64>,
        hvac_mode: Option<HvacMode>,
    ) -> Result<(), ThermostatError> {
        actuation::check_manual(&self.unit, temperature, hvac_mode)?;

        if let Some(mode) = mode {
            self.actuator
                .propagate(Command::SetEnslavedMode {
                    mode: Some(mode),
                    temperature: None,
                    hvac_mode: None,
                })
                .await;
            if mode == EnslavedMode::Manual {
                if let Some(temperature) = temperature.or(self.manual.target_temp) {
                    self.actuator
                        .propagate(Command::SetTemperature { temperature })
                        .await;
                }
                if let Some(hvac_mode) = hvac_mode.or(self.manual.hvac_mode) {
                    self.actuator
                        .propagate(Command::SetHvacMode { hvac_mode })
                        .await;
                }
                return Ok(());
            }
        }

        if let Some(temperature) = temperature {
            self.set_temperature(temperature).await?;
        }
        if let Some(hvac_mode) = hvac_mode {
            self.set_hvac_mode(hvac_mode).await?;
        }
        Ok(())
    }

    /// Put every dependent under a scheduler override, defaulting to the
    /// unit's own mode.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn start_scheduler_mode(&self, temperature: f64, hvac_mode: Option<HvacMode>) {
        let hvac_mode = hvac_mode.unwrap_or(self.actuator.hvac_mode());
        self.actuator
            .propagate(Command::StartSchedulerMode {
                temperature,
                hvac_mode: Some(hvac_mode),
            })
            .await;
    }

    /// End the scheduler override on every dependent.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn stop_scheduler_mode(&self) {
        self.actuator.propagate(Command::StopSchedulerMode).await;
    }

    /// Overwrite the provided fields of the manual snapshot.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a provided field is out of bounds.
    pub fn set_manual_state(
        &mut self,
        temperature: Option<f64>,
        hvac_mode: Option<HvacMode>,
    ) -> Result<(), ThermostatError> {
        actuation::check_manual(&self.unit, temperature, hvac_mode)?;
        self.manual.merge(temperature, hvac_mode);
        Ok(())
    }

    /// Re-apply the manual snapshot as own setpoint and mode.
    ///
    /// # Errors
    ///
    /// Propagates actuator failures.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn restore_manual_state(&mut self) -> Result<(), ThermostatError> {
        actuation::replay(&mut self.actuator, self.manual).await
    }

    /// Read model of the unit.
    pub fn status(&self) -> UnitStatus {
        UnitStatus {
            entity: self.unit.unique_id.clone(),
            name: self.unit.name.clone(),
            kind: self.unit.kind,
            current_temperature: self.aggregator.current_temperature(),
            target_temperature: self.actuator.target_temperature(),
            hvac_mode: self.actuator.hvac_mode(),
            min_temp: self.unit.min_temp,
            max_temp: self.unit.max_temp,
            enslaved_mode: None,
            enslaved_target_temp: None,
            enslaved_hvac_mode: None,
            in_scheduler_mode: false,
            scheduler_previous_state: None,
            manual: self.manual,
            handled_dependents: self.aggregator.handled().cloned().collect(),
        }
    }

    /// Record to persist.
    pub fn record(&self) -> PersistedRecord {
        PersistedRecord {
            manual_target_temp: self.manual.target_temp,
            manual_hvac_mode: self.manual.hvac_mode,
            actuator_state: Some(self.actuator.state()),
            ..PersistedRecord::default()
        }
    }
}

impl<D: CommandDispatcher + Send + Sync + 'static> Thermostat for VirtualThermostat<D> {
    fn unit(&self) -> &Unit {
        &self.unit
    }

    async fn handle(&mut self, command: Command) -> Result<(), ThermostatError> {
        match command {
            Command::SetEnslavedMode {
                mode,
                temperature,
                hvac_mode,
            } => self.set_enslaved_mode(mode, temperature, hvac_mode).await,
            Command::SetEnslavedTargetTemperature { temperature }
            | Command::SetTemperature { temperature } => self.set_temperature(temperature).await,
            Command::SetEnslavedHvacMode { hvac_mode } | Command::SetHvacMode { hvac_mode } => {
                self.set_hvac_mode(hvac_mode).await
            }
            Command::StartSchedulerMode {
                temperature,
                hvac_mode,
            } => {
                self.start_scheduler_mode(temperature, hvac_mode).await;
                Ok(())
            }
            Command::StopSchedulerMode => {
                self.stop_scheduler_mode().await;
                Ok(())
            }
            Command::SetManualState {
                temperature,
                hvac_mode,
            } => self.set_manual_state(temperature, hvac_mode),
            Command::RestoreManualState => self.restore_manual_state().await,
        }
    }

    fn observe(&mut self, state: &DependentState) -> bool {
        VirtualThermostat::observe(self, state)
    }

    async fn resync(&mut self) {
        VirtualThermostat::resync(self).await;
    }

    fn status(&self) -> UnitStatus {
        VirtualThermostat::status(self)
    }

    fn record(&self) -> PersistedRecord {
        VirtualThermostat::record(self)
    }

    fn restore(&mut self, record: &PersistedRecord) {
        VirtualThermostat::restore(self, record);
    }
}
