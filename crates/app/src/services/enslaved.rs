//! Enslaved thermostat — the mode state machine of a unit driving its own heater.
//!
//! The machine combines three pieces of state:
//! - the **enslaved mode** (`auto`, `manual`, `off`) with the enslaved
//!   target temperature and HVAC mode set by a peer,
//! - the **manual snapshot**, captured when leaving `manual` and replayed
//!   when coming back,
//! - the **scheduler override**, which suspends mode-driven actuation until
//!   it is stopped.
//!
//! Every operation validates its arguments before mutating anything.

use thermolink_domain::command::Command;
use thermolink_domain::error::{ForbiddenError, ThermostatError};
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::mode::EnslavedMode;
use thermolink_domain::record::PersistedRecord;
use thermolink_domain::state::{ActuatorState, EnslavedModeState, ManualSnapshot, SchedulerOverride};
use thermolink_domain::status::UnitStatus;
use thermolink_domain::unit::Unit;

use crate::ports::Actuator;
use crate::runtime::Thermostat;
use crate::services::actuation;

/// Enslaved unit driving the actuator `A`.
pub struct EnslavedThermostat<A> {
    unit: Unit,
    actuator: A,
    enslaved: EnslavedModeState,
    manual: ManualSnapshot,
    scheduler: SchedulerOverride,
}

impl<A: Actuator> EnslavedThermostat<A> {
    /// Create a unit in `initial_mode` with no override and an empty manual snapshot.
    pub fn new(unit: Unit, actuator: A, initial_mode: EnslavedMode) -> Self {
        Self {
            unit,
            actuator,
            enslaved: EnslavedModeState::new(initial_mode),
            manual: ManualSnapshot::default(),
            scheduler: SchedulerOverride::default(),
        }
    }

    /// Seed the manual snapshot.
    #[must_use]
    pub fn with_manual(mut self, manual: ManualSnapshot) -> Self {
        self.manual = manual;
        self
    }

    /// Restore mode, snapshot and override state from a persisted record.
    ///
    /// The actuator's own values are not touched: the caller seeds the
    /// actuator from [`PersistedRecord::actuator_state`] when it builds it.
    pub fn restore(&mut self, record: &PersistedRecord) {
        if let Some(mode) = record.enslaved_mode {
            self.enslaved.mode = mode;
        }
        self.enslaved.target_temp = record.enslaved_target_temp;
        self.enslaved.hvac_mode = record.enslaved_hvac_mode;
        self.manual = ManualSnapshot {
            target_temp: record.manual_target_temp,
            hvac_mode: record.manual_hvac_mode,
        };
        self.scheduler = SchedulerOverride::from_previous(record.scheduler_previous_state);
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub fn enslaved_mode(&self) -> EnslavedMode {
        self.enslaved.mode
    }

    pub fn manual(&self) -> ManualSnapshot {
        self.manual
    }

    pub fn scheduler_previous_state(&self) -> Option<ActuatorState> {
        self.scheduler.previous()
    }

    pub fn in_scheduler_mode(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Change the enslaved mode and/or the enslaved target, then reconcile
    /// the actuator with the resulting mode.
    ///
    /// Called with no arguments, only reconciles.
    ///
    /// # Errors
    ///
    /// Returns a validation error, leaving every state untouched, when
    /// `temperature` is out of range or `hvac_mode` is unsupported. Actuator
    /// failures are propagated.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_enslaved_mode(
        &mut self,
        mode: Option<EnslavedMode>,
        temperature: Option<f64>,
        hvac_mode: Option<HvacMode>,
    ) -> Result<(), ThermostatError> {
        actuation::check_manual(&self.unit, temperature, hvac_mode)?;

        if let Some(mode) = mode
            && mode != self.enslaved.mode
        {
            if self.enslaved.mode == EnslavedMode::Manual {
                self.manual = actuation::capture(&self.actuator);
            }
            tracing::debug!(from = %self.enslaved.mode, to = %mode, "enslaved mode changed");
            self.enslaved.mode = mode;
            if mode == EnslavedMode::Manual && !self.in_scheduler_mode() {
                actuation::replay(&mut self.actuator, self.manual).await?;
            }
        }

        if let Some(temperature) = temperature {
            self.set_enslaved_target_temp(temperature).await?;
        }
        if let Some(hvac_mode) = hvac_mode {
            self.set_enslaved_hvac_mode(hvac_mode).await?;
        }

        self.reconcile().await
    }

    /// Store the enslaved target temperature, pushing it to the actuator in
    /// `auto` mode outside an override.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`](thermolink_domain::error::ValidationError::OutOfRange)
    /// when `temperature` lies outside the unit's bounds.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_enslaved_target_temp(
        &mut self,
        temperature: f64,
    ) -> Result<(), ThermostatError> {
        self.unit.check_temperature(temperature)?;
        self.enslaved.target_temp = Some(temperature);
        if self.follows_enslaved_target() {
            self.actuator.set_target_temperature(temperature).await?;
        }
        Ok(())
    }

    /// Store the enslaved HVAC mode, pushing it to the actuator in `auto`
    /// mode outside an override.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedHvacMode`](thermolink_domain::error::ValidationError::UnsupportedHvacMode)
    /// when the unit does not support `mode`.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_enslaved_hvac_mode(&mut self, mode: HvacMode) -> Result<(), ThermostatError> {
        self.unit.check_hvac_mode(mode)?;
        self.enslaved.hvac_mode = Some(mode);
        if self.follows_enslaved_target() {
            self.actuator.set_hvac_mode(mode).await?;
        }
        Ok(())
    }

    /// Direct user setpoint change. Switches the unit to `manual`.
    ///
    /// # Errors
    ///
    /// Forbidden while an override is active or in `off` mode, then
    /// validated against the unit's bounds.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_temperature(&mut self, temperature: f64) -> Result<(), ThermostatError> {
        self.ensure_user_controllable()?;
        self.unit.check_temperature(temperature)?;
        self.actuator.set_target_temperature(temperature).await?;
        self.enter_manual_from_user();
        Ok(())
    }

    /// Direct user HVAC mode change. Switches the unit to `manual`.
    ///
    /// # Errors
    ///
    /// Forbidden while an override is active or in `off` mode, then
    /// validated against the supported modes.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn set_hvac_mode(&mut self, mode: HvacMode) -> Result<(), ThermostatError> {
        self.ensure_user_controllable()?;
        self.unit.check_hvac_mode(mode)?;
        self.actuator.set_hvac_mode(mode).await?;
        self.enter_manual_from_user();
        Ok(())
    }

    /// Apply a scheduler override, remembering the state to restore.
    ///
    /// Starting again while an override is active applies the new values
    /// but keeps the snapshot taken by the first start.
    ///
    /// # Errors
    ///
    /// Validation errors leave the actuator untouched. An actuator failure
    /// restores the pre-call state and is returned.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn start_scheduler_mode(
        &mut self,
        temperature: f64,
        hvac_mode: Option<HvacMode>,
    ) -> Result<(), ThermostatError> {
        let hvac_mode = hvac_mode.unwrap_or(HvacMode::Heat);
        self.unit.check_temperature(temperature)?;
        self.unit.check_hvac_mode(hvac_mode)?;

        let previous = self.actuator.state();
        actuation::apply_or_rollback(
            &mut self.actuator,
            ActuatorState::new(temperature, hvac_mode),
            previous,
        )
        .await?;

        if !self.scheduler.activate(previous) {
            tracing::debug!("scheduler override already active, keeping first snapshot");
        }
        self.set_enslaved_mode(None, None, None).await
    }

    /// End the scheduler override, restoring the state it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ForbiddenError::NotInSchedulerMode`] without an override.
    /// An actuator failure restores the pre-call state, keeps the override
    /// and is returned.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn stop_scheduler_mode(&mut self) -> Result<(), ThermostatError> {
        let Some(previous) = self.scheduler.previous() else {
            return Err(ForbiddenError::NotInSchedulerMode.into());
        };
        let current = self.actuator.state();
        actuation::apply_or_rollback(&mut self.actuator, previous, current).await?;
        self.scheduler.clear();
        Ok(())
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

    /// Switch to `manual` and replay the manual snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ForbiddenError::SchedulerModeActive`] while an override is
    /// active. Actuator failures are propagated.
    #[tracing::instrument(skip(self), fields(entity = %self.unit.unique_id))]
    pub async fn restore_manual_state(&mut self) -> Result<(), ThermostatError> {
        if self.in_scheduler_mode() {
            return Err(ForbiddenError::SchedulerModeActive.into());
        }
        if self.enslaved.mode == EnslavedMode::Manual {
            actuation::replay(&mut self.actuator, self.manual).await
        } else {
            self.set_enslaved_mode(Some(EnslavedMode::Manual), None, None)
                .await
        }
    }

    /// Read model of the unit.
    pub fn status(&self) -> UnitStatus {
        UnitStatus {
            entity: self.unit.unique_id.clone(),
            name: self.unit.name.clone(),
            kind: self.unit.kind,
            current_temperature: self.actuator.current_temperature(),
            target_temperature: self.actuator.target_temperature(),
            hvac_mode: self.actuator.hvac_mode(),
            min_temp: self.unit.min_temp,
            max_temp: self.unit.max_temp,
            enslaved_mode: Some(self.enslaved.mode),
            enslaved_target_temp: self.enslaved.target_temp,
            enslaved_hvac_mode: self.enslaved.hvac_mode,
            in_scheduler_mode: self.in_scheduler_mode(),
            scheduler_previous_state: self.scheduler.previous(),
            manual: self.manual,
            handled_dependents: Vec::new(),
        }
    }

    /// Record to persist.
    pub fn record(&self) -> PersistedRecord {
        PersistedRecord {
            enslaved_mode: Some(self.enslaved.mode),
            enslaved_target_temp: self.enslaved.target_temp,
            enslaved_hvac_mode: self.enslaved.hvac_mode,
            scheduler_previous_state: self.scheduler.previous(),
            manual_target_temp: self.manual.target_temp,
            manual_hvac_mode: self.manual.hvac_mode,
            actuator_state: Some(self.actuator.state()),
        }
    }

    fn follows_enslaved_target(&self) -> bool {
        self.enslaved.mode == EnslavedMode::Auto && !self.in_scheduler_mode()
    }

    fn ensure_user_controllable(&self) -> Result<(), ForbiddenError> {
        if self.in_scheduler_mode() {
            return Err(ForbiddenError::SchedulerModeActive);
        }
        if self.enslaved.mode == EnslavedMode::Off {
            return Err(ForbiddenError::ForcedOff);
        }
        Ok(())
    }

    /// A user action takes the unit to `manual` with the values the user just
    /// chose, which become the manual snapshot.
    fn enter_manual_from_user(&mut self) {
        if self.enslaved.mode != EnslavedMode::Manual {
            tracing::debug!(from = %self.enslaved.mode, "user action, switching to manual");
            self.enslaved.mode = EnslavedMode::Manual;
            self.manual = actuation::capture(&self.actuator);
        }
    }

    async fn reconcile(&mut self) -> Result<(), ThermostatError> {
        if self.in_scheduler_mode() {
            return Ok(());
        }
        match self.enslaved.mode {
            EnslavedMode::Auto => {
                let target = self.enslaved.effective(self.actuator.state());
                actuation::apply(&mut self.actuator, target).await
            }
            EnslavedMode::Off => self.actuator.set_hvac_mode(HvacMode::Off).await,
            EnslavedMode::Manual => Ok(()),
        }
    }
}

impl<A: Actuator + 'static> Thermostat for EnslavedThermostat<A> {
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
            Command::SetEnslavedTargetTemperature { temperature } => {
                self.set_enslaved_target_temp(temperature).await
            }
            Command::SetEnslavedHvacMode { hvac_mode } => {
                self.set_enslaved_hvac_mode(hvac_mode).await
            }
            Command::StartSchedulerMode {
                temperature,
                hvac_mode,
            } => self.start_scheduler_mode(temperature, hvac_mode).await,
            Command::StopSchedulerMode => self.stop_scheduler_mode().await,
            Command::SetManualState {
                temperature,
                hvac_mode,
            } => self.set_manual_state(temperature, hvac_mode),
            Command::RestoreManualState => self.restore_manual_state().await,
            Command::SetTemperature { temperature } => self.set_temperature(temperature).await,
            Command::SetHvacMode { hvac_mode } => self.set_hvac_mode(hvac_mode).await,
        }
    }

    fn status(&self) -> UnitStatus {
        EnslavedThermostat::status(self)
    }

    fn record(&self) -> PersistedRecord {
        EnslavedThermostat::record(self)
    }

    fn restore(&mut self, record: &PersistedRecord) {
        EnslavedThermostat::restore(self, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::{FakeActuator, entity};
    use thermolink_domain::error::ValidationError;

    fn bedroom() -> Unit {
        Unit::builder()
            .unique_id(entity("climate.bedroom"))
            .min_temp(16.0)
            .max_temp(24.0)
            .hvac_modes([HvacMode::Off, HvacMode::Heat])
            .build()
            .unwrap()
    }

    fn thermostat(mode: EnslavedMode) -> EnslavedThermostat<FakeActuator> {
        EnslavedThermostat::new(bedroom(), FakeActuator::new(20.0, HvacMode::Heat), mode)
    }

    fn at(temperature: f64, hvac_mode: HvacMode) -> ActuatorState {
        ActuatorState::new(temperature, hvac_mode)
    }

    #[tokio::test]
    async fn should_capture_manual_and_drive_actuator_when_switching_to_auto() {
        let mut unit = thermostat(EnslavedMode::Manual);

        unit.set_enslaved_mode(Some(EnslavedMode::Auto), Some(22.0), None)
            .await
            .unwrap();

        assert_eq!(unit.enslaved_mode(), EnslavedMode::Auto);
        assert_eq!(
            unit.manual(),
            ManualSnapshot::from_actuator(at(20.0, HvacMode::Heat))
        );
        assert_eq!(unit.actuator().state(), at(22.0, HvacMode::Heat));
    }

    #[tokio::test]
    async fn should_push_enslaved_target_in_auto_mode() {
        let mut unit = thermostat(EnslavedMode::Auto);

        unit.set_enslaved_target_temp(18.5).await.unwrap();

        assert_eq!(unit.actuator().target_temperature(), 18.5);
    }

    #[tokio::test]
    async fn should_store_but_not_push_enslaved_target_in_manual_mode() {
        let mut unit = thermostat(EnslavedMode::Manual);

        unit.set_enslaved_target_temp(18.5).await.unwrap();

        assert_eq!(unit.status().enslaved_target_temp, Some(18.5));
        assert_eq!(unit.actuator().target_temperature(), 20.0);
    }

    #[tokio::test]
    async fn should_leave_state_unchanged_when_enslaved_target_out_of_range() {
        let mut unit = thermostat(EnslavedMode::Auto);

        let result = unit.set_enslaved_target_temp(30.0).await;

        assert!(matches!(
            result,
            Err(ThermostatError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(unit.status().enslaved_target_temp, None);
        assert_eq!(unit.actuator().writes, 0);
    }

    #[tokio::test]
    async fn should_validate_every_argument_before_changing_mode() {
        let mut unit = thermostat(EnslavedMode::Manual);

        let result = unit
            .set_enslaved_mode(Some(EnslavedMode::Auto), Some(21.0), Some(HvacMode::Cool))
            .await;

        assert!(matches!(
            result,
            Err(ThermostatError::Validation(
                ValidationError::UnsupportedHvacMode { .. }
            ))
        ));
        assert_eq!(unit.enslaved_mode(), EnslavedMode::Manual);
        assert_eq!(unit.manual(), ManualSnapshot::default());
        assert_eq!(unit.actuator().writes, 0);
    }

    #[tokio::test]
    async fn should_force_hvac_off_in_off_mode() {
        let mut unit = thermostat(EnslavedMode::Manual);

        unit.set_enslaved_mode(Some(EnslavedMode::Off), None, None)
            .await
            .unwrap();

        assert_eq!(unit.actuator().state(), at(20.0, HvacMode::Off));
    }

    #[tokio::test]
    async fn should_replay_manual_snapshot_when_returning_to_manual() {
        let mut unit = thermostat(EnslavedMode::Manual);
        unit.set_enslaved_mode(Some(EnslavedMode::Auto), Some(23.0), None)
            .await
            .unwrap();

        unit.set_enslaved_mode(Some(EnslavedMode::Manual), None, None)
            .await
            .unwrap();

        assert_eq!(unit.actuator().state(), at(20.0, HvacMode::Heat));
    }

    #[tokio::test]
    async fn should_forbid_user_temperature_in_forced_off_mode() {
        let mut unit = thermostat(EnslavedMode::Off);

        let result = unit.set_temperature(21.0).await;

        assert!(matches!(
            result,
            Err(ThermostatError::Forbidden(ForbiddenError::ForcedOff))
        ));
        assert_eq!(unit.actuator().state(), at(20.0, HvacMode::Heat));
    }

    #[tokio::test]
    async fn should_check_forbidden_before_validation() {
        let mut unit = thermostat(EnslavedMode::Off);

        let result = unit.set_temperature(99.0).await;

        assert!(result.unwrap_err().is_forbidden());
    }

    #[tokio::test]
    async fn should_switch_to_manual_on_user_action() {
        let mut unit = thermostat(EnslavedMode::Auto);

        unit.set_temperature(17.0).await.unwrap();

        assert_eq!(unit.enslaved_mode(), EnslavedMode::Manual);
        assert_eq!(unit.actuator().state(), at(17.0, HvacMode::Heat));
        assert_eq!(unit.manual().target_temp, Some(17.0));
    }

    #[tokio::test]
    async fn should_forbid_user_hvac_mode_during_override() {
        let mut unit = thermostat(EnslavedMode::Manual);
        unit.start_scheduler_mode(23.0, None).await.unwrap();

        let result = unit.set_hvac_mode(HvacMode::Off).await;

        assert!(matches!(
            result,
            Err(ThermostatError::Forbidden(ForbiddenError::SchedulerModeActive))
        ));
    }

    #[tokio::test]
    async fn should_reject_out_of_range_scheduler_start_without_touching_actuator() {
        let mut unit = thermostat(EnslavedMode::Manual);

        let result = unit.start_scheduler_mode(25.0, None).await;

        assert!(matches!(
            result,
            Err(ThermostatError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(unit.actuator().state(), at(20.0, HvacMode::Heat));
        assert!(!unit.in_scheduler_mode());
    }

    #[tokio::test]
    async fn should_restore_first_snapshot_after_double_start() {
        let mut unit = thermostat(EnslavedMode::Manual);

        unit.start_scheduler_mode(23.0, None).await.unwrap();
        unit.start_scheduler_mode(18.0, Some(HvacMode::Heat))
            .await
            .unwrap();
        assert_eq!(unit.actuator().state(), at(18.0, HvacMode::Heat));

        unit.stop_scheduler_mode().await.unwrap();

        assert_eq!(unit.actuator().state(), at(20.0, HvacMode::Heat));
        assert!(!unit.in_scheduler_mode());
    }

    #[tokio::test]
    async fn should_roll_back_and_stay_inactive_when_scheduler_start_fails() {
        let mut unit = EnslavedThermostat::new(
            Unit::builder()
                .unique_id(entity("climate.bedroom"))
                .hvac_modes([HvacMode::Off, HvacMode::Heat, HvacMode::Cool])
                .build()
                .unwrap(),
            FakeActuator::new(20.0, HvacMode::Heat).rejecting_mode(HvacMode::Cool),
            EnslavedMode::Manual,
        );

        let result = unit.start_scheduler_mode(26.0, Some(HvacMode::Cool)).await;

        assert!(matches!(result, Err(ThermostatError::Actuator(_))));
        assert_eq!(unit.actuator().state(), at(20.0, HvacMode::Heat));
        assert!(!unit.in_scheduler_mode());
    }

    #[tokio::test]
    async fn should_rollback_and_keep_override_when_stop_fails() {
        let mut unit = EnslavedThermostat::new(
            bedroom(),
            FakeActuator::new(20.0, HvacMode::Off).rejecting_mode(HvacMode::Off),
            EnslavedMode::Manual,
        );
        unit.start_scheduler_mode(23.0, Some(HvacMode::Heat))
            .await
            .unwrap();

        let result = unit.stop_scheduler_mode().await;

        assert!(matches!(result, Err(ThermostatError::Actuator(_))));
        assert_eq!(unit.actuator().state(), at(23.0, HvacMode::Heat));
        assert!(unit.in_scheduler_mode());
        assert_eq!(
            unit.scheduler_previous_state(),
            Some(at(20.0, HvacMode::Off))
        );
    }

    #[tokio::test]
    async fn should_fail_stop_when_not_in_scheduler_mode() {
        let mut unit = thermostat(EnslavedMode::Manual);

        let result = unit.stop_scheduler_mode().await;

        assert!(matches!(
            result,
            Err(ThermostatError::Forbidden(ForbiddenError::NotInSchedulerMode))
        ));
        assert_eq!(unit.actuator().writes, 0);
    }

    #[tokio::test]
    async fn should_suspend_enslaved_commands_during_override() {
        let mut unit = thermostat(EnslavedMode::Auto);
        unit.start_scheduler_mode(23.0, None).await.unwrap();

        unit.set_enslaved_target_temp(17.0).await.unwrap();
        unit.set_enslaved_mode(Some(EnslavedMode::Off), None, None)
            .await
            .unwrap();

        assert_eq!(unit.actuator().state(), at(23.0, HvacMode::Heat));
        assert_eq!(unit.enslaved_mode(), EnslavedMode::Off);
    }

    #[tokio::test]
    async fn should_not_reconcile_after_stop() {
        let mut unit = thermostat(EnslavedMode::Auto);
        unit.start_scheduler_mode(23.0, None).await.unwrap();
        unit.set_enslaved_target_temp(17.0).await.unwrap();

        unit.stop_scheduler_mode().await.unwrap();

        assert_eq!(unit.actuator().state(), at(20.0, HvacMode::Heat));
    }

    #[tokio::test]
    async fn should_forbid_manual_restore_during_override() {
        let mut unit = thermostat(EnslavedMode::Manual);
        unit.start_scheduler_mode(23.0, None).await.unwrap();

        let result = unit.restore_manual_state().await;

        assert!(result.unwrap_err().is_forbidden());
    }

    #[tokio::test]
    async fn should_switch_to_manual_and_replay_on_restore() {
        let mut unit = thermostat(EnslavedMode::Auto);
        unit.set_manual_state(Some(18.0), Some(HvacMode::Off))
            .unwrap();

        unit.restore_manual_state().await.unwrap();

        assert_eq!(unit.enslaved_mode(), EnslavedMode::Manual);
        assert_eq!(unit.actuator().state(), at(18.0, HvacMode::Off));
    }

    #[tokio::test]
    async fn should_reject_invalid_manual_state() {
        let mut unit = thermostat(EnslavedMode::Manual);

        let result = unit.set_manual_state(Some(12.0), None);

        assert!(result.unwrap_err().is_validation());
        assert_eq!(unit.manual(), ManualSnapshot::default());
    }

    #[tokio::test]
    async fn should_roundtrip_through_persisted_record() {
        let mut unit = thermostat(EnslavedMode::Manual);
        unit.set_enslaved_mode(Some(EnslavedMode::Auto), Some(22.0), None)
            .await
            .unwrap();
        unit.start_scheduler_mode(23.0, None).await.unwrap();
        let record = unit.record();

        let mut restored = thermostat(EnslavedMode::Manual);
        restored.restore(&record);

        assert_eq!(restored.enslaved_mode(), EnslavedMode::Auto);
        assert_eq!(
            restored.scheduler_previous_state(),
            Some(at(22.0, HvacMode::Heat))
        );
        assert_eq!(restored.manual(), unit.manual());
        assert_eq!(restored.record().scheduler_previous_state, record.scheduler_previous_state);
    }
}
