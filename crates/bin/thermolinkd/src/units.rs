//! Unit startup: one task per configured unit.

use std::sync::Arc;

use thermolink_adapter_http_axum::state::AppState;
use thermolink_adapter_virtual::{HeaterSimulation, VirtualHeater};
use thermolink_app::event_bus::InProcessStateBus;
use thermolink_app::persistence::Persistence;
use thermolink_app::ports::StateStore;
use thermolink_app::registry::UnitRegistry;
use thermolink_app::runtime::{self, UnitHandle, UnitTask};
use thermolink_app::services::enslaved::EnslavedThermostat;
use thermolink_app::services::virtual_unit::VirtualThermostat;
use thermolink_domain::dependent::{HandledPredicate, handled_by_master, handled_by_schedulable};
use thermolink_domain::error::ValidationError;
use thermolink_domain::mode::EnslavedMode;
use thermolink_domain::unit::UnitKind;

use crate::config::{ConfigError, UnitConfig};

const BUS_CAPACITY: usize = 256;

/// Every running unit, with the registry addressing them.
pub struct RunningUnits {
    registry: Arc<UnitRegistry>,
    bus: Arc<InProcessStateBus>,
    tasks: Vec<UnitTask>,
    simulation: HeaterSimulation,
}

impl RunningUnits {
    /// Spawn the units described by `configs`, restoring what `store` saved
    /// for them, then have every unit announce its state once all of them
    /// listen.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUnit`] for an entry that does not
    /// describe a valid unit.
    pub async fn start<S>(configs: &[UnitConfig], store: Arc<S>) -> Result<Self, ConfigError>
    where
        S: StateStore + Send + Sync + 'static,
    {
        let mut running = Self {
            registry: Arc::new(UnitRegistry::new()),
            bus: Arc::new(InProcessStateBus::new(BUS_CAPACITY)),
            tasks: Vec::with_capacity(configs.len()),
            simulation: HeaterSimulation::new(),
        };
        for config in configs {
            let (handle, task) = running
                .spawn(config, Persistence::new(store.clone()))
                .await
                .map_err(|source| ConfigError::InvalidUnit {
                    unit: config.unique_id.clone(),
                    source,
                })?;
            tracing::info!(entity = %handle.entity(), kind = %config.kind, "unit started");
            running.registry.register(handle);
            running.tasks.push(task);
        }
        running.registry.refresh_all().await;
        Ok(running)
    }

    async fn spawn<S>(
        &mut self,
        config: &UnitConfig,
        persistence: Persistence<S>,
    ) -> Result<(UnitHandle, UnitTask), ValidationError>
    where
        S: StateStore + Send + Sync + 'static,
    {
        let unit = config.unit()?;
        let record = persistence.load(&unit).await;
        let commanded = record
            .as_ref()
            .and_then(|record| record.actuator_state)
            .unwrap_or_else(|| config.initial_state());

        let is_handled: HandledPredicate = match config.kind {
            UnitKind::Enslaved => {
                let sensor = config.initial_temperature.unwrap_or(commanded.temperature);
                let heater = VirtualHeater::for_unit(&unit, commanded, sensor);
                let mut thermostat = EnslavedThermostat::new(
                    unit,
                    heater.clone(),
                    config.initial_enslaved_mode.unwrap_or(EnslavedMode::Manual),
                )
                .with_manual(config.initial_manual());
                if let Some(record) = &record {
                    thermostat.restore(record);
                }
                let (handle, task) =
                    runtime::spawn(thermostat, persistence, self.bus.clone(), None);
                self.simulation.add(heater, handle.clone());
                return Ok((handle, task));
            }
            UnitKind::Master => handled_by_master,
            UnitKind::Schedulable => handled_by_schedulable,
        };

        let mut thermostat = VirtualThermostat::new(
            unit,
            config.dependents()?,
            self.registry.clone(),
            commanded,
            is_handled,
        )
        .with_manual(config.initial_manual());
        if let Some(record) = &record {
            thermostat.restore(record);
        }
        Ok(runtime::spawn(
            thermostat,
            persistence,
            self.bus.clone(),
            Some(self.bus.subscribe()),
        ))
    }

    /// State for the HTTP adapter.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState::new(self.registry.clone(), self.bus.clone())
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Hand the heater simulation over, e.g. to run it on a timer.
    pub fn take_simulation(&mut self) -> HeaterSimulation {
        std::mem::take(&mut self.simulation)
    }

    /// Stop every unit after the commands already queued.
    pub async fn shutdown(self) {
        for task in self.tasks {
            let entity = task.entity().clone();
            task.shutdown().await;
            tracing::debug!(%entity, "unit stopped");
        }
    }
}
