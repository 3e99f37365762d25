//! Unit registry — resolves entity references to running units.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use thermolink_domain::command::Command;
use thermolink_domain::error::{NotFoundError, ThermostatError};
use thermolink_domain::id::EntityRef;
use thermolink_domain::status::UnitStatus;

use crate::ports::CommandDispatcher;
use crate::runtime::UnitHandle;

/// Handles of every running unit, keyed by entity reference.
///
/// Virtual units dispatch to their dependents through the registry, so it is
/// shared behind an `Arc` and filled while the units are spawned.
#[derive(Default)]
pub struct UnitRegistry {
    units: RwLock<HashMap<EntityRef, UnitHandle>>,
}

impl UnitRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit, replacing a previous one with the same entity.
    pub fn register(&self, handle: UnitHandle) {
        let entity = handle.entity().clone();
        let previous = self
            .units
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.clone(), handle);
        if previous.is_some() {
            tracing::warn!(%entity, "unit registered twice, keeping the latest");
        }
    }

    /// Handle of the unit `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`ThermostatError::NotFound`] for an unknown entity.
    pub fn get(&self, entity: &EntityRef) -> Result<UnitHandle, ThermostatError> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .cloned()
            .ok_or_else(|| {
                NotFoundError {
                    kind: "unit",
                    id: entity.to_string(),
                }
                .into()
            })
    }

    /// Registered entities, sorted.
    pub fn entities(&self) -> Vec<EntityRef> {
        let mut entities: Vec<_> = self
            .units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        entities.sort();
        entities
    }

    fn handles(&self) -> Vec<UnitHandle> {
        let mut handles: Vec<_> = self
            .units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        handles.sort_by(|a, b| a.entity().cmp(b.entity()));
        handles
    }

    /// Status of the unit `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`ThermostatError::NotFound`] for an unknown entity, or
    /// [`ThermostatError::Unavailable`] when its task is gone.
    pub async fn status(&self, entity: &EntityRef) -> Result<UnitStatus, ThermostatError> {
        self.get(entity)?.status().await
    }

    /// Status of every running unit, sorted by entity. Units whose task is
    /// gone are skipped.
    pub async fn statuses(&self) -> Vec<UnitStatus> {
        let mut statuses = Vec::new();
        for handle in self.handles() {
            match handle.status().await {
                Ok(status) => statuses.push(status),
                Err(err) => tracing::warn!(%err, "skipping unit"),
            }
        }
        statuses
    }

    /// Ask every unit to publish its current state.
    pub async fn refresh_all(&self) {
        for handle in self.handles() {
            if let Err(err) = handle.refresh().await {
                tracing::warn!(%err, "failed to refresh unit");
            }
        }
    }
}

impl CommandDispatcher for UnitRegistry {
    fn dispatch(
        &self,
        target: &EntityRef,
        command: Command,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send {
        let handle = self.get(target);
        async move { handle?.call(command).await }
    }

    fn status(
        &self,
        target: &EntityRef,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send {
        let handle = self.get(target);
        async move { handle?.status().await }
    }
}
