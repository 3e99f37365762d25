//! Durable record of each unit.

use std::future::Future;

use thermolink_domain::error::ThermostatError;
use thermolink_domain::id::EntityRef;
use thermolink_domain::record::PersistedRecord;

/// Loads and saves the [`PersistedRecord`] of a unit, keyed by unique id.
pub trait StateStore {
    /// Load the record saved for `unique_id`, if any.
    fn load(
        &self,
        unique_id: &EntityRef,
    ) -> impl Future<Output = Result<Option<PersistedRecord>, ThermostatError>> + Send;

    /// Insert or replace the record of `unique_id`.
    fn save(
        &self,
        unique_id: &EntityRef,
        record: &PersistedRecord,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send;
}

impl<T: StateStore + Send + Sync> StateStore for std::sync::Arc<T> {
    fn load(
        &self,
        unique_id: &EntityRef,
    ) -> impl Future<Output = Result<Option<PersistedRecord>, ThermostatError>> + Send {
        (**self).load(unique_id)
    }

    fn save(
        &self,
        unique_id: &EntityRef,
        record: &PersistedRecord,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        (**self).save(unique_id, record)
    }
}
