//! Publish dependent notifications.

use std::future::Future;

use thermolink_domain::dependent::DependentState;
use thermolink_domain::error::ThermostatError;

/// Publishes unit state changes to interested subscribers.
pub trait StatePublisher {
    /// Publish a notification to all current subscribers.
    fn publish(
        &self,
        state: DependentState,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send;
}

impl<T: StatePublisher + Send + Sync> StatePublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        state: DependentState,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        (**self).publish(state)
    }
}
