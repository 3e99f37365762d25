//! Deliver a command to a unit addressed by entity reference.

use std::future::Future;

use thermolink_domain::command::Command;
use thermolink_domain::error::ThermostatError;
use thermolink_domain::id::EntityRef;
use thermolink_domain::status::UnitStatus;

/// Routes commands to units.
pub trait CommandDispatcher {
    /// Deliver `command` to `target` and wait for it to be handled.
    ///
    /// Resolves to the target's status after the command.
    fn dispatch(
        &self,
        target: &EntityRef,
        command: Command,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send;

    /// Current status of `target`, without changing it.
    fn status(
        &self,
        target: &EntityRef,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send;
}

impl<T: CommandDispatcher + Send + Sync> CommandDispatcher for std::sync::Arc<T> {
    fn dispatch(
        &self,
        target: &EntityRef,
        command: Command,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send {
        (**self).dispatch(target, command)
    }

    fn status(
        &self,
        target: &EntityRef,
    ) -> impl Future<Output = Result<UnitStatus, ThermostatError>> + Send {
        (**self).status(target)
    }
}
