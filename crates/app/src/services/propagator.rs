//! Fans a command out to every dependent of a virtual unit.

use thermolink_domain::command::Command;
use thermolink_domain::dependent::DependentSet;
use thermolink_domain::error::DependentError;
use thermolink_domain::id::EntityRef;

use crate::ports::CommandDispatcher;

/// Outcome of one propagation.
#[derive(Debug, Default)]
pub struct Propagation {
    pub delivered: Vec<EntityRef>,
    pub failed: Vec<DependentError>,
}

impl Propagation {
    /// Whether every dependent accepted the command.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends commands to a fixed, ordered set of dependents.
pub struct CommandPropagator<D> {
    source: EntityRef,
    dependents: DependentSet,
    dispatcher: D,
}

impl<D: CommandDispatcher> CommandPropagator<D> {
    pub fn new(source: EntityRef, dependents: DependentSet, dispatcher: D) -> Self {
        Self {
            source,
            dependents,
            dispatcher,
        }
    }

    pub fn dependents(&self) -> &DependentSet {
        &self.dependents
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Deliver `command` to each dependent in order.
    ///
    /// A failing dependent is logged and reported, and delivery continues
    /// with the next one.
    #[tracing::instrument(
        skip(self, command),
        fields(source = %self.source, service = command.service_name())
    )]
    pub async fn propagate(&self, command: Command) -> Propagation {
        let mut report = Propagation::default();
        for dependent in &self.dependents {
            match self.dispatcher.dispatch(dependent, command.clone()).await {
                Ok(_) => report.delivered.push(dependent.clone()),
                Err(err) => {
                    tracing::warn!(%err, %dependent, "dependent rejected propagated command");
                    report.failed.push(DependentError {
                        entity: dependent.to_string(),
                        service: command.service_name(),
                        source: Box::new(err),
                    });
                }
            }
        }
        report
    }
}
