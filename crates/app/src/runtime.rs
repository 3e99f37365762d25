//! Unit runtime — every unit runs as one tokio task owning its state.
//!
//! Commands reach the task through an mpsc mailbox and are answered on a
//! oneshot channel, so a unit handles one command at a time. Virtual units
//! also consume dependent notifications from the state bus in the same
//! task. After each command the unit's record is saved and, when its status
//! changed, a notification is published.

use std::future::Future;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use thermolink_domain::command::Command;
use thermolink_domain::dependent::DependentState;
use thermolink_domain::error::ThermostatError;
use thermolink_domain::id::EntityRef;
use thermolink_domain::record::PersistedRecord;
use thermolink_domain::status::UnitStatus;
use thermolink_domain::unit::Unit;

use crate::persistence::Persistence;
use crate::ports::{StatePublisher, StateStore};

const MAILBOX_CAPACITY: usize = 32;

/// Behavior shared by every unit kind, as driven by its task.
pub trait Thermostat: Send + 'static {
    fn unit(&self) -> &Unit;

    /// Handle one command.
    fn handle(
        &mut self,
        command: Command,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send;

    /// Fold a dependent notification. Returns `true` when it was relevant.
    fn observe(&mut self, _state: &DependentState) -> bool {
        false
    }

    /// Rebuild whatever was derived from dependent notifications, after
    /// some of them were missed.
    fn resync(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn status(&self) -> UnitStatus;

    fn record(&self) -> PersistedRecord;

    /// Restore the state saved in `record`, without side effects.
    fn restore(&mut self, record: &PersistedRecord);
}

enum Message {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<UnitStatus, ThermostatError>>,
    },
    Status(oneshot::Sender<UnitStatus>),
    Refresh,
    Shutdown,
}

/// Cloneable address of a running unit.
#[derive(Clone)]
pub struct UnitHandle {
    entity: EntityRef,
    sender: mpsc::Sender<Message>,
}

impl UnitHandle {
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// Send `command` and wait for the unit's status after handling it.
    ///
    /// # Errors
    ///
    /// Returns the unit's own error, or [`ThermostatError::Unavailable`]
    /// when the unit task is gone.
    pub async fn call(&self, command: Command) -> Result<UnitStatus, ThermostatError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Message::Command { command, reply })
            .await
            .map_err(|_| self.unavailable())?;
        response.await.map_err(|_| self.unavailable())?
    }

    /// Current status of the unit.
    ///
    /// # Errors
    ///
    /// Returns [`ThermostatError::Unavailable`] when the unit task is gone.
    pub async fn status(&self) -> Result<UnitStatus, ThermostatError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Message::Status(reply))
            .await
            .map_err(|_| self.unavailable())?;
        response.await.map_err(|_| self.unavailable())
    }

    /// Ask the unit to publish its current state, e.g. after its sensor moved.
    ///
    /// # Errors
    ///
    /// Returns [`ThermostatError::Unavailable`] when the unit task is gone.
    pub async fn refresh(&self) -> Result<(), ThermostatError> {
        self.sender
            .send(Message::Refresh)
            .await
            .map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> ThermostatError {
        ThermostatError::Unavailable {
            entity: self.entity.to_string(),
        }
    }
}

/// Ownership of a running unit task. Dropping it aborts the task.
pub struct UnitTask {
    entity: EntityRef,
    sender: mpsc::Sender<Message>,
    join: Option<JoinHandle<()>>,
}

impl UnitTask {
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// Stop the unit after the commands already queued, and wait for it.
    pub async fn shutdown(mut self) {
        let _ = self.sender.send(Message::Shutdown).await;
        if let Some(join) = self.join.take()
            && let Err(err) = join.await
        {
            tracing::warn!(%err, entity = %self.entity, "unit task ended abnormally");
        }
    }
}

impl Drop for UnitTask {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
            tracing::debug!(entity = %self.entity, "unit task aborted");
        }
    }
}

/// Start `thermostat` on its own task.
///
/// `notifications` is the state bus subscription of a virtual unit, `None`
/// for units that do not watch dependents. It is dropped with the task.
pub fn spawn<T, S, P>(
    thermostat: T,
    persistence: Persistence<S>,
    publisher: P,
    notifications: Option<broadcast::Receiver<DependentState>>,
) -> (UnitHandle, UnitTask)
where
    T: Thermostat,
    S: StateStore + Send + Sync + 'static,
    P: StatePublisher + Send + Sync + 'static,
{
    let entity = thermostat.unit().unique_id.clone();
    let (sender, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
    let actor = UnitActor {
        thermostat,
        persistence,
        publisher,
        last_published: None,
    };
    let join = tokio::spawn(actor.run(mailbox, notifications));
    tracing::debug!(%entity, "unit task started");

    (
        UnitHandle {
            entity: entity.clone(),
            sender: sender.clone(),
        },
        UnitTask {
            entity,
            sender,
            join: Some(join),
        },
    )
}

struct UnitActor<T, S, P> {
    thermostat: T,
    persistence: Persistence<S>,
    publisher: P,
    last_published: Option<DependentState>,
}

impl<T, S, P> UnitActor<T, S, P>
where
    T: Thermostat,
    S: StateStore + Send + Sync + 'static,
    P: StatePublisher + Send + Sync + 'static,
{
    #[tracing::instrument(
        name = "unit",
        skip_all,
        fields(entity = %self.thermostat.unit().unique_id)
    )]
    async fn run(
        mut self,
        mut mailbox: mpsc::Receiver<Message>,
        mut notifications: Option<broadcast::Receiver<DependentState>>,
    ) {
        self.announce(false).await;
        loop {
            tokio::select! {
                message = mailbox.recv() => {
                    let Some(message) = message else { break };
                    match message {
                        Message::Command { command, reply } => {
                            let result = self.execute(command).await;
                            let _ = reply.send(result);
                        }
                        Message::Status(reply) => {
                            let _ = reply.send(self.thermostat.status());
                        }
                        Message::Refresh => self.announce(true).await,
                        Message::Shutdown => break,
                    }
                }
                notification = next_notification(&mut notifications) => {
                    match notification {
                        Ok(state) => {
                            if self.thermostat.observe(&state) {
                                self.announce(false).await;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "state bus lagged, resynchronizing dependents");
                            if let Some(receiver) = notifications.as_mut() {
                                drain(receiver);
                            }
                            self.thermostat.resync().await;
                            self.announce(false).await;
                        }
                        Err(RecvError::Closed) => {
                            tracing::debug!("state bus closed");
                            notifications = None;
                        }
                    }
                }
            }
        }
        tracing::debug!("unit task stopped");
    }

    async fn execute(&mut self, command: Command) -> Result<UnitStatus, ThermostatError> {
        let service = command.service_name();
        let result = self.thermostat.handle(command).await;
        match &result {
            Ok(()) => tracing::debug!(service, "command handled"),
            Err(err) => tracing::debug!(service, %err, "command rejected"),
        }

        let entity = self.thermostat.unit().unique_id.clone();
        self.persistence
            .save(&entity, &self.thermostat.record())
            .await;
        self.announce(false).await;

        result.map(|()| self.thermostat.status())
    }

    /// Publish the unit's notification when it changed, or always when `force`.
    async fn announce(&mut self, force: bool) {
        let state = self.thermostat.status().to_dependent_state();
        if !force && self.last_published.as_ref() == Some(&state) {
            return;
        }
        if let Err(err) = self.publisher.publish(state.clone()).await {
            tracing::warn!(%err, "failed to publish unit state");
        }
        self.last_published = Some(state);
    }
}

/// Discard the backlog; a resync reads newer state than any of it.
fn drain(receiver: &mut broadcast::Receiver<DependentState>) {
    loop {
        match receiver.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

async fn next_notification(
    notifications: &mut Option<broadcast::Receiver<DependentState>>,
) -> Result<DependentState, RecvError> {
    match notifications {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use thermolink_domain::hvac::HvacMode;
    use thermolink_domain::mode::EnslavedMode;

    use super::*;
    use crate::event_bus::InProcessStateBus;
    use crate::persistence::tests::InMemoryStateStore;
    use crate::services::enslaved::EnslavedThermostat;
    use crate::services::fakes::{FakeActuator, entity};

    fn office() -> EnslavedThermostat<FakeActuator> {
        let unit = Unit::builder()
            .unique_id(entity("climate.office"))
            .build()
            .unwrap();
        let mut actuator = FakeActuator::new(20.0, HvacMode::Heat);
        actuator.sensor = Some(19.0);
        EnslavedThermostat::new(unit, actuator, EnslavedMode::Manual)
    }

    #[tokio::test]
    async fn should_answer_commands_with_new_status() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let store = Arc::new(InMemoryStateStore::default());
        let (handle, task) = spawn(office(), Persistence::new(store.clone()), bus, None);

        let status = handle
            .call(Command::SetTemperature { temperature: 22.0 })
            .await
            .unwrap();

        assert!((status.target_temperature - 22.0).abs() < f64::EPSILON);
        task.shutdown().await;
    }

    #[tokio::test]
    async fn should_save_record_after_each_command() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let store = Arc::new(InMemoryStateStore::default());
        let (handle, task) = spawn(office(), Persistence::new(store.clone()), bus, None);

        handle
            .call(Command::SetEnslavedMode {
                mode: Some(EnslavedMode::Off),
                temperature: None,
                hvac_mode: None,
            })
            .await
            .unwrap();

        let saved = store.records.lock().unwrap()[&entity("climate.office")].clone();
        assert_eq!(saved.enslaved_mode, Some(EnslavedMode::Off));
        task.shutdown().await;
    }

    #[tokio::test]
    async fn should_return_unit_error_to_caller() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let store = Arc::new(InMemoryStateStore::default());
        let (handle, task) = spawn(office(), Persistence::new(store), bus, None);

        let result = handle.call(Command::StopSchedulerMode).await;

        assert!(result.unwrap_err().is_forbidden());
        task.shutdown().await;
    }

    #[tokio::test]
    async fn should_publish_state_after_change() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let mut rx = bus.subscribe();
        let store = Arc::new(InMemoryStateStore::default());
        let (handle, task) = spawn(office(), Persistence::new(store), bus.clone(), None);

        let initial = rx.recv().await.unwrap();
        assert_eq!(initial.enslaved_mode, Some(EnslavedMode::Manual));

        handle
            .call(Command::StartSchedulerMode {
                temperature: 23.0,
                hvac_mode: None,
            })
            .await
            .unwrap();

        let changed = rx.recv().await.unwrap();
        assert_eq!(changed.scheduler_active, Some(true));
        assert_eq!(changed.current_temperature, Some(19.0));
        task.shutdown().await;
    }

    #[tokio::test]
    async fn should_report_unavailable_after_shutdown() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let store = Arc::new(InMemoryStateStore::default());
        let (handle, task) = spawn(office(), Persistence::new(store), bus, None);

        task.shutdown().await;

        let result = handle.status().await;
        assert!(matches!(result, Err(ThermostatError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn should_release_subscription_when_task_is_dropped() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let store = Arc::new(InMemoryStateStore::default());
        let (_handle, task) = spawn(
            office(),
            Persistence::new(store),
            bus.clone(),
            Some(bus.subscribe()),
        );

        drop(task);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(bus.receiver_count(), 0);
    }
}
