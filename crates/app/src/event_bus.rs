//! In-process state bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use thermolink_domain::dependent::DependentState;
use thermolink_domain::error::ThermostatError;

use crate::ports::StatePublisher;

/// In-process bus carrying [`DependentState`] notifications, using a tokio
/// [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the notification is simply dropped).
pub struct InProcessStateBus {
    sender: broadcast::Sender<DependentState>,
}

impl InProcessStateBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to notifications on this bus.
    ///
    /// Returns a receiver that will get all notifications published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DependentState> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl StatePublisher for InProcessStateBus {
    fn publish(
        &self,
        state: DependentState,
    ) -> impl Future<Output = Result<(), ThermostatError>> + Send {
        // send only fails when nobody listens
        let _ = self.sender.send(state);
        async { Ok(()) }
    }
}
