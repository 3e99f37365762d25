//! Periodic sensor simulation of every virtual heater.

use std::time::Duration;

use tokio::task::JoinHandle;

use thermolink_app::runtime::UnitHandle;

use crate::heater::VirtualHeater;

/// Heaters to simulate, each with the unit reading it.
#[derive(Default)]
pub struct HeaterSimulation {
    heaters: Vec<(VirtualHeater, UnitHandle)>,
}

impl HeaterSimulation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `heater`, refreshing `unit` whenever its reading moves.
    pub fn add(&mut self, heater: VirtualHeater, unit: UnitHandle) {
        self.heaters.push((heater, unit));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heaters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heaters.is_empty()
    }

    /// Advance every heater by one step. Returns how many units were refreshed.
    pub async fn tick(&self) -> usize {
        let mut refreshed = 0;
        for (heater, unit) in &self.heaters {
            let before = heater.reading();
            let after = heater.tick();
            if (after - before).abs() < f64::EPSILON {
                continue;
            }
            match unit.refresh().await {
                Ok(()) => refreshed += 1,
                Err(err) => tracing::warn!(%err, entity = %unit.entity(), "failed to refresh unit"),
            }
        }
        refreshed
    }

    /// Run [`tick`](Self::tick) every `period` until the returned task is aborted.
    #[must_use]
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let refreshed = self.tick().await;
                tracing::trace!(refreshed, "simulation step");
            }
        })
    }
}
