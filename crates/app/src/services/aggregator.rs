//! The virtual reading of a master or schedulable unit.

use std::collections::BTreeMap;

use thermolink_domain::dependent::{DependentSet, DependentState, HandledPredicate};
use thermolink_domain::id::EntityRef;

/// Caches the latest reading of each handled dependent and averages them.
pub struct TemperatureAggregator {
    dependents: DependentSet,
    is_handled: HandledPredicate,
    readings: BTreeMap<EntityRef, f64>,
}

impl TemperatureAggregator {
    pub fn new(dependents: DependentSet, is_handled: HandledPredicate) -> Self {
        Self {
            dependents,
            is_handled,
            readings: BTreeMap::new(),
        }
    }

    /// Fold a notification into the cache.
    ///
    /// Returns `true` when the notification came from a dependent, whether
    /// or not the cache changed.
    pub fn observe(&mut self, state: &DependentState) -> bool {
        if !self.dependents.contains(&state.entity) {
            return false;
        }
        match state.current_temperature {
            Some(temperature) if (self.is_handled)(state) => {
                self.readings.insert(state.entity.clone(), temperature);
            }
            _ => {
                self.readings.remove(&state.entity);
            }
        }
        tracing::trace!(
            dependent = %state.entity,
            handled = self.readings.contains_key(&state.entity),
            "dependent state observed"
        );
        true
    }

    /// Mean of the cached readings, `None` when nothing is handled.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn current_temperature(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let sum: f64 = self.readings.values().sum();
        Some(sum / self.readings.len() as f64)
    }

    /// Dependents currently contributing to the reading.
    pub fn handled(&self) -> impl Iterator<Item = &EntityRef> {
        self.readings.keys()
    }
}
