//! Shared application state for axum handlers.

use std::sync::Arc;

use thermolink_app::event_bus::InProcessStateBus;
use thermolink_app::registry::UnitRegistry;

/// Application state shared across all axum handlers.
///
/// `Clone` only clones the `Arc` wrappers.
#[derive(Clone)]
pub struct AppState {
    /// Running units, addressed by entity reference.
    pub registry: Arc<UnitRegistry>,
    /// Bus the units publish their notifications on.
    pub bus: Arc<InProcessStateBus>,
}

impl AppState {
    pub fn new(registry: Arc<UnitRegistry>, bus: Arc<InProcessStateBus>) -> Self {
        Self { registry, bus }
    }
}
