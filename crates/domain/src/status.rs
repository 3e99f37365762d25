//! Read model of a unit, as exposed to the host.

use serde::{Deserialize, Serialize};

use crate::dependent::DependentState;
use crate::hvac::HvacMode;
use crate::id::EntityRef;
use crate::mode::EnslavedMode;
use crate::state::{ActuatorState, ManualSnapshot};
use crate::unit::UnitKind;

/// Snapshot of everything observable about a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub entity: EntityRef,
    pub name: String,
    pub kind: UnitKind,
    pub current_temperature: Option<f64>,
    pub target_temperature: f64,
    pub hvac_mode: HvacMode,
    pub min_temp: f64,
    pub max_temp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enslaved_mode: Option<EnslavedMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enslaved_target_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enslaved_hvac_mode: Option<HvacMode>,
    pub in_scheduler_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_previous_state: Option<ActuatorState>,
    pub manual: ManualSnapshot,
    /// Dependents currently contributing to the reading (virtual units only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handled_dependents: Vec<EntityRef>,
}

impl UnitStatus {
    /// Notification peers subscribe to.
    ///
    /// Only enslaved units report the scheduler flag, since virtual units
    /// never hold an override themselves.
    #[must_use]
    pub fn to_dependent_state(&self) -> DependentState {
        DependentState {
            entity: self.entity.clone(),
            current_temperature: self.current_temperature,
            enslaved_mode: self.enslaved_mode,
            scheduler_active: self.enslaved_mode.map(|_| self.in_scheduler_mode),
        }
    }
}
