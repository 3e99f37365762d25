//! Record persisted for each unit between restarts.

use serde::{Deserialize, Serialize};

use crate::hvac::HvacMode;
use crate::mode::EnslavedMode;
use crate::state::ActuatorState;

/// Durable state of a unit. Absent optionals decode to `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enslaved_mode: Option<EnslavedMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enslaved_target_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enslaved_hvac_mode: Option<HvacMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_previous_state: Option<ActuatorState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_target_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_hvac_mode: Option<HvacMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuator_state: Option<ActuatorState>,
}
