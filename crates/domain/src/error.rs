//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ThermostatError`] via `#[from]`. Validation failures, forbidden actions
//! and collaborator failures stay distinct so a caller can tell "bad input"
//! apart from "leave this mode first".

use crate::hvac::HvacMode;

/// Top-level error returned by every unit operation.
#[derive(Debug, thiserror::Error)]
pub enum ThermostatError {
    /// The request carried invalid input. Raised before any state mutation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The request is valid but not allowed in the unit's current mode.
    #[error("forbidden in current mode: {0}")]
    Forbidden(#[from] ForbiddenError),

    /// The targeted unit does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The physical actuator rejected a command.
    #[error("actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// A dependent unit rejected a propagated command.
    #[error(transparent)]
    Dependent(#[from] DependentError),

    /// The targeted unit exists but stopped processing commands.
    #[error("unit {entity} is unavailable")]
    Unavailable { entity: String },

    /// Persistence failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ThermostatError {
    /// Whether the error is a "leave this mode first" refusal.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Whether the error is a "bad input" refusal.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Invalid input or configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("unsupported enslaved mode {0:?}, must be one of auto, manual, off")]
    InvalidMode(String),

    #[error("unsupported HVAC mode {0:?}")]
    InvalidHvacMode(String),

    #[error("temperature {temperature} is out of range [{min}, {max}]")]
    OutOfRange { temperature: f64, min: f64, max: f64 },

    #[error("HVAC mode {mode} is not supported (supported: {supported})")]
    UnsupportedHvacMode { mode: HvacMode, supported: String },

    #[error("name must not be empty")]
    EmptyName,

    #[error("entity reference must not be empty")]
    EmptyEntityRef,

    #[error("invalid temperature range: min {min} must be lower than max {max}")]
    InvalidTemperatureRange { min: f64, max: f64 },

    #[error("at least one HVAC mode must be supported")]
    NoSupportedHvacModes,

    #[error("a virtual thermostat needs at least one enslaved thermostat")]
    EmptyDependents,

    #[error("unknown service {0:?}")]
    UnknownService(String),

    #[error("invalid {field}: {reason}")]
    InvalidPayload { field: &'static str, reason: String },
}

/// Actions refused because of the unit's current mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForbiddenError {
    #[error(
        "this thermostat is currently in scheduler mode, can't control it without leaving this mode first"
    )]
    SchedulerModeActive,

    #[error(
        "this thermostat is currently in enslaved force OFF mode, can't control it without leaving this mode first"
    )]
    ForcedOff,

    #[error("this thermostat is not currently in scheduler mode")]
    NotInSchedulerMode,
}

/// A referenced unit could not be found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} {id} not found")]
pub struct NotFoundError {
    pub kind: &'static str,
    pub id: String,
}

/// Failure reported by the actuator collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuatorError {
    #[error("actuator rejected {command}: {reason}")]
    Rejected {
        command: &'static str,
        reason: String,
    },

    #[error("actuator is unavailable")]
    Unavailable,
}

/// A dependent rejected a command sent by a virtual unit.
#[derive(Debug, thiserror::Error)]
#[error("dependent {entity} failed to handle {service}")]
pub struct DependentError {
    pub entity: String,
    pub service: &'static str,
    #[source]
    pub source: Box<ThermostatError>,
}
