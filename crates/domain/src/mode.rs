//! Which signal source governs an enslaved unit's actuator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Enslaved mode of an enslaved thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnslavedMode {
    /// Follow the enslaved target temperature and HVAC mode set by a peer.
    Auto,
    /// Behave as a regular thermostat driven by the user.
    #[default]
    Manual,
    /// Force the heater off.
    Off,
}

impl EnslavedMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for EnslavedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnslavedMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            "off" => Ok(Self::Off),
            other => Err(ValidationError::InvalidMode(other.to_string())),
        }
    }
}
