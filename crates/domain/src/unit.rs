//! Unit — one climate-control entity and its operating bounds.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::hvac::HvacMode;
use crate::id::EntityRef;

/// What a unit controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Drives a physical heater from its own sensor.
    #[default]
    Enslaved,
    /// Mirrors setpoint and HVAC mode onto its dependents.
    Master,
    /// Drives scheduler overrides on its dependents.
    Schedulable,
}

impl UnitKind {
    /// Whether the unit has no actuator of its own.
    #[must_use]
    pub fn is_virtual(self) -> bool {
        !matches!(self, Self::Enslaved)
    }

    /// Name used when the configuration does not provide one.
    #[must_use]
    pub fn default_name(self) -> &'static str {
        match self {
            Self::Enslaved => "Enslaved Thermostat",
            Self::Master => "Master Thermostat",
            Self::Schedulable => "Schedulable Thermostat",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enslaved => "enslaved",
            Self::Master => "master",
            Self::Schedulable => "schedulable",
        })
    }
}

/// Static description of a unit: identity and operating bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub unique_id: EntityRef,
    pub name: String,
    pub kind: UnitKind,
    pub min_temp: f64,
    pub max_temp: f64,
    pub supported_hvac_modes: BTreeSet<HvacMode>,
}

impl Unit {
    /// Create a builder for constructing a [`Unit`].
    #[must_use]
    pub fn builder() -> UnitBuilder {
        UnitBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name is empty, the temperature
    /// range is empty or not finite, or no HVAC mode is supported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.min_temp.is_finite()
            || !self.max_temp.is_finite()
            || self.min_temp >= self.max_temp
        {
            return Err(ValidationError::InvalidTemperatureRange {
                min: self.min_temp,
                max: self.max_temp,
            });
        }
        if self.supported_hvac_modes.is_empty() {
            return Err(ValidationError::NoSupportedHvacModes);
        }
        Ok(())
    }

    /// Ensure `temperature` lies within `[min_temp, max_temp]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] otherwise (including NaN).
    pub fn check_temperature(&self, temperature: f64) -> Result<(), ValidationError> {
        if (self.min_temp..=self.max_temp).contains(&temperature) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                temperature,
                min: self.min_temp,
                max: self.max_temp,
            })
        }
    }

    /// Ensure `mode` is one of the supported HVAC modes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedHvacMode`] otherwise.
    pub fn check_hvac_mode(&self, mode: HvacMode) -> Result<(), ValidationError> {
        if self.supported_hvac_modes.contains(&mode) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedHvacMode {
                mode,
                supported: self
                    .supported_hvac_modes
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}

/// Step-by-step builder for [`Unit`].
#[derive(Debug, Default)]
pub struct UnitBuilder {
    unique_id: Option<EntityRef>,
    name: Option<String>,
    kind: UnitKind,
    min_temp: Option<f64>,
    max_temp: Option<f64>,
    supported_hvac_modes: BTreeSet<HvacMode>,
}

impl UnitBuilder {
    /// Default lower bound, in degrees.
    pub const DEFAULT_MIN_TEMP: f64 = 7.0;
    /// Default upper bound, in degrees.
    pub const DEFAULT_MAX_TEMP: f64 = 35.0;

    #[must_use]
    pub fn unique_id(mut self, unique_id: EntityRef) -> Self {
        self.unique_id = Some(unique_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: UnitKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn min_temp(mut self, min_temp: f64) -> Self {
        self.min_temp = Some(min_temp);
        self
    }

    #[must_use]
    pub fn max_temp(mut self, max_temp: f64) -> Self {
        self.max_temp = Some(max_temp);
        self
    }

    #[must_use]
    pub fn hvac_mode(mut self, mode: HvacMode) -> Self {
        self.supported_hvac_modes.insert(mode);
        self
    }

    #[must_use]
    pub fn hvac_modes(mut self, modes: impl IntoIterator<Item = HvacMode>) -> Self {
        self.supported_hvac_modes.extend(modes);
        self
    }

    /// Consume the builder, validate, and return a [`Unit`].
    ///
    /// Without an explicit name the kind's default name is used. Without
    /// explicit modes the unit supports `off` and `heat`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityRef`] if no unique id was given,
    /// or any error reported by [`Unit::validate`].
    pub fn build(self) -> Result<Unit, ValidationError> {
        let mut supported_hvac_modes = self.supported_hvac_modes;
        if supported_hvac_modes.is_empty() {
            supported_hvac_modes.extend([HvacMode::Off, HvacMode::Heat]);
        }
        let unit = Unit {
            unique_id: self.unique_id.ok_or(ValidationError::EmptyEntityRef)?,
            name: self
                .name
                .unwrap_or_else(|| self.kind.default_name().to_string()),
            kind: self.kind,
            min_temp: self.min_temp.unwrap_or(Self::DEFAULT_MIN_TEMP),
            max_temp: self.max_temp.unwrap_or(Self::DEFAULT_MAX_TEMP),
            supported_hvac_modes,
        };
        unit.validate()?;
        Ok(unit)
    }
}
