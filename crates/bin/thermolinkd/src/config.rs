//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads `thermolink.toml` from the working directory, or the file named by
//! `THERMOLINK_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use thermolink_domain::dependent::DependentSet;
use thermolink_domain::error::ValidationError;
use thermolink_domain::hvac::HvacMode;
use thermolink_domain::id::EntityRef;
use thermolink_domain::mode::EnslavedMode;
use thermolink_domain::state::{ActuatorState, ManualSnapshot};
use thermolink_domain::unit::{Unit, UnitBuilder, UnitKind};

const DEFAULT_PATH: &str = "thermolink.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Heater simulation settings.
    pub simulation: SimulationConfig,
    /// Units to run.
    pub units: Vec<UnitConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Milliseconds a write waits on a locked database.
    pub busy_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Heater simulation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds between two simulation steps.
    pub tick_secs: u64,
}

/// One `[[units]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    pub unique_id: String,
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: UnitKind,
    #[serde(default = "default_min_temp")]
    pub min_temp: f64,
    #[serde(default = "default_max_temp")]
    pub max_temp: f64,
    /// Initial setpoint. Defaults to `min_temp`, or `max_temp` with `ac_mode`.
    pub target_temp: Option<f64>,
    /// The heater cools instead of heating.
    #[serde(default)]
    pub ac_mode: bool,
    pub initial_hvac_mode: Option<HvacMode>,
    /// Defaults to `off` and `heat` (`cool` with `ac_mode`).
    pub hvac_modes: Option<Vec<HvacMode>>,
    pub initial_enslaved_mode: Option<EnslavedMode>,
    pub initial_manual_target_temp: Option<f64>,
    pub initial_manual_hvac_mode: Option<HvacMode>,
    /// Dependents of a master or schedulable unit.
    #[serde(default)]
    pub enslaved_thermostats: Vec<String>,
    /// Starting reading of the simulated sensor. Defaults to the setpoint.
    pub initial_temperature: Option<f64>,
}

fn default_min_temp() -> f64 {
    UnitBuilder::DEFAULT_MIN_TEMP
}

fn default_max_temp() -> f64 {
    UnitBuilder::DEFAULT_MAX_TEMP
}

impl UnitConfig {
    /// Build and validate the [`Unit`] described by this entry.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty id, empty name or invalid bounds.
    pub fn unit(&self) -> Result<Unit, ValidationError> {
        let mut builder = Unit::builder()
            .unique_id(EntityRef::new(self.unique_id.as_str())?)
            .kind(self.kind)
            .min_temp(self.min_temp)
            .max_temp(self.max_temp)
            .hvac_modes(self.supported_hvac_modes());
        if let Some(name) = &self.name {
            builder = builder.name(name.as_str());
        }
        builder.build()
    }

    fn supported_hvac_modes(&self) -> Vec<HvacMode> {
        match &self.hvac_modes {
            Some(modes) => modes.clone(),
            None if self.ac_mode => vec![HvacMode::Off, HvacMode::Cool],
            None => vec![HvacMode::Off, HvacMode::Heat],
        }
    }

    /// Setpoint and mode the unit starts with when nothing was persisted.
    #[must_use]
    pub fn initial_state(&self) -> ActuatorState {
        let default_target = if self.ac_mode {
            self.max_temp
        } else {
            self.min_temp
        };
        ActuatorState::new(
            self.target_temp.unwrap_or(default_target),
            self.initial_hvac_mode.unwrap_or(HvacMode::Off),
        )
    }

    /// Manual snapshot the unit starts with when nothing was persisted.
    #[must_use]
    pub fn initial_manual(&self) -> ManualSnapshot {
        ManualSnapshot {
            target_temp: self.initial_manual_target_temp,
            hvac_mode: self.initial_manual_hvac_mode,
        }
    }

    /// Dependents of a virtual unit.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the list is empty or holds an empty id.
    pub fn dependents(&self) -> Result<DependentSet, ValidationError> {
        let entities = self
            .enslaved_thermostats
            .iter()
            .map(|id| EntityRef::new(id.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        DependentSet::new(entities)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |source: ValidationError| ConfigError::InvalidUnit {
            unit: self.unique_id.clone(),
            source,
        };
        let unit = self.unit().map_err(invalid)?;
        let initial = self.initial_state();
        unit.check_temperature(initial.temperature)
            .map_err(invalid)?;
        unit.check_hvac_mode(initial.hvac_mode).map_err(invalid)?;
        if let Some(temperature) = self.initial_manual_target_temp {
            unit.check_temperature(temperature).map_err(invalid)?;
        }
        if let Some(mode) = self.initial_manual_hvac_mode {
            unit.check_hvac_mode(mode).map_err(invalid)?;
        }

        if self.kind.is_virtual() {
            self.dependents().map_err(invalid)?;
            if self.enslaved_thermostats.contains(&self.unique_id) {
                return Err(ConfigError::Validation(format!(
                    "unit {} lists itself as a dependent",
                    self.unique_id
                )));
            }
        } else if !self.enslaved_thermostats.is_empty() {
            return Err(ConfigError::Validation(format!(
                "enslaved unit {} cannot have dependents",
                self.unique_id
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result does not validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("THERMOLINK_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("THERMOLINK_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("THERMOLINK_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("THERMOLINK_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("THERMOLINK_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("THERMOLINK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// Check the server settings and the unit graph.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] or [`ConfigError::InvalidUnit`]
    /// for the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.simulation.tick_secs == 0 {
            return Err(ConfigError::Validation(
                "simulation tick must be non-zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for unit in &self.units {
            unit.validate()?;
            if !seen.insert(unit.unique_id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "unit {} is declared twice",
                    unit.unique_id
                )));
            }
        }
        for unit in &self.units {
            if let Some(missing) = unit
                .enslaved_thermostats
                .iter()
                .find(|id| !seen.contains(id.as_str()))
            {
                return Err(ConfigError::Validation(format!(
                    "unit {} depends on unknown unit {missing}",
                    unit.unique_id
                )));
            }
        }
        self.check_acyclic()
    }

    /// A virtual unit waits on its dependents while propagating, so a cycle
    /// would leave two units waiting on each other.
    fn check_acyclic(&self) -> Result<(), ConfigError> {
        let graph: HashMap<&str, &[String]> = self
            .units
            .iter()
            .map(|unit| (unit.unique_id.as_str(), unit.enslaved_thermostats.as_slice()))
            .collect();
        let mut done = HashSet::new();
        for unit in &self.units {
            let mut path = Vec::new();
            visit(unit.unique_id.as_str(), &graph, &mut path, &mut done)?;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

fn visit<'a>(
    id: &'a str,
    graph: &HashMap<&'a str, &'a [String]>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Result<(), ConfigError> {
    if done.contains(id) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|seen| *seen == id) {
        let mut cycle = path[start..].to_vec();
        cycle.push(id);
        return Err(ConfigError::Validation(format!(
            "dependency cycle: {}",
            cycle.join(" -> ")
        )));
    }
    path.push(id);
    for dependent in graph.get(id).copied().unwrap_or_default() {
        visit(dependent.as_str(), graph, path, done)?;
    }
    path.pop();
    done.insert(id);
    Ok(())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:thermolink.db?mode=rwc".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "thermolinkd=info,thermolink_app=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { tick_secs: 30 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A unit entry does not describe a valid unit.
    #[error("invalid unit {unit}")]
    InvalidUnit {
        unit: String,
        #[source]
        source: ValidationError,
    },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    const HOUSE: &str = "
        [[units]]
        unique_id = 'climate.bedroom'
        initial_temperature = 19.5

        [[units]]
        unique_id = 'climate.kitchen'
        name = 'Kitchen'
        min_temp = 16
        max_temp = 24
        target_temp = 20
        initial_hvac_mode = 'heat'
        initial_enslaved_mode = 'auto'

        [[units]]
        unique_id = 'climate.house'
        type = 'master'
        enslaved_thermostats = ['climate.bedroom', 'climate.kitchen']
    ";

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:thermolink.db?mode=rwc");
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.simulation.tick_secs, 30);
        assert!(config.units.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config = parse("");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let config = parse(
            "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'
            busy_timeout_ms = 250

            [logging]
            filter = 'debug'

            [simulation]
            tick_secs = 5
        ",
        );
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.simulation.tick_secs, 5);
    }

    #[test]
    fn should_parse_units_with_defaults() {
        let config = parse(HOUSE);

        assert!(config.validate().is_ok());
        let bedroom = &config.units[0];
        assert_eq!(bedroom.kind, UnitKind::Enslaved);
        assert!((bedroom.min_temp - 7.0).abs() < f64::EPSILON);
        assert!((bedroom.max_temp - 35.0).abs() < f64::EPSILON);
        assert_eq!(bedroom.initial_state(), ActuatorState::new(7.0, HvacMode::Off));
        let unit = bedroom.unit().unwrap();
        assert_eq!(unit.name, "Enslaved Thermostat");
        assert!(unit.supported_hvac_modes.contains(&HvacMode::Heat));

        let kitchen = &config.units[1];
        assert_eq!(kitchen.initial_enslaved_mode, Some(EnslavedMode::Auto));
        assert_eq!(kitchen.unit().unwrap().name, "Kitchen");
        assert_eq!(kitchen.initial_state(), ActuatorState::new(20.0, HvacMode::Heat));

        let house = &config.units[2];
        assert_eq!(house.kind, UnitKind::Master);
        assert_eq!(house.dependents().unwrap().len(), 2);
    }

    #[test]
    fn should_support_cooling_with_ac_mode() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.office'
            ac_mode = true
            initial_hvac_mode = 'cool'
        ",
        );

        assert!(config.validate().is_ok());
        let office = &config.units[0];
        assert_eq!(office.initial_state(), ActuatorState::new(35.0, HvacMode::Cool));
        assert!(
            !office
                .unit()
                .unwrap()
                .supported_hvac_modes
                .contains(&HvacMode::Heat)
        );
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_unknown_unit_type() {
        let result: Result<Config, _> = toml::from_str(
            "
            [[units]]
            unique_id = 'climate.office'
            type = 'boiler'
        ",
        );
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            ("THERMOLINK_BIND", "127.0.0.1:8080"),
            ("THERMOLINK_DATABASE_URL", "sqlite::memory:"),
            ("THERMOLINK_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_prefer_rust_log_over_thermolink_log() {
        let mut config = Config::default();

        config.apply_overrides(|key| match key {
            "THERMOLINK_LOG" => Some("info".to_string()),
            "RUST_LOG" => Some("trace".to_string()),
            _ => None,
        });

        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_invalid_port_override() {
        let mut config = Config::default();

        config.apply_overrides(|key| (key == "THERMOLINK_PORT").then(|| "http".to_string()));

        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_unknown_dependent() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.house'
            type = 'master'
            enslaved_thermostats = ['climate.attic']
        ",
        );

        let err = config.validate().unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid configuration: unit climate.house depends on unknown unit climate.attic"
        );
    }

    #[test]
    fn should_reject_virtual_unit_without_dependents() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.house'
            type = 'schedulable'
        ",
        );

        let err = config.validate().unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidUnit {
                source: ValidationError::EmptyDependents,
                ..
            }
        ));
    }

    #[test]
    fn should_reject_enslaved_unit_with_dependents() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.bedroom'

            [[units]]
            unique_id = 'climate.kitchen'
            enslaved_thermostats = ['climate.bedroom']
        ",
        );

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_reject_self_reference() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.house'
            type = 'master'
            enslaved_thermostats = ['climate.house']
        ",
        );

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_reject_dependency_cycle() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.upstairs'
            type = 'master'
            enslaved_thermostats = ['climate.house']

            [[units]]
            unique_id = 'climate.house'
            type = 'schedulable'
            enslaved_thermostats = ['climate.upstairs']
        ",
        );

        let err = config.validate().unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid configuration: dependency cycle: climate.upstairs -> climate.house -> climate.upstairs"
        );
    }

    #[test]
    fn should_accept_virtual_unit_driving_another_virtual_unit() {
        let mut config = parse(HOUSE);
        config.units.extend(parse(
            "
            [[units]]
            unique_id = 'climate.home'
            type = 'schedulable'
            enslaved_thermostats = ['climate.house', 'climate.bedroom']
        ",
        ).units);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_duplicate_unit() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.office'

            [[units]]
            unique_id = 'climate.office'
        ",
        );

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_reject_initial_setpoint_out_of_bounds() {
        let config = parse(
            "
            [[units]]
            unique_id = 'climate.office'
            max_temp = 25
            target_temp = 30
        ",
        );

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUnit {
                source: ValidationError::OutOfRange { .. },
                ..
            })
        ));
    }
}
