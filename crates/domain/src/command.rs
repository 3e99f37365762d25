//! Commands a unit accepts, and their mapping from named service calls.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::hvac::HvacMode;
use crate::mode::EnslavedMode;

/// A request addressed to one unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetEnslavedMode {
        mode: Option<EnslavedMode>,
        temperature: Option<f64>,
        hvac_mode: Option<HvacMode>,
    },
    SetEnslavedTargetTemperature {
        temperature: f64,
    },
    SetEnslavedHvacMode {
        hvac_mode: HvacMode,
    },
    StartSchedulerMode {
        temperature: f64,
        hvac_mode: Option<HvacMode>,
    },
    StopSchedulerMode,
    SetManualState {
        temperature: Option<f64>,
        hvac_mode: Option<HvacMode>,
    },
    RestoreManualState,
    SetTemperature {
        temperature: f64,
    },
    SetHvacMode {
        hvac_mode: HvacMode,
    },
}

impl Command {
    /// Name of the service this command is exposed as.
    #[must_use]
    pub fn service_name(&self) -> &'static str {
        match self {
            Self::SetEnslavedMode { .. } => "set_enslaved_mode",
            Self::SetEnslavedTargetTemperature { .. } => "set_enslaved_target_temperature",
            Self::SetEnslavedHvacMode { .. } => "set_enslaved_hvac_mode",
            Self::StartSchedulerMode { .. } => "start_scheduler_mode",
            Self::StopSchedulerMode => "stop_scheduler_mode",
            Self::SetManualState { .. } => "set_manual_state",
            Self::RestoreManualState => "restore_manual_state",
            Self::SetTemperature { .. } => "set_temperature",
            Self::SetHvacMode { .. } => "set_hvac_mode",
        }
    }

    /// Map a service call and its JSON payload to a command.
    ///
    /// `null` is accepted as an empty payload.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::UnknownService`] for an unknown service name.
    /// - [`ValidationError::InvalidMode`] for an unknown enslaved mode literal.
    /// - [`ValidationError::InvalidPayload`] for a missing or mistyped field.
    pub fn parse(service: &str, data: &Value) -> Result<Self, ValidationError> {
        let empty = Map::new();
        let fields = match data {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                return Err(ValidationError::InvalidPayload {
                    field: "data",
                    reason: "expected an object".to_string(),
                });
            }
        };
        let payload = Payload(fields);

        Ok(match service {
            "set_enslaved_mode" => Self::SetEnslavedMode {
                mode: payload.parsed::<EnslavedMode>("mode")?,
                temperature: payload.number("temperature")?,
                hvac_mode: payload.hvac_mode("hvac_mode")?,
            },
            "set_enslaved_target_temperature" => Self::SetEnslavedTargetTemperature {
                temperature: payload.required_number("temperature")?,
            },
            "set_enslaved_hvac_mode" => Self::SetEnslavedHvacMode {
                hvac_mode: required(payload.hvac_mode("mode")?, "mode")?,
            },
            "start_scheduler_mode" => Self::StartSchedulerMode {
                temperature: payload.required_number("temperature")?,
                hvac_mode: payload.hvac_mode("hvac_mode")?,
            },
            "stop_scheduler_mode" => Self::StopSchedulerMode,
            "set_manual_state" => Self::SetManualState {
                temperature: payload.number("temperature")?,
                hvac_mode: payload.hvac_mode("hvac_mode")?,
            },
            "restore_manual_state" => Self::RestoreManualState,
            "set_temperature" => Self::SetTemperature {
                temperature: payload.required_number("temperature")?,
            },
            "set_hvac_mode" => Self::SetHvacMode {
                hvac_mode: required(payload.hvac_mode("hvac_mode")?, "hvac_mode")?,
            },
            other => return Err(ValidationError::UnknownService(other.to_string())),
        })
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::InvalidPayload {
        field,
        reason: "missing".to_string(),
    })
}

struct Payload<'a>(&'a Map<String, Value>);

impl Payload<'_> {
    fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    fn number(&self, field: &'static str) -> Result<Option<f64>, ValidationError> {
        self.get(field)
            .map(|value| {
                value.as_f64().ok_or(ValidationError::InvalidPayload {
                    field,
                    reason: format!("expected a number, got {value}"),
                })
            })
            .transpose()
    }

    fn required_number(&self, field: &'static str) -> Result<f64, ValidationError> {
        required(self.number(field)?, field)
    }

    fn string(&self, field: &'static str) -> Result<Option<&str>, ValidationError> {
        self.get(field)
            .map(|value| {
                value.as_str().ok_or(ValidationError::InvalidPayload {
                    field,
                    reason: format!("expected a string, got {value}"),
                })
            })
            .transpose()
    }

    fn parsed<T>(&self, field: &'static str) -> Result<Option<T>, ValidationError>
    where
        T: FromStr<Err = ValidationError>,
    {
        self.string(field)?.map(str::parse).transpose()
    }

    fn hvac_mode(&self, field: &'static str) -> Result<Option<HvacMode>, ValidationError> {
        self.parsed::<HvacMode>(field)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_parse_set_enslaved_mode_with_optional_fields() {
        let command = Command::parse(
            "set_enslaved_mode",
            &json!({"mode": "auto", "temperature": 22}),
        )
        .unwrap();
        assert_eq!(
            command,
            Command::SetEnslavedMode {
                mode: Some(EnslavedMode::Auto),
                temperature: Some(22.0),
                hvac_mode: None,
            }
        );
    }

    #[test]
    fn should_report_invalid_mode_for_unknown_literal() {
        let result = Command::parse("set_enslaved_mode", &json!({"mode": "eco"}));
        assert_eq!(result, Err(ValidationError::InvalidMode("eco".to_string())));
    }

    #[test]
    fn should_read_mode_field_for_enslaved_hvac_mode() {
        let command = Command::parse("set_enslaved_hvac_mode", &json!({"mode": "cool"})).unwrap();
        assert_eq!(
            command,
            Command::SetEnslavedHvacMode {
                hvac_mode: HvacMode::Cool
            }
        );
    }

    #[test]
    fn should_accept_null_payload_for_commands_without_fields() {
        assert_eq!(
            Command::parse("stop_scheduler_mode", &Value::Null),
            Ok(Command::StopSchedulerMode)
        );
        assert_eq!(
            Command::parse("restore_manual_state", &json!({})),
            Ok(Command::RestoreManualState)
        );
    }

    #[test]
    fn should_reject_missing_required_temperature() {
        let result = Command::parse("start_scheduler_mode", &json!({"hvac_mode": "heat"}));
        assert_eq!(
            result,
            Err(ValidationError::InvalidPayload {
                field: "temperature",
                reason: "missing".to_string(),
            })
        );
    }

    #[test]
    fn should_reject_mistyped_temperature() {
        let result = Command::parse("set_temperature", &json!({"temperature": "warm"}));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidPayload {
                field: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn should_reject_unknown_service() {
        let result = Command::parse("turn_on", &json!({}));
        assert_eq!(
            result,
            Err(ValidationError::UnknownService("turn_on".to_string()))
        );
    }

    #[test]
    fn should_reject_non_object_payload() {
        let result = Command::parse("set_temperature", &json!([21]));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidPayload { field: "data", .. })
        ));
    }

    #[test]
    fn should_expose_service_name() {
        let command = Command::StartSchedulerMode {
            temperature: 25.0,
            hvac_mode: None,
        };
        assert_eq!(command.service_name(), "start_scheduler_mode");
    }
}
