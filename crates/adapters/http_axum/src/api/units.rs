//! JSON REST handlers for units.

use std::str::FromStr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde_json::Value;

use thermolink_app::ports::CommandDispatcher;
use thermolink_domain::command::Command;
use thermolink_domain::error::ValidationError;
use thermolink_domain::id::EntityRef;
use thermolink_domain::status::UnitStatus;

use crate::error::ApiError;
use crate::state::AppState;

fn parse_entity(entity: &str) -> Result<EntityRef, ApiError> {
    Ok(EntityRef::from_str(entity)?)
}

/// An empty body is an empty payload.
fn parse_data(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|err| {
        ApiError::from(ValidationError::InvalidPayload {
            field: "data",
            reason: err.to_string(),
        })
    })
}

/// `GET /api/units`
pub async fn list(State(state): State<AppState>) -> Json<Vec<UnitStatus>> {
    Json(state.registry.statuses().await)
}

/// `GET /api/units/{entity}`
pub async fn get(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<UnitStatus>, ApiError> {
    let entity = parse_entity(&entity)?;
    Ok(Json(state.registry.status(&entity).await?))
}

/// `POST /api/units/{entity}/services/{service}`
///
/// The body is the service data as a JSON object. Responds with the unit's
/// status after handling the command.
pub async fn call_service(
    State(state): State<AppState>,
    Path((entity, service)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<UnitStatus>, ApiError> {
    let entity = parse_entity(&entity)?;
    let command = Command::parse(&service, &parse_data(&body)?)?;
    tracing::debug!(%entity, service = command.service_name(), "service call");
    Ok(Json(state.registry.dispatch(&entity, command).await?))
}
