//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use thermolink_domain::error::{ThermostatError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`ThermostatError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(ThermostatError);

impl From<ThermostatError> for ApiError {
    fn from(err: ThermostatError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ThermostatError::Validation(_) => StatusCode::BAD_REQUEST,
            ThermostatError::NotFound(_) => StatusCode::NOT_FOUND,
            ThermostatError::Forbidden(_) => StatusCode::CONFLICT,
            ThermostatError::Actuator(_) | ThermostatError::Dependent(_) => {
                StatusCode::BAD_GATEWAY
            }
            ThermostatError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ThermostatError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "internal server error".to_string(),
                    }),
                )
                    .into_response();
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
