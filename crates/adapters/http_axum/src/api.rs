//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod units;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/units", get(units::list))
        .route("/units/{entity}", get(units::get))
        .route(
            "/units/{entity}/services/{service}",
            post(units::call_service),
        )
        .route("/events/stream", get(sse::stream))
}
