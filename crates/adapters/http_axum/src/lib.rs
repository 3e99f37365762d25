//! # thermolink-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Act as the **host**: turn `POST /api/units/{entity}/services/{service}`
//!   calls into [`Command`](thermolink_domain::command::Command)s dispatched
//!   through the unit registry
//! - Expose unit statuses as JSON (`/api/units`, `/api/units/{entity}`)
//! - Stream dependent notifications as Server-Sent Events
//!   (`/api/events/stream`)
//! - Map [`ThermostatError`](thermolink_domain::error::ThermostatError)s to
//!   HTTP status codes
//!
//! ## Dependency rule
//! Depends on `thermolink-app` (registry, state bus) and `thermolink-domain`
//! (for request/response mapping). Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
