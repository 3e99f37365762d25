//! # thermolink-app
//!
//! Application layer — use-cases, unit actors and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Actuator` — the heater a unit drives
//!   - `StateStore` — load & save the record persisted per unit
//!   - `StatePublisher` — publish dependent notifications
//!   - `CommandDispatcher` — address a command to a unit by entity reference
//! - Implement the **mode state machine** of enslaved units and the
//!   **fan-out / aggregation** behavior of master and schedulable units
//! - Run every unit as an **actor** owning its state, reachable through the
//!   [`registry::UnitRegistry`]
//! - Provide **in-process infrastructure** (state bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `thermolink-domain` only (plus `tokio` for channels and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod persistence;
pub mod ports;
pub mod registry;
pub mod runtime;
pub mod services;
