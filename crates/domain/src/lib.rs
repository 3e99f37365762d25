//! # thermolink-domain
//!
//! Pure domain model for the thermolink thermostat coordinator.
//!
//! ## Responsibilities
//! - Foundational types: entity references, HVAC modes, error conventions
//! - Define **Units** (enslaved, master and schedulable thermostats) and their bounds
//! - Define the **mode state** of enslaved units (enslaved mode, manual snapshot,
//!   scheduler override) and the record persisted across restarts
//! - Define **Commands** (the service surface a unit accepts) and their parsing
//! - Define **dependent notifications** and the "is handled" predicates used by
//!   virtual units to aggregate temperatures
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod command;
pub mod dependent;
pub mod hvac;
pub mod mode;
pub mod record;
pub mod state;
pub mod status;
pub mod unit;
