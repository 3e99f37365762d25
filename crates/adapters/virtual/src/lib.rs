//! # thermolink-adapter-virtual
//!
//! Simulated heaters implementing the [`Actuator`](thermolink_app::ports::Actuator)
//! port, so enslaved units can run without hardware.
//!
//! | Piece | Behaviour |
//! |-------|-----------|
//! | [`VirtualHeater`] | Accepts setpoints within its bounds and the modes it supports |
//! | [`HeaterSimulation`] | Moves every heater's sensor toward its setpoint on a fixed period |
//!
//! ## Dependency rule
//!
//! Depends on `thermolink-app` (port traits) and `thermolink-domain` only.

mod heater;
mod simulation;

pub use heater::VirtualHeater;
pub use simulation::HeaterSimulation;
