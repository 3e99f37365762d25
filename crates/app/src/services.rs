//! Application services — the behavior of each unit kind.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod actuation;
pub mod aggregator;
pub mod enslaved;
pub mod fanout;
pub mod propagator;
pub mod virtual_unit;

#[cfg(test)]
pub(crate) mod fakes;
