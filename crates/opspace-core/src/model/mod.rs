//! Robot data model
//!
//! Sensor and actuator buffers, the pre-parsed link tree and the
//! generalized-coordinate dynamic model refreshed every tick.

pub mod gc_model;
pub mod sensors;
pub mod topology;

pub use gc_model::*;
pub use sensors::*;
pub use topology::*;
