//! # Opspace Core
//!
//! Hierarchical operational-space control core.
//!
//! Converts control objectives ("tasks") and live joint-space sensor state
//! into one commanded generalized force. Tasks are ranked by priority; each
//! level acts only in the joint-space directions the levels above it leave
//! unused (null-space projection cascade).
//!
//! ## Modules
//!
//! - [`model`]: sensor/actuator buffers, robot topology, joint-space model
//! - [`dynamics`]: dynamics engine interface and a planar reference engine
//! - [`control`]: joint-space controller, tasks, servo, task controller
//! - [`math`]: linear-algebra helpers
//! - [`simulation`]: forward simulation and the closed-loop tick driver
//! - [`error`]: error types

pub mod control;
pub mod dynamics;
pub mod error;
pub mod math;
pub mod model;
pub mod simulation;

pub use error::{ControlError, ControlResult, ErrorKind};

/// Gravity constant [m/s²]
pub const GRAVITY: f64 = 9.81;
