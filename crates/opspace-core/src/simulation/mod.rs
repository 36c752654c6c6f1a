//! Simulation harness
//!
//! Integrates a dynamics engine forward under a commanded joint force and
//! drives a task controller tick by tick against it.

pub mod config;
pub mod control_loop;
pub mod simulator;

pub use config::*;
pub use control_loop::*;
pub use simulator::*;
