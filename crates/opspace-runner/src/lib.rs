//! # Opspace Runner
//!
//! Loads TOML scenarios and runs them closed-loop against the planar
//! reference dynamics.
//!
//! - [`scenario`]: scenario file format and loading
//! - [`runner`]: builds the controller and simulator and runs the loop

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, RunSummary, TaskReport};
pub use scenario::{Scenario, ScenarioError, DEMO_SCENARIO};
