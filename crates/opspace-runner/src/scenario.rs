//! Scenario files
//!
//! A scenario describes one closed-loop run: the robot, the task stack,
//! the simulation settings and the starting configuration.
//!
//! ```toml
//! initial_q = [0.3, 0.5, -0.4]
//!
//! [robot]
//! name = "arm"
//! planar_chain = { links = 3, length = 1.0, mass = 1.0 }
//!
//! [controller]
//! robot_name = "arm"
//!
//! [[controller.tasks]]
//! name = "posture"
//! type = "gc"
//! kp = [100.0]
//! kv = [20.0]
//!
//! [sim]
//! dt = 0.001
//! duration = 3.0
//! ```

use std::path::Path;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opspace_core::control::TaskControllerParams;
use opspace_core::dynamics::PlanarChain;
use opspace_core::model::{RigidBody, RobotTopology};
use opspace_core::simulation::SimConfig;
use opspace_core::ControlError;

/// Two-level planar arm: hand position over a gravity-compensated posture
pub const DEMO_SCENARIO: &str = include_str!("../scenarios/two_level_arm.toml");

/// Scenario loading errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid robot: {0}")]
    Robot(String),
    #[error("initial_q has {got} entries but the robot has {expected} joints")]
    InitialState { expected: usize, got: usize },
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Generated uniform planar chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanarChainSpec {
    pub links: usize,
    pub length: f64,
    pub mass: f64,
}

/// Robot section: either a generated chain or explicit links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotSpec {
    pub name: String,
    #[serde(default)]
    pub planar_chain: Option<PlanarChainSpec>,
    #[serde(default)]
    pub links: Vec<RigidBody>,
    /// Gravity magnitude override [m/s²]
    #[serde(default)]
    pub gravity: Option<f64>,
    /// Rotor inertia added to the mass matrix diagonal
    #[serde(default)]
    pub armature: f64,
}

impl RobotSpec {
    pub fn topology(&self) -> Result<RobotTopology, ScenarioError> {
        match (&self.planar_chain, self.links.is_empty()) {
            (Some(chain), true) => {
                if chain.links == 0 {
                    return Err(ScenarioError::Robot("planar_chain needs at least one link".into()));
                }
                Ok(RobotTopology::planar_chain(
                    self.name.clone(),
                    chain.links,
                    chain.length,
                    chain.mass,
                ))
            }
            (None, false) => Ok(RobotTopology::new(self.name.clone(), self.links.clone())),
            (Some(_), false) => Err(ScenarioError::Robot(
                "give either planar_chain or links, not both".into(),
            )),
            (None, true) => Err(ScenarioError::Robot("no links given".into())),
        }
    }

    /// Dynamics engine for this robot
    pub fn engine(&self) -> Result<PlanarChain, ScenarioError> {
        let mut engine =
            PlanarChain::from_topology(&self.topology()?)?.with_armature(self.armature);
        if let Some(g) = self.gravity {
            engine = engine.with_gravity(g);
        }
        Ok(engine)
    }
}

/// One closed-loop run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub robot: RobotSpec,
    pub controller: TaskControllerParams,
    #[serde(default)]
    pub sim: SimConfig,
    /// Starting joint configuration (zeros when empty)
    #[serde(default)]
    pub initial_q: Vec<f64>,
}

impl Scenario {
    pub fn from_toml(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.sim.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Built-in demo
    pub fn demo() -> Result<Self, ScenarioError> {
        Self::from_toml(DEMO_SCENARIO)
    }

    /// Starting configuration for a robot with `dof` joints
    pub fn initial_q(&self, dof: usize) -> Result<DVector<f64>, ScenarioError> {
        match self.initial_q.len() {
            0 => Ok(DVector::zeros(dof)),
            n if n == dof => Ok(DVector::from_column_slice(&self.initial_q)),
            got => Err(ScenarioError::InitialState { expected: dof, got }),
        }
    }
}
