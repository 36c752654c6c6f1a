//! Robot I/O buffers
//!
//! The sensor state read at the start of every tick and the actuator
//! command written at its end. Both are owned by the caller and lent to
//! the controllers.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Joint-space sensor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    /// Generalized positions
    q: DVector<f64>,
    /// Generalized velocities
    dq: DVector<f64>,
    /// Generalized accelerations
    ddq: DVector<f64>,
}

impl SensorState {
    /// Zero state for `dof` generalized coordinates
    pub fn new(dof: usize) -> Self {
        Self {
            q: DVector::zeros(dof),
            dq: DVector::zeros(dof),
            ddq: DVector::zeros(dof),
        }
    }

    /// Build from explicit vectors, which must share one length
    pub fn from_parts(q: DVector<f64>, dq: DVector<f64>, ddq: DVector<f64>) -> ControlResult<Self> {
        let dof = q.len();
        if dq.len() != dof {
            return Err(ControlError::dim("sensor dq", dof, dq.len()));
        }
        if ddq.len() != dof {
            return Err(ControlError::dim("sensor ddq", dof, ddq.len()));
        }
        Ok(Self { q, dq, ddq })
    }

    /// State at rest at configuration `q`
    pub fn at_rest(q: DVector<f64>) -> Self {
        let dof = q.len();
        Self {
            q,
            dq: DVector::zeros(dof),
            ddq: DVector::zeros(dof),
        }
    }

    /// Number of generalized coordinates
    pub fn dof(&self) -> usize {
        self.q.len()
    }

    pub fn q(&self) -> &DVector<f64> {
        &self.q
    }

    pub fn dq(&self) -> &DVector<f64> {
        &self.dq
    }

    pub fn ddq(&self) -> &DVector<f64> {
        &self.ddq
    }

    /// Overwrite all three vectors, keeping the length invariant
    pub fn update(
        &mut self,
        q: &DVector<f64>,
        dq: &DVector<f64>,
        ddq: &DVector<f64>,
    ) -> ControlResult<()> {
        let dof = self.dof();
        for (what, v) in [("sensor q", q), ("sensor dq", dq), ("sensor ddq", ddq)] {
            if v.len() != dof {
                return Err(ControlError::dim(what, dof, v.len()));
            }
        }
        self.q.copy_from(q);
        self.dq.copy_from(dq);
        self.ddq.copy_from(ddq);
        Ok(())
    }

    /// Check the length against a controller's dof
    pub fn check_dof(&self, dof: usize) -> ControlResult<()> {
        if self.dof() != dof {
            return Err(ControlError::dim("sensor state", dof, self.dof()));
        }
        Ok(())
    }
}

/// Actuator command buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    /// Commanded generalized force
    pub force_gc_commanded: DVector<f64>,
}

impl ActuatorState {
    pub fn new(dof: usize) -> Self {
        Self {
            force_gc_commanded: DVector::zeros(dof),
        }
    }
}

/// I/O buffers of one robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotIo {
    /// Robot this buffer belongs to
    pub name: String,
    /// Sensor readings, written by the sensing layer
    pub sensors: SensorState,
    /// Actuator commands, written by the controllers
    pub actuators: ActuatorState,
}

impl RobotIo {
    pub fn new(name: impl Into<String>, dof: usize) -> Self {
        Self {
            name: name.into(),
            sensors: SensorState::new(dof),
            actuators: ActuatorState::new(dof),
        }
    }

    /// Degrees of freedom of the robot
    pub fn dof(&self) -> usize {
        self.sensors.dof()
    }
}
