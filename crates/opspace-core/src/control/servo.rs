//! Servo: combines per-task forces into one joint command
//!
//! The command is Σ range_spaceᵢ · force_gcᵢ over all tasks. Each task's
//! range space is the product of the null spaces of all higher levels, so
//! lower-priority forces are filtered before they are summed.

use nalgebra::DVector;
use tracing::trace;

use super::task::TaskData;
use crate::error::{ControlError, ControlResult};

#[derive(Debug, Clone, Default)]
pub struct Servo {
    force_gc: DVector<f64>,
    dof: usize,
    has_been_init: bool,
}

impl Servo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the command for `dof` joints
    pub fn init(&mut self, dof: usize) -> ControlResult<()> {
        if dof == 0 {
            return Err(ControlError::InvalidConfig("servo needs at least one dof".into()));
        }
        self.dof = dof;
        self.force_gc = DVector::zeros(dof);
        self.has_been_init = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn has_been_init(&self) -> bool {
        self.has_been_init
    }

    /// Sum the range-space-filtered task forces
    ///
    /// The stored command is only replaced when every task has consistent
    /// dimensions.
    pub fn compute_control_forces<'a, I>(&mut self, tasks: I) -> ControlResult<&DVector<f64>>
    where
        I: IntoIterator<Item = &'a TaskData>,
    {
        if !self.has_been_init {
            return Err(ControlError::Uninitialized { what: "servo" });
        }
        let dof = self.dof;
        let mut sum = DVector::zeros(dof);
        for task in tasks {
            if task.range_space.shape() != (dof, dof) {
                return Err(ControlError::dim("task range space", dof, task.range_space.nrows()));
            }
            if task.force_gc.len() != dof {
                return Err(ControlError::dim("task force_gc", dof, task.force_gc.len()));
            }
            sum += &task.range_space * &task.force_gc;
        }
        trace!(norm = sum.norm(), "servo command");
        self.force_gc = sum;
        Ok(&self.force_gc)
    }

    /// Last computed command
    pub fn force_gc(&self) -> &DVector<f64> {
        &self.force_gc
    }
}
