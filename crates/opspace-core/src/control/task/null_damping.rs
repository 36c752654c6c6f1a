//! Joint damping task
//!
//! Usually placed at the lowest priority to dissipate motion in whatever
//! directions the tasks above leave free. Commands −A(kv∘dq) and leaves no
//! null space.

use nalgebra::DMatrix;

use super::{ModelContext, Task, TaskData, TaskDescriptor};
use crate::dynamics::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::math::clamp_elementwise;
use crate::model::SensorState;

/// Registry tag
pub const TASK_NULL_DAMPING: &str = "null_damping";

#[derive(Debug, Default)]
pub struct TaskNullDamping {
    data: TaskData,
}

impl TaskNullDamping {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Task for TaskNullDamping {
    fn init(
        &mut self,
        desc: &TaskDescriptor,
        _dynamics: &dyn DynamicsEngine,
        dof: usize,
    ) -> ControlResult<()> {
        self.reset();
        if desc.task_dof != 0 && desc.task_dof != dof {
            return Err(ControlError::dim("null damping task dof", dof, desc.task_dof));
        }
        let mut data = TaskData::from_descriptor(desc, dof, dof)?;
        data.jacobian = DMatrix::identity(dof, dof);
        data.jacobian_dyn_inv = DMatrix::identity(dof, dof);
        data.null_space = DMatrix::zeros(dof, dof);
        data.has_been_init = true;
        self.data = data;
        Ok(())
    }

    fn reset(&mut self) {
        self.data = TaskData::default();
    }

    fn compute_model(&mut self, ctx: &ModelContext<'_>) -> ControlResult<()> {
        let d = &mut self.data;
        if !d.has_been_init {
            return Err(ControlError::TaskNotInitialized(d.name.clone()));
        }
        ctx.sensors.check_dof(d.dof)?;
        if ctx.gc_model.dof() != d.dof {
            return Err(ControlError::dim("gc model", d.dof, ctx.gc_model.dof()));
        }
        d.dx.copy_from(ctx.sensors.dq());
        d.lambda.copy_from(&ctx.gc_model.a);
        Ok(())
    }

    fn compute_servo(&mut self, sensors: &SensorState) -> ControlResult<()> {
        let d = &mut self.data;
        if !d.has_been_init {
            return Err(ControlError::TaskNotInitialized(d.name.clone()));
        }
        sensors.check_dof(d.dof)?;
        let f = -d.kv.component_mul(sensors.dq());
        d.f_star = clamp_elementwise(&f, &d.force_task_min, &d.force_task_max);
        d.force_task = &d.lambda * &d.f_star;
        d.force_gc = d.force_task.clone();
        Ok(())
    }

    fn data(&self) -> &TaskData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut TaskData {
        &mut self.data
    }
}
