//! Operational point position task
//!
//! Controls the world position of a point rigidly attached to a link. The
//! first `task_dof` (at most 3) coordinates of the point are controlled;
//! a planar arm typically uses x and y only.

use nalgebra::{DVector, Vector3};

use super::opspace::{dyn_consistent_inverse, force_null_space, servo_force, task_mass_matrix};
use super::{ModelContext, Task, TaskData, TaskDescriptor};
use crate::dynamics::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::model::{LinkId, SensorState};

/// Registry tag
pub const TASK_OP_POS: &str = "op_pos";

#[derive(Debug, Default)]
pub struct TaskOpPos {
    data: TaskData,
    link: Option<LinkId>,
    pos_in_parent: Vector3<f64>,
}

impl TaskOpPos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine id of the controlled link
    pub fn link(&self) -> Option<LinkId> {
        self.link
    }

    /// Control point in the link frame
    pub fn pos_in_parent(&self) -> &Vector3<f64> {
        &self.pos_in_parent
    }

    fn ready(&self) -> ControlResult<LinkId> {
        match self.link {
            Some(link) if self.data.has_been_init => Ok(link),
            _ => Err(ControlError::TaskNotInitialized(self.data.name.clone())),
        }
    }
}

impl Task for TaskOpPos {
    fn init(
        &mut self,
        desc: &TaskDescriptor,
        dynamics: &dyn DynamicsEngine,
        dof: usize,
    ) -> ControlResult<()> {
        self.reset();
        let task_dof = if desc.task_dof == 0 { 3 } else { desc.task_dof };
        if task_dof > 3 {
            return Err(ControlError::dim("op_pos task dof", 3, task_dof));
        }
        let link_name = desc.link.as_deref().ok_or_else(|| {
            ControlError::InvalidConfig(format!("op_pos task '{}' needs a link", desc.name))
        })?;
        let link = dynamics
            .id_for_link(link_name)
            .ok_or_else(|| ControlError::UnknownLink(link_name.to_string()))?;

        let mut data = TaskData::from_descriptor(desc, task_dof, dof)?;
        data.has_been_init = true;
        self.data = data;
        self.link = Some(link);
        self.pos_in_parent = desc.pos_in_parent.unwrap_or_else(Vector3::zeros);
        Ok(())
    }

    fn reset(&mut self) {
        self.data = TaskData::default();
        self.link = None;
        self.pos_in_parent = Vector3::zeros();
    }

    fn compute_model(&mut self, ctx: &ModelContext<'_>) -> ControlResult<()> {
        let link = self.ready()?;
        let d = &mut self.data;
        ctx.sensors.check_dof(d.dof)?;

        let j6 = ctx.dynamics.jacobian(link, &self.pos_in_parent, ctx.sensors)?;
        if j6.ncols() != d.dof {
            return Err(ControlError::dim("op_pos jacobian columns", d.dof, j6.ncols()));
        }
        d.jacobian = j6.rows(0, d.task_dof).into_owned();

        let x = ctx.dynamics.position(link, &self.pos_in_parent, ctx.sensors)?;
        d.x = DVector::from_column_slice(&x.as_slice()[..d.task_dof]);
        d.dx = &d.jacobian * ctx.sensors.dq();

        d.lambda = task_mass_matrix(&d.jacobian, ctx.a_inv);
        d.jacobian_dyn_inv = dyn_consistent_inverse(&d.jacobian, ctx.a_inv, &d.lambda);
        d.null_space = force_null_space(&d.jacobian, &d.jacobian_dyn_inv);
        d.p = d.jacobian_dyn_inv.transpose() * &ctx.gc_model.g;
        Ok(())
    }

    fn compute_servo(&mut self, sensors: &SensorState) -> ControlResult<()> {
        self.ready()?;
        let d = &mut self.data;
        sensors.check_dof(d.dof)?;

        let pos_err = &d.goal_pos - &d.x;
        let vel_err = &d.goal_vel - &d.dx;
        d.f_star = servo_force(
            &d.kp,
            &d.kv,
            &d.ka,
            &pos_err,
            &vel_err,
            &d.goal_acc,
            &d.force_task_min,
            &d.force_task_max,
        );
        d.force_task = &d.lambda * &d.f_star;
        if d.gravity_comp {
            d.force_task += &d.p;
        }
        d.force_gc = d.jacobian.transpose() * &d.force_task;
        Ok(())
    }

    fn data(&self) -> &TaskData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut TaskData {
        &mut self.data
    }
}
