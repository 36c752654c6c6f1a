//! Joint-space posture task
//!
//! Task space is the full joint space: J = I, Λ = A. The task consumes
//! every direction, so its null space is zero and nothing below it can act.

use nalgebra::DMatrix;

use super::opspace::servo_force;
use super::{ModelContext, Task, TaskData, TaskDescriptor};
use crate::dynamics::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::model::SensorState;

/// Registry tag
pub const TASK_GC: &str = "gc";

#[derive(Debug, Default)]
pub struct TaskGc {
    data: TaskData,
}

impl TaskGc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Task for TaskGc {
    fn init(
        &mut self,
        desc: &TaskDescriptor,
        dynamics: &dyn DynamicsEngine,
        dof: usize,
    ) -> ControlResult<()> {
        self.reset();
        if desc.task_dof != 0 && desc.task_dof != dof {
            return Err(ControlError::dim("gc task dof", dof, desc.task_dof));
        }
        if !dynamics.has_been_init() {
            return Err(ControlError::Uninitialized {
                what: "dynamics engine",
            });
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
        d.x.copy_from(ctx.sensors.q());
        d.dx.copy_from(ctx.sensors.dq());
        d.lambda.copy_from(&ctx.gc_model.a);
        d.p.copy_from(&ctx.gc_model.g);
        Ok(())
    }

    fn compute_servo(&mut self, sensors: &SensorState) -> ControlResult<()> {
        let d = &mut self.data;
        if !d.has_been_init {
            return Err(ControlError::TaskNotInitialized(d.name.clone()));
        }
        sensors.check_dof(d.dof)?;
        let pos_err = &d.goal_pos - sensors.q();
        let vel_err = &d.goal_vel - sensors.dq();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::PlanarChain;
    use crate::math::spd_inverse;
    use crate::model::{GcModel, RobotTopology};
    use nalgebra::DVector;
    use approx::assert_relative_eq;

    fn engine() -> PlanarChain {
        PlanarChain::from_topology(&RobotTopology::planar_chain("arm", 2, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_gc_task_law() {
        let dyn_engine = engine();
        let desc = TaskDescriptor::new("posture", TASK_GC, 0)
            .with_gains(10.0, 3.0)
            .with_goal(vec![0.1, 0.0]);
        let mut task = TaskGc::new();
        task.init(&desc, &dyn_engine, 2).unwrap();
        assert!(task.has_been_init());

        let mut model = GcModel::new(2, 2);
        model.a = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 1.0]));
        model.g = DVector::from_vec(vec![5.0, 1.0]);
        let a_inv = spd_inverse(&model.a);
        let sensors = SensorState::new(2);
        let ctx = ModelContext {
            sensors: &sensors,
            gc_model: &model,
            a_inv: &a_inv,
            dynamics: &dyn_engine,
        };
        task.compute_model(&ctx).unwrap();
        task.compute_servo(&sensors).unwrap();

        // f* = [1, 0], no gravity term without gravity_comp
        assert_relative_eq!(
            task.data().force_gc,
            DVector::from_vec(vec![2.0, 0.0]),
            epsilon = 1e-12
        );
        assert_relative_eq!(task.data().null_space, DMatrix::zeros(2, 2));
    }

    #[test]
    fn test_gc_task_gravity_comp() {
        let dyn_engine = engine();
        let desc = TaskDescriptor::new("posture", TASK_GC, 0)
            .with_gains(10.0, 3.0)
            .with_gravity_comp(true);
        let mut task = TaskGc::new();
        task.init(&desc, &dyn_engine, 2).unwrap();

        let mut model = GcModel::new(2, 2);
        model.g = DVector::from_vec(vec![5.0, 1.0]);
        let a_inv = spd_inverse(&model.a);
        let sensors = SensorState::new(2);
        let ctx = ModelContext {
            sensors: &sensors,
            gc_model: &model,
            a_inv: &a_inv,
            dynamics: &dyn_engine,
        };
        task.compute_model(&ctx).unwrap();
        task.compute_servo(&sensors).unwrap();
        assert_relative_eq!(task.data().force_gc, model.g, epsilon = 1e-12);
    }

    #[test]
    fn test_gc_task_rejects_wrong_task_dof() {
        let desc = TaskDescriptor::new("posture", TASK_GC, 0).with_task_dof(3);
        let mut task = TaskGc::new();
        assert!(task.init(&desc, &engine(), 2).is_err());
        assert!(!task.has_been_init());
    }

    #[test]
    fn test_gc_task_servo_before_init() {
        let mut task = TaskGc::new();
        assert!(matches!(
            task.compute_servo(&SensorState::new(2)),
            Err(ControlError::TaskNotInitialized(_))
        ));
    }
}
