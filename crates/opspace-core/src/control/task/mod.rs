//! Task abstraction
//!
//! A task is one control objective expressed in its own task space. Every
//! tick it runs in two phases:
//!
//! 1. [`Task::compute_model`] writes the Jacobian, the task-space mass
//!    matrix and the task's `null_space` (directions it leaves unused).
//! 2. The task controller writes `range_space` (directions the task may act
//!    in) for every task, then [`Task::compute_servo`] writes the task force
//!    and its joint-space projection `force_gc`.
//!
//! Concrete kinds: [`TaskGc`] (joint posture), [`TaskOpPos`] (operational
//! point position) and [`TaskNullDamping`] (joint damping).

pub mod gc_task;
pub mod null_damping;
pub mod op_pos;
pub mod opspace;

pub use gc_task::TaskGc;
pub use null_damping::TaskNullDamping;
pub use op_pos::TaskOpPos;

use std::fmt::Debug;

use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};

use crate::dynamics::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::model::{GcModel, SensorState};

/// Serializable description of one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Unique task name
    pub name: String,
    /// Type tag resolved through the task registry
    #[serde(rename = "type")]
    pub task_type: String,
    /// Priority level (0 is evaluated first)
    #[serde(default)]
    pub priority: usize,
    /// Task-space dimension (0 lets the task kind choose)
    #[serde(default)]
    pub task_dof: usize,
    /// Proportional gains (one value applies to every coordinate)
    #[serde(default)]
    pub kp: Vec<f64>,
    /// Velocity gains
    #[serde(default)]
    pub kv: Vec<f64>,
    /// Acceleration feedforward gains
    #[serde(default)]
    pub ka: Vec<f64>,
    /// Integral gains
    #[serde(default)]
    pub ki: Vec<f64>,
    /// Lower bound of the decoupled task force (unbounded when empty)
    #[serde(default)]
    pub force_task_min: Vec<f64>,
    /// Upper bound of the decoupled task force (unbounded when empty)
    #[serde(default)]
    pub force_task_max: Vec<f64>,
    /// Link the task acts on
    #[serde(default)]
    pub link: Option<String>,
    /// Control point in the link frame
    #[serde(default)]
    pub pos_in_parent: Option<Vector3<f64>>,
    /// Initial goal position (zeros when empty)
    #[serde(default)]
    pub goal_pos: Vec<f64>,
    /// Add the task-space gravity force to the command
    #[serde(default)]
    pub gravity_comp: bool,
}

impl TaskDescriptor {
    /// Descriptor with no gains or bounds
    pub fn new(name: impl Into<String>, task_type: impl Into<String>, priority: usize) -> Self {
        Self {
            name: name.into(),
            task_type: task_type.into(),
            priority,
            task_dof: 0,
            kp: Vec::new(),
            kv: Vec::new(),
            ka: Vec::new(),
            ki: Vec::new(),
            force_task_min: Vec::new(),
            force_task_max: Vec::new(),
            link: None,
            pos_in_parent: None,
            goal_pos: Vec::new(),
            gravity_comp: false,
        }
    }

    /// Set uniform position and velocity gains
    pub fn with_gains(mut self, kp: f64, kv: f64) -> Self {
        self.kp = vec![kp];
        self.kv = vec![kv];
        self
    }

    /// Set uniform force bounds
    pub fn with_force_limits(mut self, min: f64, max: f64) -> Self {
        self.force_task_min = vec![min];
        self.force_task_max = vec![max];
        self
    }

    /// Attach the task to a point on a link
    pub fn on_link(mut self, link: impl Into<String>, pos_in_parent: Vector3<f64>) -> Self {
        self.link = Some(link.into());
        self.pos_in_parent = Some(pos_in_parent);
        self
    }

    pub fn with_task_dof(mut self, task_dof: usize) -> Self {
        self.task_dof = task_dof;
        self
    }

    pub fn with_goal(mut self, goal: Vec<f64>) -> Self {
        self.goal_pos = goal;
        self
    }

    pub fn with_gravity_comp(mut self, on: bool) -> Self {
        self.gravity_comp = on;
        self
    }
}

/// Expand a gain list to `n` entries
///
/// Empty lists become `default`, single values are broadcast.
fn expand(
    what: &'static str,
    values: &[f64],
    n: usize,
    default: f64,
) -> ControlResult<DVector<f64>> {
    match values.len() {
        0 => Ok(DVector::from_element(n, default)),
        1 => Ok(DVector::from_element(n, values[0])),
        len if len == n => Ok(DVector::from_column_slice(values)),
        len => Err(ControlError::dim(what, n, len)),
    }
}

/// Data of one task, shared between the task and the controller
#[derive(Debug, Clone, Default)]
pub struct TaskData {
    pub name: String,
    pub task_type: String,
    pub priority: usize,
    pub task_dof: usize,
    pub dof: usize,

    pub kp: DVector<f64>,
    pub kv: DVector<f64>,
    pub ka: DVector<f64>,
    pub ki: DVector<f64>,
    /// Lower bound of the decoupled task force
    pub force_task_min: DVector<f64>,
    /// Upper bound of the decoupled task force
    pub force_task_max: DVector<f64>,
    pub gravity_comp: bool,

    pub goal_pos: DVector<f64>,
    pub goal_vel: DVector<f64>,
    pub goal_acc: DVector<f64>,
    /// Current task-space position
    pub x: DVector<f64>,
    /// Current task-space velocity
    pub dx: DVector<f64>,

    /// Task Jacobian, task_dof × dof
    pub jacobian: DMatrix<f64>,
    /// Task-space mass matrix Λ = (J A⁻¹ Jᵀ)⁻¹
    pub lambda: DMatrix<f64>,
    /// Dynamically consistent inverse J̄ = A⁻¹ Jᵀ Λ, dof × task_dof
    pub jacobian_dyn_inv: DMatrix<f64>,
    /// Task-space gravity force p = J̄ᵀ g
    pub p: DVector<f64>,

    /// Saturated decoupled task force
    pub f_star: DVector<f64>,
    /// Task-space force
    pub force_task: DVector<f64>,
    /// Joint-space force contribution
    pub force_gc: DVector<f64>,
    /// Joint-space directions this task may act in (written by the controller)
    pub range_space: DMatrix<f64>,
    /// Joint-space directions this task leaves unused (written by the task)
    pub null_space: DMatrix<f64>,

    pub has_been_init: bool,
}

impl TaskData {
    /// Size every vector and matrix from a descriptor
    pub fn from_descriptor(
        desc: &TaskDescriptor,
        task_dof: usize,
        dof: usize,
    ) -> ControlResult<Self> {
        if task_dof == 0 || dof == 0 {
            return Err(ControlError::InvalidConfig(format!(
                "task '{}' has task_dof {task_dof} and dof {dof}",
                desc.name
            )));
        }
        let force_task_min =
            expand("force_task_min", &desc.force_task_min, task_dof, f64::NEG_INFINITY)?;
        let force_task_max =
            expand("force_task_max", &desc.force_task_max, task_dof, f64::INFINITY)?;
        if let Some(i) = (0..task_dof).find(|&i| force_task_min[i] > force_task_max[i]) {
            return Err(ControlError::InvalidConfig(format!(
                "task '{}': force_task_min[{i}] exceeds force_task_max[{i}]",
                desc.name
            )));
        }

        Ok(Self {
            name: desc.name.clone(),
            task_type: desc.task_type.clone(),
            priority: desc.priority,
            task_dof,
            dof,
            kp: expand("kp", &desc.kp, task_dof, 0.0)?,
            kv: expand("kv", &desc.kv, task_dof, 0.0)?,
            ka: expand("ka", &desc.ka, task_dof, 0.0)?,
            ki: expand("ki", &desc.ki, task_dof, 0.0)?,
            force_task_min,
            force_task_max,
            gravity_comp: desc.gravity_comp,
            goal_pos: expand("goal_pos", &desc.goal_pos, task_dof, 0.0)?,
            goal_vel: DVector::zeros(task_dof),
            goal_acc: DVector::zeros(task_dof),
            x: DVector::zeros(task_dof),
            dx: DVector::zeros(task_dof),
            jacobian: DMatrix::zeros(task_dof, dof),
            lambda: DMatrix::zeros(task_dof, task_dof),
            jacobian_dyn_inv: DMatrix::zeros(dof, task_dof),
            p: DVector::zeros(task_dof),
            f_star: DVector::zeros(task_dof),
            force_task: DVector::zeros(task_dof),
            force_gc: DVector::zeros(dof),
            range_space: DMatrix::identity(dof, dof),
            null_space: DMatrix::identity(dof, dof),
            has_been_init: false,
        })
    }

    /// Set the goal position, checking its length
    pub fn set_goal_pos(&mut self, goal: &DVector<f64>) -> ControlResult<()> {
        if goal.len() != self.task_dof {
            return Err(ControlError::dim("goal position", self.task_dof, goal.len()));
        }
        self.goal_pos.copy_from(goal);
        Ok(())
    }

    /// Set the goal velocity, checking its length
    pub fn set_goal_vel(&mut self, goal: &DVector<f64>) -> ControlResult<()> {
        if goal.len() != self.task_dof {
            return Err(ControlError::dim("goal velocity", self.task_dof, goal.len()));
        }
        self.goal_vel.copy_from(goal);
        Ok(())
    }

    /// Set the goal acceleration, checking its length
    pub fn set_goal_acc(&mut self, goal: &DVector<f64>) -> ControlResult<()> {
        if goal.len() != self.task_dof {
            return Err(ControlError::dim("goal acceleration", self.task_dof, goal.len()));
        }
        self.goal_acc.copy_from(goal);
        Ok(())
    }
}

/// Everything a task may read while computing its model
#[derive(Debug, Clone, Copy)]
pub struct ModelContext<'a> {
    pub sensors: &'a SensorState,
    /// Joint-space model refreshed this tick
    pub gc_model: &'a GcModel,
    /// A⁻¹, shared by all tasks of the tick
    pub a_inv: &'a DMatrix<f64>,
    pub dynamics: &'a dyn DynamicsEngine,
}

/// Computational object of one control objective
pub trait Task: Debug + Send {
    /// Build the task data from its descriptor and resolve engine links
    fn init(
        &mut self,
        desc: &TaskDescriptor,
        dynamics: &dyn DynamicsEngine,
        dof: usize,
    ) -> ControlResult<()>;

    /// Forget all data; the task needs `init` again
    fn reset(&mut self);

    /// Jacobian, task-space mass matrix and null space for this tick
    fn compute_model(&mut self, ctx: &ModelContext<'_>) -> ControlResult<()>;

    /// Task force and its joint-space projection for this tick
    fn compute_servo(&mut self, sensors: &SensorState) -> ControlResult<()>;

    fn data(&self) -> &TaskData;

    fn data_mut(&mut self) -> &mut TaskData;

    fn has_been_init(&self) -> bool {
        self.data().has_been_init
    }

    fn name(&self) -> &str {
        &self.data().name
    }
}
