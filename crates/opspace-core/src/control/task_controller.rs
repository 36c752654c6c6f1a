//! Task controller: prioritized multi-task control
//!
//! Owns a set of named tasks grouped into priority levels. Each tick:
//!
//! 1. [`compute_dynamics`](TaskController::compute_dynamics) refreshes A and
//!    g, runs every task's model and assigns range spaces top-down. Level 0
//!    acts in the full joint space; every following level acts in the space
//!    the levels above it leave unused.
//! 2. [`compute_control_forces`](TaskController::compute_control_forces)
//!    runs every task's servo law and sums the range-filtered forces into the
//!    actuator command.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::gc::bind_com_records;
use super::multilevel::MultiLevelMap;
use super::registry::TaskRegistry;
use super::servo::Servo;
use super::task::{ModelContext, Task, TaskDescriptor};
use crate::dynamics::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::math::spd_inverse;
use crate::model::{GcModel, RobotIo, RobotTopology, SensorState};

/// Highest accepted priority level
pub const MAX_PRIORITY_LEVELS: usize = 64;

/// Serializable task controller setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskControllerParams {
    /// Robot the controller drives
    pub robot_name: String,
    /// Task descriptors; each carries its own priority
    #[serde(default)]
    pub tasks: Vec<TaskDescriptor>,
}

/// Data bound to a task controller at init
#[derive(Debug, Clone)]
pub struct TaskControllerData {
    pub robot_name: String,
    pub robot: RobotTopology,
    pub gc_model: GcModel,
    pub tasks: Vec<TaskDescriptor>,
    dof: usize,
    has_been_init: bool,
}

impl TaskControllerData {
    pub fn new(
        robot_name: impl Into<String>,
        robot: RobotTopology,
        dof: usize,
        tasks: Vec<TaskDescriptor>,
    ) -> Self {
        let num_links = robot.num_non_root_links();
        Self {
            robot_name: robot_name.into(),
            robot,
            gc_model: GcModel::new(dof, num_links),
            tasks,
            dof,
            has_been_init: false,
        }
    }

    pub fn from_params(robot: RobotTopology, dof: usize, params: &TaskControllerParams) -> Self {
        Self::new(params.robot_name.clone(), robot, dof, params.tasks.clone())
    }

    pub fn dof(&self) -> usize {
        self.dof
    }

    /// Validate names and levels, then mark the data usable
    pub fn init(&mut self) -> ControlResult<()> {
        self.has_been_init = false;
        if self.dof == 0 {
            return Err(ControlError::InvalidConfig(
                "task controller needs at least one dof".into(),
            ));
        }
        if self.gc_model.dof() != self.dof {
            return Err(ControlError::dim("gc model", self.dof, self.gc_model.dof()));
        }
        for (i, desc) in self.tasks.iter().enumerate() {
            if desc.priority > MAX_PRIORITY_LEVELS {
                return Err(ControlError::InvalidLevel {
                    level: desc.priority,
                    max: MAX_PRIORITY_LEVELS,
                });
            }
            if self.tasks[..i].iter().any(|d| d.name == desc.name) {
                return Err(ControlError::DuplicateTask(desc.name.clone()));
            }
        }
        self.has_been_init = true;
        Ok(())
    }

    pub fn has_been_init(&self) -> bool {
        self.has_been_init
    }
}

#[derive(Debug, Default)]
pub struct TaskController {
    data: Option<TaskControllerData>,
    tasks: MultiLevelMap<String, Box<dyn Task>>,
    active_task: Option<String>,
    servo: Servo,
    a_inv: DMatrix<f64>,
    unused_null_space: DMatrix<f64>,
}

impl TaskController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind data and build every described task through `registry`
    ///
    /// Levels are walked in ascending order and descriptors in list order
    /// within a level. Any failure leaves the controller uninitialized.
    pub fn init(
        &mut self,
        mut data: TaskControllerData,
        dynamics: &dyn DynamicsEngine,
        registry: &TaskRegistry,
    ) -> ControlResult<()> {
        self.reset();
        let robot_name = data.robot_name.clone();
        if let Err(e) = Self::bind(&mut data, dynamics) {
            error!(robot = %robot_name, error = %e, "task controller init failed");
            return Err(e);
        }

        let dof = data.dof;
        self.servo.init(dof)?;
        self.a_inv = DMatrix::identity(dof, dof);
        self.unused_null_space = DMatrix::identity(dof, dof);
        let descriptors = data.tasks.clone();
        if let Some(desc) = descriptors.iter().find(|d| d.priority > MAX_PRIORITY_LEVELS) {
            let err = ControlError::InvalidLevel {
                level: desc.priority,
                max: MAX_PRIORITY_LEVELS,
            };
            error!(
                robot = %robot_name,
                task = %desc.name,
                error = %err,
                "task controller init failed"
            );
            self.reset();
            return Err(err);
        }
        let max_priority = descriptors.iter().map(|d| d.priority).max();
        self.data = Some(data);

        for level in max_priority.map_or(0..=0, |max| 0..=max) {
            for desc in descriptors.iter().filter(|d| d.priority == level) {
                if let Err(e) = self.build_task(desc, dynamics, registry, dof) {
                    let err = ControlError::TaskInitFailed {
                        name: desc.name.clone(),
                        task_type: desc.task_type.clone(),
                        level,
                        source: Box::new(e),
                    };
                    error!(robot = %robot_name, error = %err, "task controller init failed");
                    self.reset();
                    return Err(err);
                }
            }
        }

        info!(
            robot = %robot_name,
            dof,
            tasks = self.tasks.len(),
            levels = self.tasks.num_levels(),
            "task controller initialized"
        );
        Ok(())
    }

    fn bind(data: &mut TaskControllerData, dynamics: &dyn DynamicsEngine) -> ControlResult<()> {
        if !data.has_been_init() {
            return Err(ControlError::Uninitialized {
                what: "task controller data",
            });
        }
        if !dynamics.has_been_init() {
            return Err(ControlError::Uninitialized {
                what: "dynamics engine",
            });
        }
        if dynamics.dof() != data.dof {
            return Err(ControlError::dim("dynamics engine dof", data.dof, dynamics.dof()));
        }
        bind_com_records(&data.robot, &mut data.gc_model, dynamics)
    }

    fn build_task(
        &mut self,
        desc: &TaskDescriptor,
        dynamics: &dyn DynamicsEngine,
        registry: &TaskRegistry,
        dof: usize,
    ) -> ControlResult<()> {
        let mut task = registry.create(&desc.task_type)?;
        task.init(desc, dynamics, dof)?;
        self.add_task(desc.name.clone(), task, desc.priority)
    }

    /// Drop all tasks and data; always succeeds
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.active_task = None;
        self.servo.reset();
        self.data = None;
        self.a_inv = DMatrix::zeros(0, 0);
        self.unused_null_space = DMatrix::zeros(0, 0);
    }

    pub fn has_been_init(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&TaskControllerData> {
        self.data.as_ref()
    }

    /// Register an initialized task at `level`
    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        task: Box<dyn Task>,
        level: usize,
    ) -> ControlResult<()> {
        let name = name.into();
        let Some(data) = self.data.as_ref() else {
            warn!(task = %name, "add_task on an uninitialized controller");
            return Err(ControlError::NotInitialized);
        };
        if !task.has_been_init() {
            warn!(task = %name, "add_task with an uninitialized task");
            return Err(ControlError::TaskNotInitialized(name));
        }
        if task.data().dof != data.dof {
            return Err(ControlError::dim("task dof", data.dof, task.data().dof));
        }
        if level > MAX_PRIORITY_LEVELS {
            return Err(ControlError::InvalidLevel {
                level,
                max: MAX_PRIORITY_LEVELS,
            });
        }
        if self.tasks.create(name.clone(), task, level).is_err() {
            warn!(task = %name, "duplicate task name");
            return Err(ControlError::DuplicateTask(name));
        }
        if self.tasks.len() == 1 {
            self.active_task = Some(name.clone());
        }
        debug!(task = %name, level, count = self.tasks.len(), "task added");
        Ok(())
    }

    /// Remove and drop a task
    pub fn remove_task(&mut self, name: &str) -> ControlResult<()> {
        if self.tasks.erase(name).is_none() {
            warn!(task = %name, "remove_task: no such task");
            return Err(ControlError::TaskNotFound(name.to_string()));
        }
        self.active_task = match self.tasks.len() {
            1 => self.tasks.first().map(|(k, _)| k.clone()),
            0 => None,
            _ if self.active_task.as_deref() == Some(name) => None,
            _ => self.active_task.take(),
        };
        debug!(task = %name, count = self.tasks.len(), "task removed");
        Ok(())
    }

    pub fn task(&self, name: &str) -> ControlResult<&dyn Task> {
        match self.tasks.at(name) {
            Some(task) => Ok(&**task),
            None => Err(ControlError::TaskNotFound(name.to_string())),
        }
    }

    /// Task access for changing goals and gains at runtime
    pub fn task_mut(&mut self, name: &str) -> ControlResult<&mut (dyn Task + 'static)> {
        self.tasks
            .at_mut(name)
            .map(|t| &mut **t)
            .ok_or_else(|| ControlError::TaskNotFound(name.to_string()))
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Number of tasks whose type tag is `task_type`
    pub fn num_tasks_of_type(&self, task_type: &str) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.data().task_type == task_type)
            .count()
    }

    pub fn task_level(&self, name: &str) -> ControlResult<usize> {
        self.tasks
            .level_of(name)
            .ok_or_else(|| ControlError::TaskNotFound(name.to_string()))
    }

    pub fn num_levels(&self) -> usize {
        self.tasks.num_levels()
    }

    /// Task names with their levels in evaluation order
    pub fn task_names(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tasks.keys().map(|(k, level)| (k.as_str(), level))
    }

    /// Task used on the single-task path
    pub fn active_task(&self) -> Option<&str> {
        self.active_task.as_deref()
    }

    /// Joint-space directions left unused by every level after the last
    /// cascade
    pub fn unused_null_space(&self) -> &DMatrix<f64> {
        &self.unused_null_space
    }

    /// Last servo command
    pub fn servo_force_gc(&self) -> &DVector<f64> {
        self.servo.force_gc()
    }

    /// Refresh the joint-space model, every task model and the range spaces
    pub fn compute_dynamics(
        &mut self,
        dynamics: &mut dyn DynamicsEngine,
        sensors: &SensorState,
    ) -> ControlResult<()> {
        let data = self.data.as_mut().ok_or(ControlError::NotInitialized)?;
        sensors.check_dof(data.dof)?;
        if let Err(e) = dynamics.update_model_matrices(sensors, &mut data.gc_model) {
            warn!(robot = %data.robot_name, error = %e, "dynamics update failed");
            return Err(ControlError::DynamicsUpdateFailed(e.to_string()));
        }
        if self.tasks.is_empty() {
            warn!(robot = %data.robot_name, "no tasks to compute");
            return Err(ControlError::NoTasks);
        }

        let dof = data.dof;
        self.a_inv = spd_inverse(&data.gc_model.a);
        let ctx = ModelContext {
            sensors,
            gc_model: &data.gc_model,
            a_inv: &self.a_inv,
            dynamics: &*dynamics,
        };

        if self.tasks.len() == 1 {
            let name = self.active_task.as_deref().ok_or(ControlError::NoTasks)?;
            let task = self
                .tasks
                .at_mut(name)
                .ok_or_else(|| ControlError::TaskNotFound(name.to_string()))?;
            task.compute_model(&ctx).map_err(|e| task_failed(&**task, e))?;
            task.data_mut().range_space = DMatrix::identity(dof, dof);
            self.unused_null_space = task.data().null_space.clone();
            return Ok(());
        }

        for task in self.tasks.iter_mut() {
            task.compute_model(&ctx).map_err(|e| task_failed(&**task, e))?;
        }
        self.compute_range_spaces(dof);
        Ok(())
    }

    /// Assign range spaces level by level
    fn compute_range_spaces(&mut self, dof: usize) {
        let mut null_space = DMatrix::identity(dof, dof);
        for level in 0..self.tasks.num_levels() {
            let mut level_null = DMatrix::identity(dof, dof);
            for task in self.tasks.level_mut(level) {
                let d = task.data_mut();
                d.range_space.clone_from(&null_space);
                level_null = &level_null * &d.null_space;
            }
            null_space = &null_space * &level_null;
        }
        self.unused_null_space = null_space;
    }

    /// Run every servo law and write the combined command to `io`
    ///
    /// `io.actuators` is left untouched when any step fails.
    pub fn compute_control_forces(&mut self, io: &mut RobotIo) -> ControlResult<()> {
        let data = self.data.as_ref().ok_or(ControlError::NotInitialized)?;
        io.sensors.check_dof(data.dof)?;
        if io.actuators.force_gc_commanded.len() != data.dof {
            return Err(ControlError::dim(
                "actuator command",
                data.dof,
                io.actuators.force_gc_commanded.len(),
            ));
        }
        if self.tasks.is_empty() {
            warn!(robot = %data.robot_name, "no tasks to compute");
            return Err(ControlError::NoTasks);
        }

        if self.tasks.len() == 1 {
            let name = self.active_task.as_deref().ok_or(ControlError::NoTasks)?;
            let task = self
                .tasks
                .at_mut(name)
                .ok_or_else(|| ControlError::TaskNotFound(name.to_string()))?;
            task.compute_servo(&io.sensors).map_err(|e| task_failed(&**task, e))?;
            self.servo.compute_control_forces(std::iter::once(task.data()))?;
            io.actuators.force_gc_commanded.copy_from(&task.data().force_gc);
            return Ok(());
        }

        for task in self.tasks.iter_mut() {
            task.compute_servo(&io.sensors).map_err(|e| task_failed(&**task, e))?;
        }
        let command = self
            .servo
            .compute_control_forces(self.tasks.iter().map(|t| t.data()))?;
        io.actuators.force_gc_commanded.copy_from(command);
        Ok(())
    }

    /// One control tick: model then forces
    pub fn tick(
        &mut self,
        dynamics: &mut dyn DynamicsEngine,
        io: &mut RobotIo,
    ) -> ControlResult<()> {
        self.compute_dynamics(dynamics, &io.sensors)?;
        self.compute_control_forces(io)
    }
}

fn task_failed(task: &dyn Task, source: ControlError) -> ControlError {
    let err = ControlError::TaskComputeFailed {
        name: task.data().name.clone(),
        source: Box::new(source),
    };
    warn!(error = %err, "task computation failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::PlanarChain;
    use crate::math::rank;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    const DOF: usize = 3;

    fn engine() -> PlanarChain {
        PlanarChain::from_topology(&robot()).unwrap()
    }

    fn robot() -> RobotTopology {
        RobotTopology::planar_chain("arm", DOF, 1.0, 1.0)
    }

    fn posture(level: usize) -> TaskDescriptor {
        TaskDescriptor::new("posture", "gc", level)
            .with_gains(10.0, 3.0)
            .with_gravity_comp(true)
    }

    fn hand(level: usize) -> TaskDescriptor {
        TaskDescriptor::new("hand", "op_pos", level)
            .with_task_dof(1)
            .with_gains(50.0, 10.0)
            .on_link("link2", Vector3::new(1.0, 0.0, 0.0))
    }

    fn controller(tasks: Vec<TaskDescriptor>) -> TaskController {
        let mut data = TaskControllerData::new("arm", robot(), DOF, tasks);
        data.init().unwrap();
        let mut ctrl = TaskController::new();
        ctrl.init(data, &engine(), &TaskRegistry::with_builtin_tasks())
            .unwrap();
        ctrl
    }

    fn io() -> RobotIo {
        let mut io = RobotIo::new("arm", DOF);
        io.sensors = SensorState::at_rest(DVector::from_vec(vec![0.3, 0.5, -0.4]));
        io
    }

    fn built_task(desc: &TaskDescriptor) -> Box<dyn Task> {
        let mut task = TaskRegistry::with_builtin_tasks()
            .create(&desc.task_type)
            .unwrap();
        task.init(desc, &engine(), DOF).unwrap();
        task
    }

    #[test]
    fn test_init_builds_tasks_by_level() {
        let ctrl = controller(vec![posture(1), hand(0)]);
        assert!(ctrl.has_been_init());
        assert_eq!(ctrl.num_tasks(), 2);
        assert_eq!(ctrl.num_levels(), 2);
        assert_eq!(ctrl.task_level("hand").unwrap(), 0);
        assert_eq!(ctrl.num_tasks_of_type("gc"), 1);
        assert_eq!(
            ctrl.task_names().collect::<Vec<_>>(),
            vec![("hand", 0), ("posture", 1)]
        );
        assert_eq!(ctrl.data().map(|d| d.gc_model.mass), Some(3.0));
    }

    #[test]
    fn test_init_failure_names_task_type_and_level() {
        let mut bad = hand(2);
        bad.link = Some("palm".into());
        let mut data = TaskControllerData::new("arm", robot(), DOF, vec![posture(0), bad]);
        data.init().unwrap();

        let mut ctrl = TaskController::new();
        let err = ctrl
            .init(data, &engine(), &TaskRegistry::with_builtin_tasks())
            .unwrap_err();
        match err {
            ControlError::TaskInitFailed {
                name,
                task_type,
                level,
                source,
            } => {
                assert_eq!(name, "hand");
                assert_eq!(task_type, "op_pos");
                assert_eq!(level, 2);
                assert!(matches!(*source, ControlError::UnknownLink(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!ctrl.has_been_init());
        assert_eq!(ctrl.num_tasks(), 0);
    }

    #[test]
    fn test_init_unregistered_type() {
        let mut data = TaskControllerData::new(
            "arm",
            robot(),
            DOF,
            vec![TaskDescriptor::new("ori", "op_ori", 0)],
        );
        data.init().unwrap();
        let err = TaskController::new()
            .init(data, &engine(), &TaskRegistry::with_builtin_tasks())
            .unwrap_err();
        assert!(format!("{err}").contains("op_ori"));
    }

    #[test]
    fn test_data_rejects_duplicate_names_and_high_levels() {
        let mut data = TaskControllerData::new("arm", robot(), DOF, vec![posture(0), posture(1)]);
        assert!(matches!(data.init(), Err(ControlError::DuplicateTask(_))));

        let mut data = TaskControllerData::new("arm", robot(), DOF, vec![posture(65)]);
        assert!(matches!(data.init(), Err(ControlError::InvalidLevel { level: 65, .. })));
    }

    #[test]
    fn test_init_rechecks_levels_after_data_init() {
        let mut data = TaskControllerData::new("arm", robot(), DOF, vec![posture(0)]);
        data.init().unwrap();
        data.tasks[0].priority = usize::MAX;

        let mut ctrl = TaskController::new();
        let err = ctrl
            .init(data, &engine(), &TaskRegistry::with_builtin_tasks())
            .unwrap_err();
        assert!(matches!(
            err,
            ControlError::InvalidLevel {
                level: usize::MAX,
                max: MAX_PRIORITY_LEVELS
            }
        ));
        assert!(!ctrl.has_been_init());
        assert_eq!(ctrl.num_tasks(), 0);
    }

    #[test]
    fn test_single_task_range_is_identity() {
        let mut ctrl = controller(vec![posture(3)]);
        let mut io = io();
        for _ in 0..3 {
            ctrl.tick(&mut engine(), &mut io).unwrap();
            let task = ctrl.task("posture").unwrap();
            assert_relative_eq!(task.data().range_space, DMatrix::identity(DOF, DOF));
            assert_eq!(io.actuators.force_gc_commanded.len(), DOF);
            assert_eq!(io.actuators.force_gc_commanded, task.data().force_gc);
        }
        assert_eq!(ctrl.active_task(), Some("posture"));
    }

    #[test]
    fn test_cascade_ranges() {
        let mut ctrl = controller(vec![hand(0), posture(1)]);
        let mut io = io();
        ctrl.tick(&mut engine(), &mut io).unwrap();

        let top = ctrl.task("hand").unwrap().data();
        let low = ctrl.task("posture").unwrap().data();
        assert_relative_eq!(top.range_space, DMatrix::identity(DOF, DOF));
        assert_relative_eq!(low.range_space, top.null_space, epsilon = 1e-12);
        assert_eq!(rank(&low.range_space, 1e-6), 2);

        // posture forces do not disturb the hand
        let a_inv = engine().mass_matrix(io.sensors.q()).map(|a| spd_inverse(&a)).unwrap();
        assert_relative_eq!(
            &top.jacobian * &a_inv * &low.range_space,
            DMatrix::zeros(1, DOF),
            epsilon = 1e-9
        );

        let expected = &top.force_gc + &low.range_space * &low.force_gc;
        assert_relative_eq!(io.actuators.force_gc_commanded, expected, epsilon = 1e-9);
        // gc task uses every remaining direction
        assert_relative_eq!(
            ctrl.unused_null_space().clone(),
            DMatrix::zeros(DOF, DOF),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_empty_level_is_identity() {
        let mut ctrl = controller(vec![hand(0), posture(2)]);
        let mut io = io();
        ctrl.tick(&mut engine(), &mut io).unwrap();
        let top = ctrl.task("hand").unwrap().data().null_space.clone();
        let low = ctrl.task("posture").unwrap().data().range_space.clone();
        assert_eq!(ctrl.num_levels(), 3);
        assert_relative_eq!(low, top, epsilon = 1e-12);
    }

    #[test]
    fn test_add_and_remove() {
        let mut ctrl = controller(vec![posture(0)]);
        ctrl.add_task("hand", built_task(&hand(0)), 0).unwrap();
        assert_eq!(ctrl.num_tasks(), 2);

        // duplicate name
        let err = ctrl.add_task("hand", built_task(&hand(0)), 1).unwrap_err();
        assert!(matches!(err, ControlError::DuplicateTask(_)));
        // uninitialized task
        let raw = TaskRegistry::with_builtin_tasks().create("gc").unwrap();
        let err = ctrl.add_task("raw", raw, 1).unwrap_err();
        assert!(matches!(err, ControlError::TaskNotInitialized(_)));
        // level out of range
        let err = ctrl.add_task("far", built_task(&posture(0)), 65).unwrap_err();
        assert!(matches!(err, ControlError::InvalidLevel { .. }));
        assert_eq!(ctrl.num_tasks(), 2);

        // unknown name has no side effects
        assert!(matches!(
            ctrl.remove_task("nope"),
            Err(ControlError::TaskNotFound(_))
        ));
        assert_eq!(ctrl.num_tasks(), 2);

        ctrl.remove_task("posture").unwrap();
        assert_eq!(ctrl.num_tasks(), 1);
        assert_eq!(ctrl.active_task(), Some("hand"));

        let mut io = io();
        ctrl.tick(&mut engine(), &mut io).unwrap();

        ctrl.remove_task("hand").unwrap();
        assert_eq!(ctrl.active_task(), None);
        assert!(matches!(
            ctrl.compute_dynamics(&mut engine(), &io.sensors),
            Err(ControlError::NoTasks)
        ));
    }

    #[test]
    fn test_reset_tears_down() {
        let mut ctrl = controller(vec![posture(0), hand(1)]);
        ctrl.reset();
        assert_eq!(ctrl.num_tasks(), 0);
        assert!(!ctrl.has_been_init());
        let err = ctrl.add_task("posture", built_task(&posture(0)), 0).unwrap_err();
        assert!(matches!(err, ControlError::NotInitialized));
        assert!(ctrl.task("hand").is_err());
    }

    #[test]
    fn test_failed_tick_leaves_command_untouched() {
        let mut ctrl = controller(vec![posture(0), hand(1)]);
        let mut io = io();
        io.actuators.force_gc_commanded = DVector::from_element(DOF, 7.0);
        let mut wrong = RobotIo::new("arm", DOF + 1);
        wrong.actuators.force_gc_commanded = DVector::from_element(DOF + 1, 7.0);

        assert!(ctrl.compute_control_forces(&mut wrong).is_err());
        assert_eq!(wrong.actuators.force_gc_commanded, DVector::from_element(DOF + 1, 7.0));

        assert!(ctrl.compute_dynamics(&mut engine(), &wrong.sensors).is_err());
        ctrl.tick(&mut engine(), &mut io).unwrap();
        assert_ne!(io.actuators.force_gc_commanded, DVector::from_element(DOF, 7.0));
    }

    #[test]
    fn test_uninitialized_controller() {
        let mut ctrl = TaskController::new();
        let mut io = io();
        assert!(matches!(
            ctrl.tick(&mut engine(), &mut io),
            Err(ControlError::NotInitialized)
        ));
        assert!(matches!(
            ctrl.add_task("posture", built_task(&posture(0)), 0),
            Err(ControlError::NotInitialized)
        ));
    }
}
