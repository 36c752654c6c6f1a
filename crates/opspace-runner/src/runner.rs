//! Closed-loop scenario execution

use std::fmt;

use nalgebra::DVector;
use tracing::info;

use opspace_core::control::{TaskController, TaskControllerData, TaskRegistry};
use opspace_core::dynamics::DynamicsEngine;
use opspace_core::model::RobotIo;
use opspace_core::simulation::{ControlLoop, Simulator};

use crate::scenario::{Scenario, ScenarioError};

/// Final tracking state of one task
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: String,
    pub task_type: String,
    pub level: usize,
    /// ‖goal_pos − x‖ at the end of the run
    pub error: f64,
}

/// Outcome of a scenario run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub robot: String,
    pub ticks: usize,
    pub failed_ticks: usize,
    pub final_time: f64,
    pub final_q: DVector<f64>,
    pub tasks: Vec<TaskReport>,
}

impl RunSummary {
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "robot '{}': {} ticks ({} failed), t = {:.3} s",
            self.robot, self.ticks, self.failed_ticks, self.final_time
        )?;
        let q: Vec<String> = self.final_q.iter().map(|v| format!("{v:.4}")).collect();
        writeln!(f, "  final q = [{}]", q.join(", "))?;
        for task in &self.tasks {
            writeln!(
                f,
                "  [{}] {:<12} {:<14} error = {:.3e}",
                task.level, task.name, task.task_type, task.error
            )?;
        }
        Ok(())
    }
}

/// Build everything a scenario describes and run it
///
/// `ticks` overrides the tick count derived from the simulation duration.
pub fn run_scenario(
    scenario: &Scenario,
    ticks: Option<usize>,
) -> Result<RunSummary, ScenarioError> {
    let robot = scenario.robot.topology()?;
    let mut engine = scenario.robot.engine()?;
    let dof = engine.dof();
    let initial_q = scenario.initial_q(dof)?;

    let mut data = TaskControllerData::from_params(robot, dof, &scenario.controller);
    data.init()?;
    let registry = TaskRegistry::with_builtin_tasks();
    let mut controller = TaskController::new();
    controller.init(data, &engine, &registry)?;

    let sim_config = &scenario.sim;
    let mut sim = Simulator::new(engine.clone(), initial_q)?
        .with_damping(sim_config.joint_damping)
        .with_history(sim_config.record_history);
    let mut io = RobotIo::new(scenario.controller.robot_name.clone(), dof);
    let ticks = ticks.unwrap_or_else(|| sim_config.ticks());

    info!(
        robot = %scenario.robot.name,
        dof,
        tasks = controller.num_tasks(),
        ticks,
        dt = sim_config.dt,
        "running scenario"
    );
    let report = ControlLoop::run(
        &mut controller,
        &mut engine,
        &mut sim,
        &mut io,
        ticks,
        sim_config.dt,
    )?;

    // refresh task coordinates at the final state
    controller.compute_dynamics(&mut engine, sim.sensors())?;
    let mut tasks = Vec::new();
    for (name, level) in controller.task_names() {
        let data = controller.task(name)?.data();
        tasks.push(TaskReport {
            name: name.to_string(),
            task_type: data.task_type.clone(),
            level,
            error: (&data.goal_pos - &data.x).norm(),
        });
    }

    let summary = RunSummary {
        robot: scenario.robot.name.clone(),
        ticks: report.ticks,
        failed_ticks: report.failed_ticks,
        final_time: report.final_time,
        final_q: report.final_q,
        tasks,
    };
    info!(
        failed_ticks = summary.failed_ticks,
        time = summary.final_time,
        "scenario finished"
    );
    Ok(summary)
}
