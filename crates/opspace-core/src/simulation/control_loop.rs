//! Closed-loop tick driver
//!
//! Each tick copies the simulated sensor state into the robot I/O buffers,
//! runs one controller tick and steps the simulator with the command. A
//! failed tick leaves the previous command in place and the simulation
//! keeps running on it.

use nalgebra::DVector;
use tracing::{debug, warn};

use super::Simulator;
use crate::control::TaskController;
use crate::dynamics::DynamicsEngine;
use crate::error::ControlResult;
use crate::model::RobotIo;

/// Outcome of a closed-loop run
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub ticks: usize,
    /// Ticks on which the controller failed and the last command was held
    pub failed_ticks: usize,
    pub final_q: DVector<f64>,
    pub final_time: f64,
}

pub struct ControlLoop;

impl ControlLoop {
    /// Run `ticks` control ticks of length `dt`
    ///
    /// Controller failures are counted, not returned; simulator failures
    /// abort the run.
    pub fn run<E: DynamicsEngine>(
        controller: &mut TaskController,
        engine: &mut dyn DynamicsEngine,
        sim: &mut Simulator<E>,
        io: &mut RobotIo,
        ticks: usize,
        dt: f64,
    ) -> ControlResult<LoopReport> {
        let mut failed_ticks = 0;
        for tick in 0..ticks {
            let state = sim.sensors();
            io.sensors.update(state.q(), state.dq(), state.ddq())?;

            if let Err(e) = controller.tick(engine, io) {
                failed_ticks += 1;
                warn!(tick, error = %e, "control tick failed, holding previous command");
            }
            sim.step(&io.actuators.force_gc_commanded, dt)?;
        }

        debug!(ticks, failed_ticks, time = sim.time(), "control loop finished");
        Ok(LoopReport {
            ticks,
            failed_ticks,
            final_q: sim.sensors().q().clone(),
            final_time: sim.time(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{TaskControllerData, TaskDescriptor, TaskRegistry};
    use crate::dynamics::PlanarChain;
    use crate::model::RobotTopology;
    use approx::assert_relative_eq;

    fn setup(
        tasks: Vec<TaskDescriptor>,
    ) -> (TaskController, PlanarChain, Simulator<PlanarChain>, RobotIo) {
        let robot = RobotTopology::planar_chain("arm", 2, 1.0, 1.0);
        let engine = PlanarChain::from_topology(&robot).unwrap();
        let mut data = TaskControllerData::new("arm", robot, 2, tasks);
        data.init().unwrap();
        let mut controller = TaskController::new();
        controller
            .init(data, &engine, &TaskRegistry::with_builtin_tasks())
            .unwrap();
        let sim = Simulator::new(engine.clone(), DVector::from_vec(vec![0.2, 0.3])).unwrap();
        (controller, engine, sim, RobotIo::new("arm", 2))
    }

    #[test]
    fn test_posture_converges() {
        let posture = TaskDescriptor::new("posture", "gc", 0)
            .with_gains(100.0, 20.0)
            .with_goal(vec![0.5, -0.4])
            .with_gravity_comp(true);
        let (mut controller, mut engine, mut sim, mut io) = setup(vec![posture]);

        let report =
            ControlLoop::run(&mut controller, &mut engine, &mut sim, &mut io, 3000, 0.001).unwrap();
        assert_eq!(report.failed_ticks, 0);
        assert_relative_eq!(report.final_q, DVector::from_vec(vec![0.5, -0.4]), epsilon = 1e-3);
        assert_relative_eq!(report.final_time, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_failed_ticks_hold_command() {
        let (mut controller, mut engine, mut sim, mut io) = setup(Vec::new());
        // no tasks: every tick fails and the zero command is held
        let report =
            ControlLoop::run(&mut controller, &mut engine, &mut sim, &mut io, 10, 0.001).unwrap();
        assert_eq!(report.failed_ticks, 10);
        assert_eq!(io.actuators.force_gc_commanded, DVector::zeros(2));
        assert_eq!(sim.history().len(), 10);
    }
}
