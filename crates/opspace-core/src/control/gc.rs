//! Joint-space (generalized coordinate) controller
//!
//! Single-objective PD control with gravity compensation over the full
//! joint space. Every law computes a dynamically decoupled unit-mass force
//! f*, saturates it, and maps it through the mass matrix:
//!
//! F = A(q)·clamp(f*, f_min, f_max) + g(q)
//!
//! Saturation bounds the commanded acceleration rather than the raw torque.
//! Centrifugal/Coriolis forces are never included; they destabilize the
//! loop.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::dynamics::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::math::clamp_elementwise;
use crate::model::{GcModel, RobotTopology, SensorState};

/// Which decoupled-force law to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcControlMode {
    /// f* = ddq_des + kv∘(dq_des − dq) + kp∘(q_des − q)
    #[default]
    Full,
    /// f* = −kv∘dq − kp∘(q − q_des)
    Pd,
    /// f* = −kv∘dq (gravity compensation with damping)
    Float,
}

/// Serializable gains and limits for a joint-space controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcControllerParams {
    /// Proportional gains
    pub kp: Vec<f64>,
    /// Velocity gains
    pub kv: Vec<f64>,
    /// Acceleration gains
    #[serde(default)]
    pub ka: Vec<f64>,
    /// Integral gains
    #[serde(default)]
    pub ki: Vec<f64>,
    /// Lower bound of the decoupled force (unbounded when empty)
    #[serde(default)]
    pub force_gc_min: Vec<f64>,
    /// Upper bound of the decoupled force (unbounded when empty)
    #[serde(default)]
    pub force_gc_max: Vec<f64>,
    /// Initial desired position (zeros when empty)
    #[serde(default)]
    pub des_q: Vec<f64>,
}

/// Per-controller data: goals, gains, limits and the joint-space model
#[derive(Debug, Clone)]
pub struct GcControllerData {
    /// Robot this controller drives
    pub robot_name: String,
    /// Link tree of the robot
    pub robot: RobotTopology,
    /// Desired position
    pub des_q: DVector<f64>,
    /// Desired velocity
    pub des_dq: DVector<f64>,
    /// Desired acceleration (feedforward)
    pub des_ddq: DVector<f64>,
    pub kp: DVector<f64>,
    pub kv: DVector<f64>,
    pub ka: DVector<f64>,
    pub ki: DVector<f64>,
    /// Lower bound of the decoupled force f*
    pub force_gc_min: DVector<f64>,
    /// Upper bound of the decoupled force f*
    pub force_gc_max: DVector<f64>,
    /// Joint-space dynamic model
    pub gc_model: GcModel,
    /// Last saturated decoupled force
    pub f_star: DVector<f64>,
    /// Last commanded generalized force
    pub des_force_gc: DVector<f64>,
    has_been_init: bool,
}

impl GcControllerData {
    /// Zero goals and gains, unbounded forces
    pub fn new(robot_name: impl Into<String>, robot: RobotTopology, dof: usize) -> Self {
        let num_links = robot.num_non_root_links();
        Self {
            robot_name: robot_name.into(),
            robot,
            des_q: DVector::zeros(dof),
            des_dq: DVector::zeros(dof),
            des_ddq: DVector::zeros(dof),
            kp: DVector::zeros(dof),
            kv: DVector::zeros(dof),
            ka: DVector::zeros(dof),
            ki: DVector::zeros(dof),
            force_gc_min: DVector::from_element(dof, f64::NEG_INFINITY),
            force_gc_max: DVector::from_element(dof, f64::INFINITY),
            gc_model: GcModel::new(dof, num_links),
            f_star: DVector::zeros(dof),
            des_force_gc: DVector::zeros(dof),
            has_been_init: false,
        }
    }

    /// Build from serialized parameters
    ///
    /// Empty gain and goal lists default to zeros, empty force bounds to
    /// ±∞. The result still needs [`init`](Self::init).
    pub fn from_params(
        robot_name: impl Into<String>,
        robot: RobotTopology,
        dof: usize,
        params: &GcControllerParams,
    ) -> ControlResult<Self> {
        let mut data = Self::new(robot_name, robot, dof);
        let vec_or = |what: &'static str, v: &[f64], fill: f64| -> ControlResult<DVector<f64>> {
            match v.len() {
                0 => Ok(DVector::from_element(dof, fill)),
                n if n == dof => Ok(DVector::from_column_slice(v)),
                n => Err(ControlError::dim(what, dof, n)),
            }
        };
        let vec_or_zeros = |what: &'static str, v: &[f64]| vec_or(what, v, 0.0);
        data.kp = vec_or_zeros("kp", &params.kp)?;
        data.kv = vec_or_zeros("kv", &params.kv)?;
        data.ka = vec_or_zeros("ka", &params.ka)?;
        data.ki = vec_or_zeros("ki", &params.ki)?;
        data.force_gc_min = vec_or("force_gc_min", &params.force_gc_min, f64::NEG_INFINITY)?;
        data.force_gc_max = vec_or("force_gc_max", &params.force_gc_max, f64::INFINITY)?;
        data.des_q = vec_or_zeros("des_q", &params.des_q)?;
        Ok(data)
    }

    /// Degrees of freedom
    pub fn dof(&self) -> usize {
        self.des_q.len()
    }

    /// Validate dimensions and bounds, then mark as initialized
    pub fn init(&mut self) -> ControlResult<()> {
        self.has_been_init = false;
        let dof = self.dof();
        let vectors = [
            ("des_dq", &self.des_dq),
            ("des_ddq", &self.des_ddq),
            ("kp", &self.kp),
            ("kv", &self.kv),
            ("ka", &self.ka),
            ("ki", &self.ki),
            ("force_gc_min", &self.force_gc_min),
            ("force_gc_max", &self.force_gc_max),
        ];
        for (what, v) in vectors {
            if v.len() != dof {
                return Err(ControlError::dim(what, dof, v.len()));
            }
        }
        if self.gc_model.dof() != dof {
            return Err(ControlError::dim("gc model", dof, self.gc_model.dof()));
        }
        if let Some(i) = (0..dof).find(|&i| self.force_gc_min[i] > self.force_gc_max[i]) {
            return Err(ControlError::InvalidConfig(format!(
                "force_gc_min[{i}] = {} exceeds force_gc_max[{i}] = {}",
                self.force_gc_min[i], self.force_gc_max[i]
            )));
        }
        self.has_been_init = true;
        Ok(())
    }

    pub fn has_been_init(&self) -> bool {
        self.has_been_init
    }
}

/// Joint-space controller
#[derive(Debug, Default)]
pub struct GcController {
    data: Option<GcControllerData>,
}

impl GcController {
    pub fn new() -> Self {
        Self { data: None }
    }

    /// Bind controller data and check it against the dynamics engine
    ///
    /// Walks the robot's link tree in lockstep with the gc model's COM
    /// records, skipping root links, binding each record to its link and
    /// accumulating the total mass. A length mismatch in either direction
    /// leaves the controller uninitialized.
    pub fn init(
        &mut self,
        mut data: GcControllerData,
        dynamics: &dyn DynamicsEngine,
    ) -> ControlResult<()> {
        self.reset();
        let result = Self::bind(&mut data, dynamics);
        match result {
            Ok(()) => {
                debug!(
                    robot = %data.robot_name,
                    dof = data.dof(),
                    mass = data.gc_model.mass,
                    "gc controller initialized"
                );
                self.data = Some(data);
                Ok(())
            }
            Err(e) => {
                error!(robot = %data.robot_name, error = %e, "gc controller init failed");
                Err(e)
            }
        }
    }

    fn bind(data: &mut GcControllerData, dynamics: &dyn DynamicsEngine) -> ControlResult<()> {
        if !data.has_been_init() {
            return Err(ControlError::Uninitialized {
                what: "controller data",
            });
        }
        if !dynamics.has_been_init() {
            return Err(ControlError::Uninitialized {
                what: "dynamics engine",
            });
        }
        if dynamics.dof() != data.dof() {
            return Err(ControlError::dim("dynamics engine dof", data.dof(), dynamics.dof()));
        }
        bind_com_records(&data.robot, &mut data.gc_model, dynamics)
    }

    /// Unbind all data; always succeeds
    pub fn reset(&mut self) {
        self.data = None;
    }

    pub fn has_been_init(&self) -> bool {
        self.data.is_some()
    }

    /// Bound data, if initialized
    pub fn data(&self) -> Option<&GcControllerData> {
        self.data.as_ref()
    }

    /// Bound data for changing goals and gains at runtime
    pub fn data_mut(&mut self) -> Option<&mut GcControllerData> {
        self.data.as_mut()
    }

    fn ready(&mut self, sensors: &SensorState) -> ControlResult<&mut GcControllerData> {
        let data = self.data.as_mut().ok_or(ControlError::NotInitialized)?;
        sensors.check_dof(data.dof())?;
        Ok(data)
    }

    /// Refresh A and g from the current sensor state
    pub fn compute_dynamics(
        &mut self,
        dynamics: &mut dyn DynamicsEngine,
        sensors: &SensorState,
    ) -> ControlResult<()> {
        let data = self.ready(sensors)?;
        if let Err(e) = dynamics.update_model_matrices(sensors, &mut data.gc_model) {
            warn!(robot = %data.robot_name, error = %e, "dynamics update failed");
            return Err(ControlError::DynamicsUpdateFailed(e.to_string()));
        }
        Ok(())
    }

    /// Feedforward + PD law
    pub fn compute_control_forces(&mut self, sensors: &SensorState) -> ControlResult<()> {
        let data = self.ready(sensors)?;
        let pos = data.kp.component_mul(&(&data.des_q - sensors.q()));
        let vel = data.kv.component_mul(&(&data.des_dq - sensors.dq()));
        let f_star = &data.des_ddq + vel + pos;
        apply_decoupled_force(data, &f_star);
        Ok(())
    }

    /// PD law without acceleration feedforward
    pub fn compute_pd_control_forces(&mut self, sensors: &SensorState) -> ControlResult<()> {
        let data = self.ready(sensors)?;
        let pos = data.kp.component_mul(&(sensors.q() - &data.des_q));
        let vel = data.kv.component_mul(sensors.dq());
        let f_star = -vel - pos;
        apply_decoupled_force(data, &f_star);
        Ok(())
    }

    /// Damping-only law: gravity compensation that stays backdrivable
    pub fn compute_float_forces(&mut self, sensors: &SensorState) -> ControlResult<()> {
        let data = self.ready(sensors)?;
        let f_star = -data.kv.component_mul(sensors.dq());
        apply_decoupled_force(data, &f_star);
        Ok(())
    }

    /// Run the law selected by `mode`
    pub fn compute(&mut self, mode: GcControlMode, sensors: &SensorState) -> ControlResult<()> {
        match mode {
            GcControlMode::Full => self.compute_control_forces(sensors),
            GcControlMode::Pd => self.compute_pd_control_forces(sensors),
            GcControlMode::Float => self.compute_float_forces(sensors),
        }
    }

    /// Last commanded generalized force
    pub fn control_forces(&self) -> Option<&DVector<f64>> {
        self.data.as_ref().map(|d| &d.des_force_gc)
    }
}

/// Saturate f* and map it through the mass matrix with gravity compensation
fn apply_decoupled_force(data: &mut GcControllerData, f_star: &DVector<f64>) {
    data.f_star = clamp_elementwise(f_star, &data.force_gc_min, &data.force_gc_max);
    data.des_force_gc = &data.gc_model.a * &data.f_star + &data.gc_model.g;
}

/// Bind every COM record to the matching non-root link of `robot`
///
/// Also used by the task controller, which carries its own gc model.
pub(crate) fn bind_com_records(
    robot: &RobotTopology,
    model: &mut GcModel,
    dynamics: &dyn DynamicsEngine,
) -> ControlResult<()> {
    let topology = robot.num_non_root_links();
    if model.coms.len() != topology {
        return Err(ControlError::InconsistentModel {
            model: model.coms.len(),
            topology,
        });
    }

    model.mass = 0.0;
    for (com, link) in model.coms.iter_mut().zip(robot.non_root_links()) {
        let id = dynamics
            .id_for_link(&link.name)
            .ok_or_else(|| ControlError::UnknownLink(link.name.clone()))?;
        com.link_name = link.name.clone();
        com.dynamic_id = Some(id);
        com.link = Some(link.clone());
        model.mass += link.mass;
    }
    Ok(())
}
