//! Forward simulation of a joint-space model
//!
//! ddq = A(q)⁻¹ (τ − g(q) − damping∘dq), integrated with semi-implicit Euler.

use nalgebra::DVector;

use crate::dynamics::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::model::{GcModel, SensorState};

/// Simulation history
#[derive(Debug, Clone, Default)]
pub struct SimHistory {
    /// Time stamps [s]
    pub times: Vec<f64>,
    /// Joint positions
    pub positions: Vec<DVector<f64>>,
    /// Commanded joint forces
    pub forces: Vec<DVector<f64>>,
}

impl SimHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a simulation step
    pub fn record(&mut self, time: f64, q: &DVector<f64>, force: &DVector<f64>) {
        self.times.push(time);
        self.positions.push(q.clone());
        self.forces.push(force.clone());
    }

    /// Get simulation duration
    pub fn duration(&self) -> f64 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Simulated robot driven by joint forces
#[derive(Debug)]
pub struct Simulator<E: DynamicsEngine> {
    engine: E,
    model: GcModel,
    sensors: SensorState,
    initial_q: DVector<f64>,
    damping: DVector<f64>,
    time: f64,
    record_history: bool,
    history: SimHistory,
}

impl<E: DynamicsEngine> Simulator<E> {
    /// Start at rest at `initial_q`
    pub fn new(engine: E, initial_q: DVector<f64>) -> ControlResult<Self> {
        let dof = engine.dof();
        if initial_q.len() != dof {
            return Err(ControlError::dim("initial q", dof, initial_q.len()));
        }
        Ok(Self {
            engine,
            model: GcModel::new(dof, 0),
            sensors: SensorState::at_rest(initial_q.clone()),
            initial_q,
            damping: DVector::zeros(dof),
            time: 0.0,
            record_history: true,
            history: SimHistory::new(),
        })
    }

    /// Uniform viscous joint friction
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping.fill(damping);
        self
    }

    pub fn with_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    /// Back to rest at the initial configuration
    pub fn reset(&mut self) {
        self.sensors = SensorState::at_rest(self.initial_q.clone());
        self.time = 0.0;
        self.history = SimHistory::new();
    }

    /// Advance by `dt` under joint force `force`
    pub fn step(&mut self, force: &DVector<f64>, dt: f64) -> ControlResult<()> {
        let dof = self.engine.dof();
        if force.len() != dof {
            return Err(ControlError::dim("simulated joint force", dof, force.len()));
        }
        if self.record_history {
            self.history.record(self.time, self.sensors.q(), force);
        }

        self.engine.update_model_matrices(&self.sensors, &mut self.model)?;
        let rhs = force - &self.model.g - self.damping.component_mul(self.sensors.dq());
        let ddq = self
            .model
            .a
            .clone()
            .cholesky()
            .map(|chol| chol.solve(&rhs))
            .ok_or(ControlError::SingularMatrix("simulated mass matrix"))?;

        let dq = self.sensors.dq() + &ddq * dt;
        let q = self.sensors.q() + &dq * dt;
        self.sensors.update(&q, &dq, &ddq)?;
        self.time += dt;
        Ok(())
    }

    pub fn sensors(&self) -> &SensorState {
        &self.sensors
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn history(&self) -> &SimHistory {
        &self.history
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn dof(&self) -> usize {
        self.engine.dof()
    }
}
