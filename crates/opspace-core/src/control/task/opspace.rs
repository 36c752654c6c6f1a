//! Operational-space quantities shared by the task kinds
//!
//! For a task Jacobian J and joint-space mass matrix A:
//!
//! - Λ = (J A⁻¹ Jᵀ)⁻¹, the task-space mass matrix
//! - J̄ = A⁻¹ Jᵀ Λ, the dynamically consistent generalized inverse
//! - N = I − Jᵀ J̄ᵀ, the force-space null-space projector
//!
//! Forces of the form N τ produce no acceleration along the task: J A⁻¹ N = 0.

use nalgebra::{DMatrix, DVector};

use crate::math::{clamp_elementwise, spd_inverse};

/// Task-space mass matrix Λ = (J A⁻¹ Jᵀ)⁻¹
///
/// Falls back to a pseudo-inverse when the task is singular.
pub fn task_mass_matrix(jacobian: &DMatrix<f64>, a_inv: &DMatrix<f64>) -> DMatrix<f64> {
    let lambda_inv = jacobian * a_inv * jacobian.transpose();
    spd_inverse(&lambda_inv)
}

/// Dynamically consistent generalized inverse J̄ = A⁻¹ Jᵀ Λ
pub fn dyn_consistent_inverse(
    jacobian: &DMatrix<f64>,
    a_inv: &DMatrix<f64>,
    lambda: &DMatrix<f64>,
) -> DMatrix<f64> {
    a_inv * jacobian.transpose() * lambda
}

/// Force null-space projector N = I − Jᵀ J̄ᵀ
pub fn force_null_space(jacobian: &DMatrix<f64>, jacobian_dyn_inv: &DMatrix<f64>) -> DMatrix<f64> {
    let dof = jacobian.ncols();
    DMatrix::identity(dof, dof) - jacobian.transpose() * jacobian_dyn_inv.transpose()
}

/// PD servo with acceleration feedforward, saturated to the task bounds
///
/// f* = ka∘acc + kv∘(goal_vel − dx) + kp∘(goal_pos − x)
#[allow(clippy::too_many_arguments)]
pub fn servo_force(
    kp: &DVector<f64>,
    kv: &DVector<f64>,
    ka: &DVector<f64>,
    pos_err: &DVector<f64>,
    vel_err: &DVector<f64>,
    goal_acc: &DVector<f64>,
    min: &DVector<f64>,
    max: &DVector<f64>,
) -> DVector<f64> {
    let f = ka.component_mul(goal_acc) + kv.component_mul(vel_err) + kp.component_mul(pos_err);
    clamp_elementwise(&f, min, max)
}
