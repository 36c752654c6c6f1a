//! Dynamics engine interface
//!
//! The control core never computes rigid-body dynamics itself. It consumes
//! them through [`DynamicsEngine`]: mass matrix and gravity refresh, link
//! lookup, and Jacobian / transform queries keyed by link.
//!
//! [`PlanarChain`] is a reference engine for serial chains of revolute
//! joints about z.

pub mod planar;

pub use planar::*;

use std::fmt::Debug;

use nalgebra::{DMatrix, Isometry3, Point3, Vector3};

use crate::error::ControlResult;
use crate::model::{GcModel, LinkId, SensorState};

/// Capabilities the controllers need from a rigid-body dynamics engine
pub trait DynamicsEngine: Debug {
    /// Whether the engine has been set up for a robot
    fn has_been_init(&self) -> bool;

    /// Degrees of freedom of the robot the engine models
    fn dof(&self) -> usize;

    /// Refresh `model.a` and `model.g` for the current sensor state
    fn update_model_matrices(
        &mut self,
        sensors: &SensorState,
        model: &mut GcModel,
    ) -> ControlResult<()>;

    /// Engine identifier for the named link
    fn id_for_link(&self, name: &str) -> Option<LinkId>;

    /// Geometric Jacobian (6 × dof) of a point on a link
    ///
    /// Rows 0..3 map joint velocity to the point's linear velocity, rows
    /// 3..6 to the link's angular velocity, all in the world frame.
    fn jacobian(
        &self,
        link: LinkId,
        pos_in_link: &Vector3<f64>,
        sensors: &SensorState,
    ) -> ControlResult<DMatrix<f64>>;

    /// World pose of a link frame
    fn transformation(&self, link: LinkId, sensors: &SensorState) -> ControlResult<Isometry3<f64>>;

    /// World position of a point given in a link frame
    fn position(
        &self,
        link: LinkId,
        pos_in_link: &Vector3<f64>,
        sensors: &SensorState,
    ) -> ControlResult<Vector3<f64>> {
        let t = self.transformation(link, sensors)?;
        Ok((t * Point3::from(*pos_in_link)).coords)
    }
}
