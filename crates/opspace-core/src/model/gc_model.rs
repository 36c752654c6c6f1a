//! Generalized-coordinate dynamic model
//!
//! Holds the joint-space mass matrix `A(q)` and gravity force `g(q)`
//! refreshed by the dynamics engine every tick, together with one center of
//! mass record per non-root link.

use nalgebra::{DMatrix, DVector};

use super::{LinkId, RigidBody};

/// Center of mass record for one non-root link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComInfo {
    /// Name of the link this record is bound to
    pub link_name: String,
    /// Identifier of the link inside the dynamics engine
    pub dynamic_id: Option<LinkId>,
    /// Bound link descriptor
    pub link: Option<RigidBody>,
}

impl ComInfo {
    /// Mass this link contributes to the robot (zero while unbound)
    pub fn mass(&self) -> f64 {
        self.link.as_ref().map_or(0.0, |l| l.mass)
    }

    /// Whether the record has been bound to a link
    pub fn is_bound(&self) -> bool {
        self.dynamic_id.is_some() && self.link.is_some()
    }
}

/// Joint-space dynamic model
#[derive(Debug, Clone, PartialEq)]
pub struct GcModel {
    /// Mass matrix A(q), dof × dof, symmetric positive definite
    pub a: DMatrix<f64>,
    /// Gravity force g(q), dof
    pub g: DVector<f64>,
    /// Total mass of all non-root links [kg]
    pub mass: f64,
    /// One record per non-root link, in tree order
    pub coms: Vec<ComInfo>,
}

impl GcModel {
    /// Model sized for `dof` coordinates and `num_links` non-root links
    ///
    /// The mass matrix starts at identity and gravity at zero until the
    /// dynamics engine refreshes them.
    pub fn new(dof: usize, num_links: usize) -> Self {
        Self {
            a: DMatrix::identity(dof, dof),
            g: DVector::zeros(dof),
            mass: 0.0,
            coms: vec![ComInfo::default(); num_links],
        }
    }

    /// Degrees of freedom
    pub fn dof(&self) -> usize {
        self.g.len()
    }
}
