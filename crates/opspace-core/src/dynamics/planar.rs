//! Planar serial-chain dynamics
//!
//! Reference [`DynamicsEngine`] for a serial chain of revolute joints whose
//! axes are all parallel to the world z-axis, moving in the x-y plane with
//! gravity along -y.
//!
//! Joint i rotates link i. With θᵢ = Σ_{k≤i} qₖ the link frames are
//!
//! oᵢ = oᵢ₋₁ + R(θᵢ₋₁) pᵢ,   Rᵢ = R(θᵢ)
//!
//! where pᵢ is the joint origin in the parent frame. The model is
//!
//! A(q) = Σᵢ mᵢ Jᵥᵢᵀ Jᵥᵢ + I_zz,ᵢ Jωᵢᵀ Jωᵢ + diag(armature)
//! g(q) = Σᵢ Jᵥᵢᵀ (0, mᵢ g, 0)
//!
//! with all Jacobians taken at each link's center of mass.

use nalgebra::{DMatrix, DVector, Isometry3, Vector3};
use tracing::debug;

use super::DynamicsEngine;
use crate::error::{ControlError, ControlResult};
use crate::math::{planar_isometry, rot_z, z_cross};
use crate::model::{GcModel, LinkId, RobotTopology, SensorState};
use crate::GRAVITY;

/// One moving link of the chain
#[derive(Debug, Clone)]
struct PlanarLink {
    name: String,
    mass: f64,
    com: Vector3<f64>,
    izz: f64,
    pos_in_parent: Vector3<f64>,
}

/// Frame of one link for a given configuration
#[derive(Debug, Clone, Copy)]
struct LinkFrame {
    origin: Vector3<f64>,
    theta: f64,
}

/// Planar serial chain of revolute joints
#[derive(Debug, Clone)]
pub struct PlanarChain {
    robot_name: String,
    links: Vec<PlanarLink>,
    /// Gravity magnitude [m/s²]
    gravity: f64,
    /// Rotor inertia added to every diagonal entry of A
    armature: f64,
    has_been_init: bool,
}

impl PlanarChain {
    /// Build the chain from a robot topology
    ///
    /// The non-root links must form a single chain in tree order: the
    /// first one hangs off the root and every next one off its predecessor.
    pub fn from_topology(robot: &RobotTopology) -> ControlResult<Self> {
        robot.validate()?;

        let mut links = Vec::new();
        let mut expected_parent: Option<&str> = None;
        for link in robot.non_root_links() {
            let parent = link.parent.as_deref().ok_or_else(|| {
                ControlError::InvalidTopology(format!("link '{}' has no parent", link.name))
            })?;
            let parent_ok = match expected_parent {
                None => robot.link(parent).is_some_and(|p| p.is_root),
                Some(prev) => parent == prev,
            };
            if !parent_ok {
                return Err(ControlError::InvalidTopology(format!(
                    "link '{}' does not continue a serial chain (parent '{}')",
                    link.name, parent
                )));
            }
            links.push(PlanarLink {
                name: link.name.clone(),
                mass: link.mass,
                com: link.com,
                izz: link.inertia[(2, 2)],
                pos_in_parent: link.pos_in_parent,
            });
            expected_parent = Some(link.name.as_str());
        }

        if links.is_empty() {
            return Err(ControlError::InvalidTopology(format!(
                "robot '{}' has no moving links",
                robot.name
            )));
        }

        debug!(robot = %robot.name, dof = links.len(), "built planar chain dynamics");

        Ok(Self {
            robot_name: robot.name.clone(),
            links,
            gravity: GRAVITY,
            armature: 0.0,
            has_been_init: true,
        })
    }

    /// Override the gravity magnitude
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Add rotor inertia to the diagonal of the mass matrix
    pub fn with_armature(mut self, armature: f64) -> Self {
        self.armature = armature;
        self
    }

    /// Robot this engine was built for
    pub fn robot_name(&self) -> &str {
        &self.robot_name
    }

    fn check_q(&self, q: &DVector<f64>) -> ControlResult<()> {
        if q.len() != self.links.len() {
            return Err(ControlError::dim("planar chain q", self.links.len(), q.len()));
        }
        Ok(())
    }

    fn check_link(&self, link: LinkId) -> ControlResult<usize> {
        if link.0 < self.links.len() {
            Ok(link.0)
        } else {
            Err(ControlError::UnknownLink(format!("#{}", link.0)))
        }
    }

    /// Frames of every link for configuration `q`
    fn frames(&self, q: &DVector<f64>) -> Vec<LinkFrame> {
        let mut frames = Vec::with_capacity(self.links.len());
        let mut origin = Vector3::zeros();
        let mut theta = 0.0;
        for (link, qi) in self.links.iter().zip(q.iter()) {
            origin += rot_z(theta) * link.pos_in_parent;
            theta += qi;
            frames.push(LinkFrame { origin, theta });
        }
        frames
    }

    /// World position of a point on link `i`
    fn point(frames: &[LinkFrame], i: usize, pos_in_link: &Vector3<f64>) -> Vector3<f64> {
        frames[i].origin + rot_z(frames[i].theta) * pos_in_link
    }

    /// 6 × dof Jacobian of a world point rigidly attached to link `i`
    fn jacobian_at(frames: &[LinkFrame], i: usize, point: &Vector3<f64>) -> DMatrix<f64> {
        let mut j = DMatrix::zeros(6, frames.len());
        for (col, frame) in frames.iter().enumerate().take(i + 1) {
            let lin = z_cross(&(point - frame.origin));
            j[(0, col)] = lin.x;
            j[(1, col)] = lin.y;
            j[(2, col)] = lin.z;
            j[(5, col)] = 1.0;
        }
        j
    }

    /// Mass matrix A(q)
    pub fn mass_matrix(&self, q: &DVector<f64>) -> ControlResult<DMatrix<f64>> {
        self.check_q(q)?;
        let dof = self.links.len();
        let frames = self.frames(q);
        let mut a = DMatrix::identity(dof, dof) * self.armature;
        for (i, link) in self.links.iter().enumerate() {
            let com = Self::point(&frames, i, &link.com);
            let j = Self::jacobian_at(&frames, i, &com);
            let jv = j.rows(0, 3);
            let jw = j.row(5);
            a += jv.transpose() * jv * link.mass + jw.transpose() * jw * link.izz;
        }
        Ok(a)
    }

    /// Gravity force g(q)
    pub fn gravity_force(&self, q: &DVector<f64>) -> ControlResult<DVector<f64>> {
        self.check_q(q)?;
        let frames = self.frames(q);
        let mut g = DVector::zeros(self.links.len());
        for (i, link) in self.links.iter().enumerate() {
            let com = Self::point(&frames, i, &link.com);
            let j = Self::jacobian_at(&frames, i, &com);
            let weight = Vector3::new(0.0, link.mass * self.gravity, 0.0);
            g += j.rows(0, 3).transpose() * weight;
        }
        Ok(g)
    }

    /// Gravitational potential energy V(q) = Σ mᵢ g yᵢ
    pub fn potential_energy(&self, q: &DVector<f64>) -> ControlResult<f64> {
        self.check_q(q)?;
        let frames = self.frames(q);
        Ok(self
            .links
            .iter()
            .enumerate()
            .map(|(i, link)| link.mass * self.gravity * Self::point(&frames, i, &link.com).y)
            .sum())
    }

    /// World position of a point on a link for configuration `q`
    pub fn point_position(
        &self,
        link: LinkId,
        pos_in_link: &Vector3<f64>,
        q: &DVector<f64>,
    ) -> ControlResult<Vector3<f64>> {
        self.check_q(q)?;
        let i = self.check_link(link)?;
        Ok(Self::point(&self.frames(q), i, pos_in_link))
    }
}

impl DynamicsEngine for PlanarChain {
    fn has_been_init(&self) -> bool {
        self.has_been_init
    }

    fn dof(&self) -> usize {
        self.links.len()
    }

    fn update_model_matrices(
        &mut self,
        sensors: &SensorState,
        model: &mut GcModel,
    ) -> ControlResult<()> {
        let dof = self.links.len();
        sensors.check_dof(dof)?;
        if model.a.shape() != (dof, dof) {
            return Err(ControlError::dim("gc model mass matrix", dof, model.a.nrows()));
        }
        if model.g.len() != dof {
            return Err(ControlError::dim("gc model gravity", dof, model.g.len()));
        }

        model.a = self.mass_matrix(sensors.q())?;
        model.g = self.gravity_force(sensors.q())?;
        Ok(())
    }

    fn id_for_link(&self, name: &str) -> Option<LinkId> {
        self.links.iter().position(|l| l.name == name).map(LinkId)
    }

    fn jacobian(
        &self,
        link: LinkId,
        pos_in_link: &Vector3<f64>,
        sensors: &SensorState,
    ) -> ControlResult<DMatrix<f64>> {
        self.check_q(sensors.q())?;
        let i = self.check_link(link)?;
        let frames = self.frames(sensors.q());
        let point = Self::point(&frames, i, pos_in_link);
        Ok(Self::jacobian_at(&frames, i, &point))
    }

    fn transformation(&self, link: LinkId, sensors: &SensorState) -> ControlResult<Isometry3<f64>> {
        self.check_q(sensors.q())?;
        let i = self.check_link(link)?;
        let frame = self.frames(sensors.q())[i];
        Ok(planar_isometry(&frame.origin, frame.theta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{is_symmetric, SINGULAR_EPS};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn two_link() -> PlanarChain {
        PlanarChain::from_topology(&RobotTopology::planar_chain("arm", 2, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_link_ids() {
        let chain = two_link();
        assert_eq!(chain.dof(), 2);
        assert_eq!(chain.id_for_link("link1"), Some(LinkId(1)));
        assert_eq!(chain.id_for_link("ground"), None);
        assert!(chain.has_been_init());
    }

    #[test]
    fn test_forward_kinematics() {
        let chain = two_link();
        let tip = Vector3::new(1.0, 0.0, 0.0);

        let q = DVector::from_vec(vec![0.0, 0.0]);
        let p = chain.point_position(LinkId(1), &tip, &q).unwrap();
        assert_relative_eq!(p, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);

        let q = DVector::from_vec(vec![FRAC_PI_2, -FRAC_PI_2]);
        let p = chain.point_position(LinkId(1), &tip, &q).unwrap();
        assert_relative_eq!(p, Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_mass_matrix_single_rod() {
        // Uniform rod pivoting at one end: I = m l² / 3
        let chain =
            PlanarChain::from_topology(&RobotTopology::planar_chain("rod", 1, 2.0, 3.0)).unwrap();
        let a = chain.mass_matrix(&DVector::from_vec(vec![0.3])).unwrap();
        assert_relative_eq!(a[(0, 0)], 3.0 * 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mass_matrix_is_spd() {
        let chain = two_link();
        let q = DVector::from_vec(vec![0.4, -1.1]);
        let a = chain.mass_matrix(&q).unwrap();
        assert!(is_symmetric(&a, 1e-12));
        assert!(a.clone().cholesky().is_some());
        assert!(a.symmetric_eigenvalues().iter().all(|&e| e > SINGULAR_EPS));
    }

    #[test]
    fn test_gravity_is_potential_gradient() {
        let chain = two_link();
        let q = DVector::from_vec(vec![0.7, 0.2]);
        let g = chain.gravity_force(&q).unwrap();

        let h = 1e-6;
        for i in 0..2 {
            let mut qp = q.clone();
            let mut qm = q.clone();
            qp[i] += h;
            qm[i] -= h;
            let dv = (chain.potential_energy(&qp).unwrap() - chain.potential_energy(&qm).unwrap())
                / (2.0 * h);
            assert_relative_eq!(g[i], dv, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let chain = two_link();
        let q = DVector::from_vec(vec![-0.3, 0.9]);
        let offset = Vector3::new(0.8, 0.1, 0.0);
        let sensors = SensorState::at_rest(q.clone());
        let j = chain.jacobian(LinkId(1), &offset, &sensors).unwrap();

        let h = 1e-6;
        for col in 0..2 {
            let mut qp = q.clone();
            let mut qm = q.clone();
            qp[col] += h;
            qm[col] -= h;
            let dp = (chain.point_position(LinkId(1), &offset, &qp).unwrap()
                - chain.point_position(LinkId(1), &offset, &qm).unwrap())
                / (2.0 * h);
            assert_relative_eq!(j[(0, col)], dp.x, epsilon = 1e-6);
            assert_relative_eq!(j[(1, col)], dp.y, epsilon = 1e-6);
            assert_relative_eq!(j[(5, col)], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_update_model_matrices_checks_dimensions() {
        let mut chain = two_link();
        let sensors = SensorState::new(2);

        let mut model = GcModel::new(2, 2);
        chain.update_model_matrices(&sensors, &mut model).unwrap();
        // Straight arm along x under gravity along -y: both joints load
        assert!(model.g[0] > model.g[1]);
        assert!(model.g[1] > 0.0);

        let mut wrong = GcModel::new(3, 2);
        assert!(chain.update_model_matrices(&sensors, &mut wrong).is_err());
        assert!(chain
            .update_model_matrices(&SensorState::new(3), &mut model)
            .is_err());
    }

    #[test]
    fn test_rejects_branching_tree() {
        let mut robot = RobotTopology::planar_chain("arm", 3, 1.0, 1.0);
        robot.links[3].parent = Some("link0".into());
        assert!(matches!(
            PlanarChain::from_topology(&robot),
            Err(ControlError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_unknown_link_id() {
        let chain = two_link();
        let sensors = SensorState::new(2);
        assert!(matches!(
            chain.transformation(LinkId(7), &sensors),
            Err(ControlError::UnknownLink(_))
        ));
    }
}
