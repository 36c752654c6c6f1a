//! Robot topology
//!
//! The pre-parsed rigid-body link tree of a robot. Links are stored in
//! tree order: every link appears after its parent, and the root comes
//! first.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Identifier a dynamics engine assigns to a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub usize);

/// One rigid-body link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    /// Link name, unique within a robot
    pub name: String,
    /// Parent link name (None for the root)
    #[serde(default)]
    pub parent: Option<String>,
    /// Root links are fixed to the world and carry no COM contribution
    #[serde(default)]
    pub is_root: bool,
    /// Mass [kg]
    #[serde(default)]
    pub mass: f64,
    /// Center of mass in the link frame [m]
    #[serde(default = "Vector3::zeros")]
    pub com: Vector3<f64>,
    /// Inertia tensor about the COM [kg·m²]
    #[serde(default = "Matrix3::zeros")]
    pub inertia: Matrix3<f64>,
    /// Joint origin in the parent's frame [m]
    #[serde(default = "Vector3::zeros")]
    pub pos_in_parent: Vector3<f64>,
}

impl RigidBody {
    /// A fixed root link
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_root: true,
            mass: 0.0,
            com: Vector3::zeros(),
            inertia: Matrix3::zeros(),
            pos_in_parent: Vector3::zeros(),
        }
    }

    /// A moving link with a diagonal inertia
    pub fn link(
        name: impl Into<String>,
        parent: impl Into<String>,
        mass: f64,
        com: Vector3<f64>,
        inertia_diag: Vector3<f64>,
        pos_in_parent: Vector3<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
            is_root: false,
            mass,
            com,
            inertia: Matrix3::from_diagonal(&inertia_diag),
            pos_in_parent,
        }
    }
}

/// Rigid-body tree of one robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotTopology {
    /// Robot name
    pub name: String,
    /// Links in tree order
    pub links: Vec<RigidBody>,
}

impl RobotTopology {
    pub fn new(name: impl Into<String>, links: Vec<RigidBody>) -> Self {
        Self {
            name: name.into(),
            links,
        }
    }

    /// Non-root links, in tree order
    pub fn non_root_links(&self) -> impl Iterator<Item = &RigidBody> {
        self.links.iter().filter(|l| !l.is_root)
    }

    /// Number of non-root links
    pub fn num_non_root_links(&self) -> usize {
        self.non_root_links().count()
    }

    /// Find a link by name
    pub fn link(&self, name: &str) -> Option<&RigidBody> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Total mass of all links
    pub fn total_mass(&self) -> f64 {
        self.non_root_links().map(|l| l.mass).sum()
    }

    /// Check names are unique and every parent precedes its child
    pub fn validate(&self) -> ControlResult<()> {
        if self.links.is_empty() {
            return Err(ControlError::InvalidTopology(format!(
                "robot '{}' has no links",
                self.name
            )));
        }
        for (i, link) in self.links.iter().enumerate() {
            let earlier = &self.links[..i];
            if earlier.iter().any(|l| l.name == link.name) {
                return Err(ControlError::InvalidTopology(format!(
                    "duplicate link name '{}'",
                    link.name
                )));
            }
            match (&link.parent, link.is_root) {
                (None, true) => {}
                (None, false) => {
                    return Err(ControlError::InvalidTopology(format!(
                        "link '{}' has no parent and is not a root",
                        link.name
                    )));
                }
                (Some(parent), _) => {
                    if !earlier.iter().any(|l| &l.name == parent) {
                        return Err(ControlError::InvalidTopology(format!(
                            "parent '{}' of link '{}' is missing or appears after it",
                            parent, link.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// A serial planar chain of `n` identical uniform links along x
    ///
    /// Each link has its COM at mid-length and the rod inertia
    /// `m l² / 12` about z.
    pub fn planar_chain(name: impl Into<String>, n: usize, length: f64, mass: f64) -> Self {
        let mut links = vec![RigidBody::root("ground")];
        let izz = mass * length * length / 12.0;
        for i in 0..n {
            let parent = if i == 0 {
                "ground".to_string()
            } else {
                format!("link{}", i - 1)
            };
            let offset = if i == 0 { 0.0 } else { length };
            links.push(RigidBody::link(
                format!("link{i}"),
                parent,
                mass,
                Vector3::new(length / 2.0, 0.0, 0.0),
                Vector3::new(izz, izz, izz),
                Vector3::new(offset, 0.0, 0.0),
            ));
        }
        Self::new(name, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_chain_layout() {
        let robot = RobotTopology::planar_chain("arm", 3, 1.0, 2.0);
        assert_eq!(robot.links.len(), 4);
        assert_eq!(robot.num_non_root_links(), 3);
        assert!(robot.links[0].is_root);
        assert_eq!(robot.links[2].parent.as_deref(), Some("link0"));
        assert!((robot.total_mass() - 6.0).abs() < 1e-12);
        robot.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_out_of_order_parent() {
        let mut robot = RobotTopology::planar_chain("arm", 2, 1.0, 1.0);
        robot.links.swap(1, 2);
        assert!(matches!(
            robot.validate(),
            Err(ControlError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let mut robot = RobotTopology::planar_chain("arm", 2, 1.0, 1.0);
        robot.links[2].name = "link0".into();
        assert!(robot.validate().is_err());
    }

    #[test]
    fn test_topology_from_toml() {
        let text = r#"
            name = "pendulum"

            [[links]]
            name = "ground"
            is_root = true

            [[links]]
            name = "rod"
            parent = "ground"
            mass = 1.5
            com = [0.5, 0.0, 0.0]
        "#;
        let robot: RobotTopology = toml::from_str(text).unwrap();
        assert_eq!(robot.links.len(), 2);
        assert_eq!(robot.links[1].mass, 1.5);
        assert_eq!(robot.links[1].com.x, 0.5);
        robot.validate().unwrap();
    }
}
