//! Planar rigid-body kinematics helpers
//!
//! Rotations about the world z-axis, as used by serial chains whose joint
//! axes are all parallel to z.

use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3};

/// Rotation matrix for an angle `theta` about z
pub fn rot_z(theta: f64) -> Matrix3<f64> {
    let (s, c) = theta.sin_cos();
    Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Linear velocity direction contributed by a unit rotation about z
///
/// ẑ × r = (-r_y, r_x, 0)
pub fn z_cross(r: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(-r.y, r.x, 0.0)
}

/// Rigid transform with origin `origin` and rotation `theta` about z
pub fn planar_isometry(origin: &Vector3<f64>, theta: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(*origin),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rot_z_quarter_turn() {
        let r = rot_z(FRAC_PI_2) * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(r, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_z_cross_matches_cross_product() {
        let r = Vector3::new(0.3, -1.2, 0.7);
        assert_relative_eq!(z_cross(&r), Vector3::z().cross(&r), epsilon = 1e-12);
    }

    #[test]
    fn test_planar_isometry_matches_rot_z() {
        let iso = planar_isometry(&Vector3::new(1.0, 2.0, 0.0), 0.4);
        let p = Vector3::new(0.5, 0.1, 0.0);
        let expected = Vector3::new(1.0, 2.0, 0.0) + rot_z(0.4) * p;
        assert_relative_eq!(
            iso * nalgebra::Point3::from(p),
            nalgebra::Point3::from(expected),
            epsilon = 1e-12
        );
    }
}
