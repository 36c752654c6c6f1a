//! Dense linear-algebra helpers
//!
//! Saturation, generalized inverses and subspace checks on `nalgebra`
//! dynamic matrices.

use nalgebra::{DMatrix, DVector};

/// Singular values below this are treated as zero
pub const SINGULAR_EPS: f64 = 1e-9;

/// Clamp `v` elementwise into `[min, max]`
///
/// The upper bound is applied first and the lower bound second, so a
/// lower bound that exceeds the upper bound wins.
pub fn clamp_elementwise(v: &DVector<f64>, min: &DVector<f64>, max: &DVector<f64>) -> DVector<f64> {
    v.zip_zip_map(min, max, |x, lo, hi| x.min(hi).max(lo))
}

/// Moore-Penrose pseudo-inverse through the SVD
///
/// Singular values below `eps` are dropped rather than inverted, which
/// keeps the result bounded near kinematic singularities.
pub fn pseudo_inverse(m: &DMatrix<f64>, eps: f64) -> DMatrix<f64> {
    let (rows, cols) = m.shape();
    if rows == 0 || cols == 0 {
        return DMatrix::zeros(cols, rows);
    }
    let svd = m.clone().svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return DMatrix::zeros(cols, rows);
    };

    let sigma_inv = DVector::from_iterator(
        svd.singular_values.len(),
        svd.singular_values
            .iter()
            .map(|&s| if s > eps { 1.0 / s } else { 0.0 }),
    );

    v_t.transpose() * DMatrix::from_diagonal(&sigma_inv) * u.transpose()
}

/// Inverse of a symmetric positive semi-definite matrix
///
/// Uses a Cholesky factorization when the matrix is positive definite and
/// falls back to the SVD pseudo-inverse otherwise.
pub fn spd_inverse(m: &DMatrix<f64>) -> DMatrix<f64> {
    match m.clone().cholesky() {
        Some(chol) => chol.inverse(),
        None => pseudo_inverse(m, SINGULAR_EPS),
    }
}

/// Numerical rank from the singular values
pub fn rank(m: &DMatrix<f64>, eps: f64) -> usize {
    if m.nrows() == 0 || m.ncols() == 0 {
        return 0;
    }
    m.clone()
        .svd(false, false)
        .singular_values
        .iter()
        .filter(|&&s| s > eps)
        .count()
}

/// Check that a matrix is square and symmetric to within `eps`
pub fn is_symmetric(m: &DMatrix<f64>, eps: f64) -> bool {
    m.is_square() && (m - m.transpose()).amax() <= eps
}

/// Check that all entries of `v` lie within `[min, max]`
pub fn within_bounds(v: &DVector<f64>, min: &DVector<f64>, max: &DVector<f64>) -> bool {
    v.len() == min.len()
        && v.len() == max.len()
        && v.iter()
            .zip(min.iter().zip(max.iter()))
            .all(|(&x, (&lo, &hi))| x >= lo && x <= hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clamp_elementwise() {
        let v = DVector::from_vec(vec![-5.0, 0.5, 5.0]);
        let lo = DVector::from_element(3, -1.0);
        let hi = DVector::from_element(3, 1.0);

        let c = clamp_elementwise(&v, &lo, &hi);
        assert_relative_eq!(c, DVector::from_vec(vec![-1.0, 0.5, 1.0]));
        assert!(within_bounds(&c, &lo, &hi));
    }

    #[test]
    fn test_pseudo_inverse_full_rank() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
        let p = pseudo_inverse(&m, SINGULAR_EPS);
        assert_relative_eq!(
            p,
            DMatrix::from_row_slice(2, 2, &[0.5, 0.0, 0.0, 0.25]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_pseudo_inverse_rank_deficient() {
        // Row vector: pinv = Jᵀ / |J|²
        let j = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 0.0]);
        let p = pseudo_inverse(&j, SINGULAR_EPS);
        assert_eq!(p.shape(), (3, 1));
        assert_relative_eq!(p[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(p[(1, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(p[(2, 0)], 0.0, epsilon = 1e-12);

        // J · J⁺ · J = J
        assert_relative_eq!(&j * &p * &j, j, epsilon = 1e-12);
    }

    #[test]
    fn test_spd_inverse_falls_back_on_singular() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let inv = spd_inverse(&m);
        assert_relative_eq!(inv, m, epsilon = 1e-12);

        let spd = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let inv = spd_inverse(&spd);
        assert_relative_eq!(&spd * inv, DMatrix::identity(2, 2), epsilon = 1e-12);
    }

    #[test]
    fn test_rank() {
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(rank(&m, SINGULAR_EPS), 2);
        assert_eq!(rank(&DMatrix::identity(4, 4), SINGULAR_EPS), 4);
        assert_eq!(rank(&DMatrix::zeros(3, 3), SINGULAR_EPS), 0);
    }

    #[test]
    fn test_is_symmetric() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 3.0]);
        assert!(is_symmetric(&m, 1e-12));
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 3.0]);
        assert!(!is_symmetric(&m, 1e-12));
    }
}
