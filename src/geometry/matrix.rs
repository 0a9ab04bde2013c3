//! Matrix operations.
//!
//! This module provides small, stack-allocated linear algebra helpers used by
//! the hull predicates and by affine-function intersection.

use la_stack::{DEFAULT_PIVOT_TOL, LaError, Matrix as LaMatrix, Vector as LaVector};
use thiserror::Error;

/// Internal linear algebra matrix type used by this crate for fixed-size operations.
pub type Matrix<const D: usize> = LaMatrix<D>;

/// Error type for matrix operations.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::matrix::MatrixError;
///
/// let err = MatrixError::SingularMatrix;
/// assert!(matches!(err, MatrixError::SingularMatrix));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    /// Matrix is singular.
    #[error("Matrix is singular!")]
    SingularMatrix,
    /// Matrix or right-hand side contains NaN or infinite entries.
    #[error("Matrix contains non-finite entries")]
    NonFinite,
}

impl From<LaError> for MatrixError {
    fn from(err: LaError) -> Self {
        match err {
            LaError::NonFinite { .. } => Self::NonFinite,
            _ => Self::SingularMatrix,
        }
    }
}

/// Default tolerance for matrix singularity checks.
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

#[inline]
pub(crate) fn matrix_get<const D: usize>(m: &Matrix<D>, r: usize, c: usize) -> f64 {
    m.get(r, c)
        .unwrap_or_else(|| unreachable!("matrix index out of bounds: ({r}, {c}) for {D}x{D}"))
}

#[inline]
pub(crate) fn matrix_set<const D: usize>(m: &mut Matrix<D>, r: usize, c: usize, value: f64) {
    let ok = m.set(r, c, value);
    debug_assert!(ok, "matrix index out of bounds: ({r}, {c}) for {D}x{D}");
}

/// Compute an LU-based determinant, returning 0.0 for singular matrices.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::matrix::{determinant, Matrix};
///
/// let m = Matrix::<2>::zero();
/// assert_eq!(determinant(&m), 0.0);
/// ```
#[inline]
#[must_use]
pub fn determinant<const D: usize>(m: &Matrix<D>) -> f64 {
    match m.det(0.0) {
        Ok(det) => det,
        Err(LaError::NonFinite { .. }) => f64::NAN,
        Err(_) => 0.0,
    }
}

/// Compute adaptive tolerance scaled by matrix magnitude (infinity norm).
///
/// This computes `base_tol + rel_factor * ||A||_∞`, where `||A||_∞` is the
/// maximum absolute row sum.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::matrix::{adaptive_tolerance, Matrix};
///
/// let m = Matrix::from_rows([[1.0, 0.0], [0.0, 1.0]]);
/// let tol = adaptive_tolerance(&m, 1e-12);
/// assert!(tol >= 1e-12);
/// ```
#[must_use]
pub fn adaptive_tolerance<const D: usize>(matrix: &Matrix<D>, base_tol: f64) -> f64 {
    let mut max_row_sum = 0.0f64;
    for i in 0..D {
        let row_sum: f64 = (0..D).map(|j| matrix_get(matrix, i, j).abs()).sum();
        if row_sum > max_row_sum {
            max_row_sum = row_sum;
        }
    }

    let rel_factor = 1e-12f64;
    rel_factor.mul_add(max_row_sum, base_tol)
}

/// Solves `A x = b` for a square system by LU factorization.
///
/// # Errors
///
/// Returns [`MatrixError::SingularMatrix`] when `A` has no usable pivot and
/// [`MatrixError::NonFinite`] when the inputs contain NaN or infinities.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::matrix::{solve, Matrix};
///
/// let a = Matrix::from_rows([[2.0, 0.0], [0.0, 4.0]]);
/// let x = solve(&a, [1.0, 1.0]).unwrap();
/// assert_eq!(x, [0.5, 0.25]);
///
/// let singular = Matrix::from_rows([[1.0, 2.0], [2.0, 4.0]]);
/// assert!(solve(&singular, [1.0, 1.0]).is_err());
/// ```
pub fn solve<const D: usize>(a: &Matrix<D>, b: [f64; D]) -> Result<[f64; D], MatrixError> {
    let lu = a.lu(DEFAULT_PIVOT_TOL)?;
    let x = lu.solve_vec(LaVector::<D>::new(b))?.into_array();
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(MatrixError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn determinant_of_identity_and_singular() {
        let id = Matrix::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_relative_eq!(determinant(&id), 1.0, epsilon = 1e-12);

        let singular = Matrix::from_rows([[1.0, 2.0], [2.0, 4.0]]);
        assert_relative_eq!(determinant(&singular), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn determinant_sign_flips_with_row_swap() {
        let a = Matrix::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let b = Matrix::from_rows([[3.0, 4.0], [1.0, 2.0]]);
        assert_relative_eq!(determinant(&a), -2.0, epsilon = 1e-12);
        assert_relative_eq!(determinant(&b), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_three_by_three() {
        let a = Matrix::from_rows([[2.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 4.0]]);
        let x = solve(&a, [3.0, 5.0, 5.0]).unwrap();
        for (got, want) in x.iter().zip([1.0, 1.0, 1.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn solve_singular_reports_error() {
        let a = Matrix::from_rows([[1.0, 1.0], [1.0, 1.0]]);
        assert_eq!(solve(&a, [1.0, 2.0]), Err(MatrixError::SingularMatrix));
    }

    macro_rules! gen_adaptive_tol_tests {
        ($d:literal) => {
            pastey::paste! {
                #[test]
                fn [<adaptive_tolerance_scales_with_norm_ $d d>]() {
                    let base = 1e-12;
                    let mut rows = [[0.0; $d]; $d];
                    for row in &mut rows {
                        row[$d - 1] = 2.0;
                    }
                    let m = Matrix::<$d>::from_rows(rows);
                    let tol = adaptive_tolerance(&m, base);
                    assert_relative_eq!(tol, base + 2.0e-12, epsilon = 1e-24);
                }

                #[test]
                fn [<adaptive_tolerance_zero_matrix_is_base_ $d d>]() {
                    let m = Matrix::<$d>::zero();
                    assert_relative_eq!(adaptive_tolerance(&m, 1e-12), 1e-12, epsilon = 1e-24);
                }
            }
        };
    }

    gen_adaptive_tol_tests!(2);
    gen_adaptive_tol_tests!(3);
    gen_adaptive_tol_tests!(4);
}
