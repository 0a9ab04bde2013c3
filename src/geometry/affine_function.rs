//! Affine functions on the canonical right simplex.
//!
//! Each label's samples at the `D+1` corners of a simplex define a unique
//! affine function `f(p) = c + <v, p>` on the right simplex whose corner `0` is
//! the origin and whose corner `k` is the unit vector `e_{k-1}`.
//!
//! # Duality
//!
//! The dual point of `f` lives in `D+1` dimensions and has coordinates
//! `(-c, v_1, ..., v_D)`, so that `f(p) = <dual, (-1, p)>`. The upper envelope
//! of a set of affine functions corresponds to the part of the convex hull of
//! their dual points whose outward normals have a negative leading coordinate.
//! A hull facet there names `D+1` labels that tie and are maximal somewhere.

use crate::geometry::matrix::{Matrix, matrix_set, solve};
use crate::geometry::point::Point;
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while building, querying, or intersecting affine functions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AffineFunctionError {
    /// The number of corner samples is not `D+1`.
    #[error("Expected {expected} corner samples, got {actual}")]
    InvalidSampleCount {
        /// Required number of samples.
        expected: usize,
        /// Number of samples supplied.
        actual: usize,
    },
    /// The number of functions handed to `intersect` is not `D+1`.
    #[error("Expected {expected} functions to intersect, got {actual}")]
    InvalidFunctionCount {
        /// Required number of functions.
        expected: usize,
        /// Number of functions supplied.
        actual: usize,
    },
    /// A corner index larger than `D` was requested.
    #[error("Corner {corner} out of range: 0 <= corner <= {dimension}")]
    CornerOutOfRange {
        /// Requested corner.
        corner: usize,
        /// Simplex dimension.
        dimension: usize,
    },
    /// The functions never take a common value (singular system).
    #[error("No intersection found")]
    NoIntersection,
    /// The requested dual dimension is not `D+1`.
    #[error("Dual of a {dimension}-dimensional function lives in {expected} dimensions, not {requested}")]
    DualDimensionMismatch {
        /// Dimension of the function's domain.
        dimension: usize,
        /// Required dual dimension (`D+1`).
        expected: usize,
        /// Dual dimension requested by the caller.
        requested: usize,
    },
}

// =============================================================================
// AFFINE FUNCTION
// =============================================================================

/// An affine function `f(p) = c + <v, p>` on the canonical right `D`-simplex.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::affine_function::AffineFunction;
/// use multilabel_boundary::geometry::point::Point;
///
/// let f = AffineFunction::<2>::from_corner_values(&[1.0, 3.0, -1.0]).unwrap();
/// assert_eq!(f.constant(), 1.0);
/// assert_eq!(f.gradient(), Point::new([2.0, -2.0]));
/// assert_eq!(f.evaluate(&AffineFunction::<2>::corner(1).unwrap()), 3.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineFunction<const D: usize> {
    constant: f64,
    gradient: Point<D>,
}

impl<const D: usize> AffineFunction<D> {
    /// Builds a function directly from its constant term and gradient.
    #[inline]
    #[must_use]
    pub const fn new(constant: f64, gradient: Point<D>) -> Self {
        Self { constant, gradient }
    }

    /// Fits the function interpolating `values[k]` at `corner(k)`.
    ///
    /// # Errors
    ///
    /// Returns [`AffineFunctionError::InvalidSampleCount`] unless exactly `D+1`
    /// values are supplied.
    pub fn from_corner_values(values: &[f64]) -> Result<Self, AffineFunctionError> {
        if values.len() != D + 1 {
            return Err(AffineFunctionError::InvalidSampleCount {
                expected: D + 1,
                actual: values.len(),
            });
        }
        let c = values[0];
        let mut v = [0.0; D];
        for (k, slot) in v.iter_mut().enumerate() {
            *slot = values[k + 1] - c;
        }
        Ok(Self::new(c, Point::new(v)))
    }

    /// Evaluates `c + <v, p>`.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, p: &Point<D>) -> f64 {
        self.constant + self.gradient.dot(p)
    }

    /// The constant term `c`, which is also the value at corner `0`.
    #[inline]
    #[must_use]
    pub const fn constant(&self) -> f64 {
        self.constant
    }

    /// The gradient `v`.
    #[inline]
    #[must_use]
    pub const fn gradient(&self) -> Point<D> {
        self.gradient
    }

    /// Position of corner `k` of the canonical right simplex.
    ///
    /// # Errors
    ///
    /// Returns [`AffineFunctionError::CornerOutOfRange`] when `k > D`.
    pub fn corner(k: usize) -> Result<Point<D>, AffineFunctionError> {
        if k > D {
            return Err(AffineFunctionError::CornerOutOfRange {
                corner: k,
                dimension: D,
            });
        }
        let mut coords = [0.0; D];
        if k > 0 {
            coords[k - 1] = 1.0;
        }
        Ok(Point::new(coords))
    }

    /// Finds the point where all `D+1` functions take the same value.
    ///
    /// Solves `<v_i - v_0, p> = c_0 - c_i` for `i = 1..=D`.
    ///
    /// # Errors
    ///
    /// - [`AffineFunctionError::InvalidFunctionCount`] unless `D+1` functions are given.
    /// - [`AffineFunctionError::NoIntersection`] when the system is singular or
    ///   its solution is not finite.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multilabel_boundary::geometry::affine_function::AffineFunction;
    ///
    /// let a = AffineFunction::<1>::from_corner_values(&[0.0, 1.0]).unwrap();
    /// let b = AffineFunction::<1>::from_corner_values(&[1.0, 0.0]).unwrap();
    /// let p = AffineFunction::intersect(&[a, b]).unwrap();
    /// assert_eq!(p[0], 0.5);
    /// ```
    pub fn intersect(functions: &[Self]) -> Result<Point<D>, AffineFunctionError> {
        if functions.len() != D + 1 {
            return Err(AffineFunctionError::InvalidFunctionCount {
                expected: D + 1,
                actual: functions.len(),
            });
        }
        let f0 = &functions[0];
        let mut a = Matrix::<D>::zero();
        let mut b = [0.0; D];
        for (row, fi) in functions[1..].iter().enumerate() {
            b[row] = f0.constant - fi.constant;
            let dv = fi.gradient - f0.gradient;
            for (col, &value) in dv.coords().iter().enumerate() {
                matrix_set(&mut a, row, col, value);
            }
        }
        solve(&a, b)
            .map(Point::new)
            .map_err(|_| AffineFunctionError::NoIntersection)
    }

    /// The dual point `(-c, v_1, ..., v_D)` in `H = D+1` dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`AffineFunctionError::DualDimensionMismatch`] unless `H == D+1`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use multilabel_boundary::geometry::affine_function::AffineFunction;
    ///
    /// let f = AffineFunction::<1>::from_corner_values(&[2.0, 5.0]).unwrap();
    /// let q = f.dual::<2>().unwrap();
    /// assert_eq!(q.coords(), &[-2.0, 3.0]);
    /// assert!(f.dual::<3>().is_err());
    /// ```
    pub fn dual<const H: usize>(&self) -> Result<Point<H>, AffineFunctionError> {
        if H != D + 1 {
            return Err(AffineFunctionError::DualDimensionMismatch {
                dimension: D,
                expected: D + 1,
                requested: H,
            });
        }
        let mut coords = [0.0; H];
        coords[0] = -self.constant;
        coords[1..].copy_from_slice(self.gradient.coords());
        Ok(Point::new(coords))
    }
}

impl<const D: usize> fmt::Display for AffineFunction<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for k in 0..=D {
            if k > 0 {
                write!(f, ",")?;
            }
            let value = if k == 0 {
                self.constant
            } else {
                self.constant + self.gradient[k - 1]
            };
            write!(f, " {value}")?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // =============================================================================
    // CONSTRUCTION AND EVALUATION
    // =============================================================================

    macro_rules! gen_corner_reproduction_tests {
        ($d:literal) => {
            pastey::paste! {
                #[test]
                fn [<evaluate_reproduces_corner_values_ $d d>]() {
                    let values: Vec<f64> = (0..=$d).map(|k: u32| f64::from(k) * 0.75 - 1.0).collect();
                    let f = AffineFunction::<$d>::from_corner_values(&values).unwrap();
                    for (k, &value) in values.iter().enumerate() {
                        let c = AffineFunction::<$d>::corner(k).unwrap();
                        assert_relative_eq!(f.evaluate(&c), value, epsilon = 1e-12);
                    }
                }

                #[test]
                fn [<corner_out_of_range_ $d d>]() {
                    assert_eq!(
                        AffineFunction::<$d>::corner($d + 1),
                        Err(AffineFunctionError::CornerOutOfRange { corner: $d + 1, dimension: $d })
                    );
                }

                #[test]
                fn [<wrong_sample_count_ $d d>]() {
                    let values = vec![0.0; $d];
                    assert_eq!(
                        AffineFunction::<$d>::from_corner_values(&values),
                        Err(AffineFunctionError::InvalidSampleCount { expected: $d + 1, actual: $d })
                    );
                }
            }
        };
    }

    gen_corner_reproduction_tests!(1);
    gen_corner_reproduction_tests!(2);
    gen_corner_reproduction_tests!(3);

    // =============================================================================
    // INTERSECTION
    // =============================================================================

    #[test]
    fn intersect_two_crossing_lines() {
        let a = AffineFunction::<1>::from_corner_values(&[0.0, 1.0]).unwrap();
        let b = AffineFunction::<1>::from_corner_values(&[1.0, 0.0]).unwrap();
        let p = AffineFunction::intersect(&[a, b]).unwrap();
        assert_relative_eq!(p[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(a.evaluate(&p), b.evaluate(&p), epsilon = 1e-12);
    }

    #[test]
    fn intersect_three_planes_at_centroid() {
        // Each label equals 1 at its own corner and 0 elsewhere.
        let a = AffineFunction::<2>::from_corner_values(&[1.0, 0.0, 0.0]).unwrap();
        let b = AffineFunction::<2>::from_corner_values(&[0.0, 1.0, 0.0]).unwrap();
        let c = AffineFunction::<2>::from_corner_values(&[0.0, 0.0, 1.0]).unwrap();
        let p = AffineFunction::intersect(&[a, b, c]).unwrap();
        assert_relative_eq!(p[0], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn intersect_parallel_is_no_intersection() {
        let a = AffineFunction::<1>::from_corner_values(&[0.0, 1.0]).unwrap();
        let b = AffineFunction::<1>::from_corner_values(&[2.0, 3.0]).unwrap();
        assert_eq!(
            AffineFunction::intersect(&[a, b]),
            Err(AffineFunctionError::NoIntersection)
        );
    }

    #[test]
    fn intersect_wrong_count() {
        let a = AffineFunction::<2>::from_corner_values(&[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(
            AffineFunction::intersect(&[a, a]),
            Err(AffineFunctionError::InvalidFunctionCount {
                expected: 3,
                actual: 2
            })
        );
    }

    // =============================================================================
    // DUALITY
    // =============================================================================

    #[test]
    fn dual_pairing_reproduces_evaluation() {
        let f = AffineFunction::<2>::from_corner_values(&[0.4, -1.0, 2.5]).unwrap();
        let q = f.dual::<3>().unwrap();
        let p = Point::new([0.2, 0.3]);
        let lifted = Point::new([-1.0, p[0], p[1]]);
        assert_relative_eq!(q.dot(&lifted), f.evaluate(&p), epsilon = 1e-12);
    }

    #[test]
    fn dual_dimension_is_checked() {
        let f = AffineFunction::<2>::from_corner_values(&[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(
            f.dual::<2>(),
            Err(AffineFunctionError::DualDimensionMismatch {
                dimension: 2,
                expected: 3,
                requested: 2
            })
        );
    }

    #[test]
    fn display_prints_corner_values() {
        let f = AffineFunction::<2>::from_corner_values(&[1.0, 2.0, 0.5]).unwrap();
        assert_eq!(f.to_string(), "{ 1, 2, 0.5 }");
    }
}
