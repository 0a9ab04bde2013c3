//! Geometric predicates for d-dimensional hull construction.
//!
//! Hull facets are `(D-1)`-simplices embedded in `R^D`. Their normals are
//! computed as generalized cross products: the `j`-th normal component is the
//! determinant of the facet's edge vectors stacked on top of the unit vector
//! `e_j`. Swapping two facet vertices negates every such determinant, which is
//! what lets hull orientation be fixed by swapping the first two indices.

use crate::geometry::matrix::{Matrix, adaptive_tolerance, determinant, matrix_set};
use crate::geometry::point::Point;
use thiserror::Error;

/// Errors raised by the predicates when the input shape is wrong.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PredicateError {
    /// The wrong number of points was supplied.
    #[error("Expected {expected} points in dimension {dimension}, got {actual}")]
    WrongPointCount {
        /// Required number of points.
        expected: usize,
        /// Number of points supplied.
        actual: usize,
        /// Ambient dimension.
        dimension: usize,
    },
}

/// Represents the orientation of a simplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The simplex has negative orientation (determinant < 0)
    NEGATIVE,
    /// The simplex is degenerate (determinant ≈ 0)
    DEGENERATE,
    /// The simplex has positive orientation (determinant > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Unnormalized normal of the hyperplane through the `D` points `vertex(0..D)`.
///
/// The result is zero when the points are affinely dependent. Hull code
/// passes facet indices into a shared point array through `vertex`.
pub(crate) fn hyperplane_normal_of<'a, const D: usize, F>(vertex: F) -> Point<D>
where
    F: Fn(usize) -> &'a Point<D>,
{
    let origin = vertex(0);
    let mut edges = Matrix::<D>::zero();
    for r in 1..D {
        let e = *vertex(r) - *origin;
        for (c, &value) in e.coords().iter().enumerate() {
            matrix_set(&mut edges, r - 1, c, value);
        }
    }

    let mut normal = [0.0; D];
    for (j, n) in normal.iter_mut().enumerate() {
        let mut m = edges;
        for c in 0..D {
            matrix_set(&mut m, D - 1, c, if c == j { 1.0 } else { 0.0 });
        }
        *n = determinant(&m);
    }
    Point::new(normal)
}

/// Signed distance-like value of `p` relative to the hyperplane through `origin`
/// with the given `normal`.
#[inline]
#[must_use]
pub fn signed_offset<const D: usize>(normal: &Point<D>, origin: &Point<D>, p: &Point<D>) -> f64 {
    normal.dot(&(*p - *origin))
}

/// Determine the orientation of a d-simplex from the sign of the determinant of
/// its edge vectors `p_i - p_0`.
///
/// # Errors
///
/// Returns [`PredicateError::WrongPointCount`] unless exactly `D+1` points are given.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::point::Point;
/// use multilabel_boundary::geometry::predicates::{simplex_orientation, Orientation};
///
/// let tri = [Point::new([0.0, 0.0]), Point::new([1.0, 0.0]), Point::new([0.0, 1.0])];
/// assert_eq!(simplex_orientation(&tri).unwrap(), Orientation::POSITIVE);
///
/// let flat = [Point::new([0.0, 0.0]), Point::new([1.0, 1.0]), Point::new([2.0, 2.0])];
/// assert_eq!(simplex_orientation(&flat).unwrap(), Orientation::DEGENERATE);
/// ```
pub fn simplex_orientation<const D: usize>(
    simplex_points: &[Point<D>],
) -> Result<Orientation, PredicateError> {
    if simplex_points.len() != D + 1 {
        return Err(PredicateError::WrongPointCount {
            expected: D + 1,
            actual: simplex_points.len(),
            dimension: D,
        });
    }

    let origin = simplex_points[0];
    let mut matrix = Matrix::<D>::zero();
    for (r, p) in simplex_points[1..].iter().enumerate() {
        let e = *p - origin;
        for (c, &value) in e.coords().iter().enumerate() {
            matrix_set(&mut matrix, r, c, value);
        }
    }

    let tolerance = adaptive_tolerance(&matrix, f64::EPSILON);
    let det = determinant(&matrix);

    if det > tolerance {
        Ok(Orientation::POSITIVE)
    } else if det < -tolerance {
        Ok(Orientation::NEGATIVE)
    } else {
        Ok(Orientation::DEGENERATE)
    }
}
