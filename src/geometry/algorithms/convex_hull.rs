//! d-dimensional convex hulls of small point sets.
//!
//! Three strategies share one output shape, a list of [`Facet`]s indexing the
//! input slice, oriented so every facet normal points away from the centroid
//! of the input:
//!
//! - [`simple_hull`]: exact, closed-form hulls of at most `D+2` points.
//! - [`incremental_hull`](crate::geometry::algorithms::incremental_hull::incremental_hull):
//!   beneath-beyond insertion for points in general position.
//! - [`ExternalHull`]: a pluggable fallback for large or degenerate inputs,
//!   serialized process-wide.
//!
//! [`ConvexHullEngine`] picks between them.

use crate::core::collections::SimplexIndexBuffer;
use crate::core::multi_index::MultiIndex;
use crate::geometry::algorithms::fallback_hull::{BruteForceHull, ExternalHull, fallback_lock};
use crate::geometry::algorithms::incremental_hull::{IncrementalHullScratch, incremental_hull};
use crate::geometry::point::{Point, PointValidationError};
use crate::geometry::predicates::{
    Orientation, hyperplane_normal_of, signed_offset, simplex_orientation,
};
use serde::{Deserialize, Serialize};
use std::sync::PoisonError;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during convex hull construction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConvexHullError {
    /// Fewer points than the hull dimension were supplied.
    #[error("Insufficient points for a {dimension}-dimensional hull: got {actual}, need at least {required}")]
    InsufficientPoints {
        /// Number of points supplied.
        actual: usize,
        /// Minimum number of points.
        required: usize,
        /// Hull dimension.
        dimension: usize,
    },
    /// The point count exceeds what the chosen strategy supports.
    #[error("Number of points {actual} exceeds the supported maximum {max}")]
    UnsupportedSize {
        /// Number of points supplied.
        actual: usize,
        /// Largest supported count.
        max: usize,
    },
    /// The input is not in general position where the strategy requires it.
    #[error("Geometric degeneracy encountered during convex hull construction: {message}")]
    GeometricDegeneracy {
        /// Description of the degeneracy.
        message: String,
    },
    /// Hulls are only defined here for dimensions of at least 2.
    #[error("Unsupported hull dimension {dimension}")]
    UnsupportedDimension {
        /// The rejected dimension.
        dimension: usize,
    },
    /// The external fallback could not produce a simplicial hull.
    #[error("External hull failed: {message}")]
    FallbackFailed {
        /// Description of the failure.
        message: String,
    },
    /// An input point has a NaN or infinite coordinate.
    #[error("Invalid hull input point {index}: {source}")]
    InvalidPoint {
        /// Position of the point in the input.
        index: usize,
        /// The underlying validation error.
        #[source]
        source: PointValidationError,
    },
}

// =============================================================================
// FACET
// =============================================================================

/// A hull facet: `D` indices into the hull's input points.
///
/// The vertex order fixes the orientation. Swapping any two vertices flips the
/// normal returned by [`Facet::normal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Facet<const D: usize> {
    vertices: [usize; D],
}

impl<const D: usize> Facet<D> {
    /// Creates a facet from its ordered vertex indices.
    #[inline]
    #[must_use]
    pub const fn new(vertices: [usize; D]) -> Self {
        Self { vertices }
    }

    /// The ordered vertex indices.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> &[usize; D] {
        &self.vertices
    }

    /// Returns `true` if `index` is one of the facet's vertices.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.vertices.contains(&index)
    }

    /// Reverses the orientation by swapping the first two vertices.
    #[inline]
    pub fn flip(&mut self) {
        if D >= 2 {
            self.vertices.swap(0, 1);
        }
    }

    /// The order-independent key of the facet's vertex set.
    #[must_use]
    pub fn key(&self) -> MultiIndex {
        MultiIndex::new(self.vertices)
    }

    /// Unnormalized normal of the facet's hyperplane over `points`.
    ///
    /// # Panics
    ///
    /// Panics if a vertex index is out of range for `points`.
    #[must_use]
    pub fn normal(&self, points: &[Point<D>]) -> Point<D> {
        hyperplane_normal_of(|i| &points[self.vertices[i]])
    }

    /// Centroid of the facet's vertices.
    ///
    /// # Panics
    ///
    /// Panics if a vertex index is out of range for `points`.
    #[must_use]
    pub fn centroid(&self, points: &[Point<D>]) -> Point<D> {
        Point::centroid_of(self.vertices.iter().map(|&i| &points[i]))
    }
}

/// Indices `0..=D` with position `omit` removed: face `omit` of the simplex `[0, 1, ..., D]`.
fn simplex_face<const D: usize>(omit: usize) -> Facet<D> {
    let mut vertices = [0; D];
    for (slot, v) in vertices.iter_mut().zip((0..=D).filter(|&v| v != omit)) {
        *slot = v;
    }
    Facet::new(vertices)
}

// =============================================================================
// OPTIONS AND SCRATCH
// =============================================================================

/// Default ceiling on the incremental strategy.
pub const DEFAULT_MAX_INCREMENTAL_HULL_SIZE: usize = 40;

/// Strategy selection parameters for [`ConvexHullEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HullOptions {
    /// Allow the incremental strategy, which assumes general position.
    pub general_position: bool,
    /// Largest point count handed to the incremental strategy.
    pub max_incremental_hull_size: usize,
}

impl Default for HullOptions {
    fn default() -> Self {
        Self {
            general_position: true,
            max_incremental_hull_size: DEFAULT_MAX_INCREMENTAL_HULL_SIZE,
        }
    }
}

/// One entry of the ridge incidence table of the simplex `[0, 1, ..., D]`.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RidgeIncidence {
    /// The `D-1` vertices of the ridge.
    ridge: SimplexIndexBuffer,
    /// The two faces (by omitted vertex) that share the ridge.
    faces: [usize; 2],
}

/// Precomputed ridge/face incidence for the `D+2` point case of [`simple_hull`].
#[derive(Clone, Debug)]
pub struct SimpleHullScratch<const D: usize> {
    incidence: Vec<RidgeIncidence>,
}

impl<const D: usize> SimpleHullScratch<D> {
    /// Builds the incidence table.
    #[must_use]
    pub fn new() -> Self {
        let faces: Vec<Facet<D>> = (0..=D).map(simplex_face::<D>).collect();
        let mut incidence = Vec::new();
        for v1 in 0..=D {
            for v2 in 0..v1 {
                let ridge: SimplexIndexBuffer = (0..=D).filter(|&v| v != v1 && v != v2).collect();
                let mut found = [usize::MAX; 2];
                let mut count = 0;
                for (f, face) in faces.iter().enumerate() {
                    if count < 2 && ridge.iter().all(|&v| face.contains(v)) {
                        found[count] = f;
                        count += 1;
                    }
                }
                debug_assert_eq!(count, 2, "every ridge of a simplex has two faces");
                incidence.push(RidgeIncidence {
                    ridge,
                    faces: found,
                });
            }
        }
        Self { incidence }
    }
}

impl<const D: usize> Default for SimpleHullScratch<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reusable buffers for every strategy of [`ConvexHullEngine`].
///
/// Each thread owns its own scratch. Reusing one scratch across calls avoids
/// reallocating the incremental strategy's facet and ridge tables.
#[derive(Clone, Debug, Default)]
pub struct ConvexHullScratch<const D: usize> {
    /// Scratch for the exact small-set path.
    pub simple: SimpleHullScratch<D>,
    /// Scratch for the incremental path.
    pub incremental: IncrementalHullScratch<D>,
}

impl<const D: usize> ConvexHullScratch<D> {
    /// Creates scratch with no ceiling on the incremental path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates scratch whose incremental ceiling matches `options`.
    #[must_use]
    pub fn for_options(options: &HullOptions) -> Self {
        Self {
            simple: SimpleHullScratch::new(),
            incremental: IncrementalHullScratch::with_max_points(options.max_incremental_hull_size),
        }
    }
}

// =============================================================================
// EXACT SMALL-SET HULL
// =============================================================================

/// Largest input handled by [`simple_hull`].
#[inline]
#[must_use]
pub const fn max_simple_hull_size<const D: usize>() -> usize {
    D + 2
}

/// Exact hull of at most `D+2` points.
///
/// - `D` points: the two oppositely oriented copies of the single facet.
/// - `D+1` points: the faces of the simplex.
/// - `D+2` points: the faces of the first `D+1` points that keep the extra
///   point on their inner side, plus one new facet per ridge separating kept
///   from dropped faces.
///
/// # Errors
///
/// - [`ConvexHullError::UnsupportedDimension`] when `D < 2`.
/// - [`ConvexHullError::InsufficientPoints`] for fewer than `D` points.
/// - [`ConvexHullError::UnsupportedSize`] for more than `D+2` points.
/// - [`ConvexHullError::GeometricDegeneracy`] when the first `D+1` of `D+2`
///   points are affinely dependent.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::algorithms::convex_hull::{simple_hull, SimpleHullScratch};
/// use multilabel_boundary::geometry::point::Point;
///
/// let square = [
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([0.0, 1.0]),
///     Point::new([1.0, 1.0]),
/// ];
/// let hull = simple_hull(&square, &SimpleHullScratch::new()).unwrap();
/// assert_eq!(hull.len(), 4);
/// ```
pub fn simple_hull<const D: usize>(
    points: &[Point<D>],
    scratch: &SimpleHullScratch<D>,
) -> Result<Vec<Facet<D>>, ConvexHullError> {
    if D < 2 {
        return Err(ConvexHullError::UnsupportedDimension { dimension: D });
    }
    let n = points.len();
    if n < D {
        return Err(ConvexHullError::InsufficientPoints {
            actual: n,
            required: D,
            dimension: D,
        });
    }

    if n == D {
        let mut first = [0; D];
        for (i, slot) in first.iter_mut().enumerate() {
            *slot = i;
        }
        let front = Facet::new(first);
        let mut back = front;
        back.flip();
        return Ok(vec![front, back]);
    }

    if n == D + 1 {
        let mut hull: Vec<Facet<D>> = (0..=D).map(simplex_face::<D>).collect();
        orient(points, &mut hull);
        return Ok(hull);
    }

    if n > max_simple_hull_size::<D>() {
        return Err(ConvexHullError::UnsupportedSize {
            actual: n,
            max: max_simple_hull_size::<D>(),
        });
    }

    let base = &points[..=D];
    if matches!(simplex_orientation(base), Ok(Orientation::DEGENERATE) | Err(_)) {
        return Err(ConvexHullError::GeometricDegeneracy {
            message: format!("first {} of {n} points are affinely dependent", D + 1),
        });
    }

    let center = Point::centroid(base);
    let extra = points[D + 1];
    let mut hull = Vec::with_capacity(2 * D);
    let mut kept_flags = vec![false; D + 1];
    for (d, flag) in kept_flags.iter_mut().enumerate() {
        let face = simplex_face::<D>(d);
        let normal = face.normal(points);
        let origin = points[face.vertices()[0]];
        *flag = signed_offset(&normal, &origin, &center) * signed_offset(&normal, &origin, &extra)
            > 0.0;
        if *flag {
            hull.push(face);
        }
    }

    for entry in &scratch.incidence {
        let [a, b] = entry.faces;
        if kept_flags[a] != kept_flags[b] {
            let mut vertices = [D + 1; D];
            vertices[..D - 1].copy_from_slice(&entry.ridge);
            hull.push(Facet::new(vertices));
        }
    }

    orient(points, &mut hull);
    Ok(hull)
}

// =============================================================================
// ORIENTATION
// =============================================================================

/// Orients every facet so its normal points away from the centroid of `points`.
///
/// Idempotent. Degenerate facets (zero normal) are left untouched.
///
/// # Panics
///
/// Panics if a facet references an index outside `points`.
pub fn orient<const D: usize>(points: &[Point<D>], facets: &mut [Facet<D>]) {
    let center = Point::centroid(points);
    for facet in facets {
        let normal = facet.normal(points);
        let to_center = center - facet.centroid(points);
        if to_center.dot(&normal) > 0.0 {
            facet.flip();
        }
    }
}

/// Returns `true` when every facet normal points away from the centroid of `points`.
#[must_use]
pub fn is_oriented<const D: usize>(points: &[Point<D>], facets: &[Facet<D>]) -> bool {
    let center = Point::centroid(points);
    facets
        .iter()
        .all(|f| (center - f.centroid(points)).dot(&f.normal(points)) <= 0.0)
}

// =============================================================================
// ENGINE
// =============================================================================

/// Strategy dispatcher over the exact, incremental, and external hulls.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::algorithms::convex_hull::{
///     ConvexHullEngine, ConvexHullScratch, HullOptions,
/// };
/// use multilabel_boundary::geometry::point::Point;
///
/// let engine = ConvexHullEngine::<3>::new(HullOptions::default()).unwrap();
/// let mut scratch = ConvexHullScratch::new();
///
/// // Six points on the moment curve (t, t^2, t^3) are in convex position.
/// let points: Vec<Point<3>> = (1..=6)
///     .map(|t| {
///         let t = f64::from(t);
///         Point::new([t, t * t, t * t * t])
///     })
///     .collect();
/// let hull = engine.compute(&points, &mut scratch).unwrap();
/// // A simplicial 3-polytope with V vertices has 2V - 4 triangles.
/// assert_eq!(hull.len(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct ConvexHullEngine<const D: usize, F = BruteForceHull> {
    options: HullOptions,
    fallback: F,
}

impl<const D: usize> ConvexHullEngine<D, BruteForceHull> {
    /// Creates an engine using [`BruteForceHull`] as the external fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHullError::UnsupportedDimension`] when `D < 2`.
    pub fn new(options: HullOptions) -> Result<Self, ConvexHullError> {
        Self::with_fallback(options, BruteForceHull::default())
    }
}

impl<const D: usize, F> ConvexHullEngine<D, F>
where
    F: ExternalHull<D>,
{
    /// Creates an engine with a caller-supplied fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHullError::UnsupportedDimension`] when `D < 2`.
    pub fn with_fallback(options: HullOptions, fallback: F) -> Result<Self, ConvexHullError> {
        if D < 2 {
            return Err(ConvexHullError::UnsupportedDimension { dimension: D });
        }
        Ok(Self { options, fallback })
    }

    /// The engine's strategy options.
    #[must_use]
    pub const fn options(&self) -> &HullOptions {
        &self.options
    }

    /// Computes the oriented hull of `points`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHullError::InvalidPoint`] for non-finite input, and
    /// otherwise any error of the selected strategy. Degeneracy reported by
    /// the exact or incremental paths is retried on the external fallback.
    pub fn compute(
        &self,
        points: &[Point<D>],
        scratch: &mut ConvexHullScratch<D>,
    ) -> Result<Vec<Facet<D>>, ConvexHullError> {
        for (index, p) in points.iter().enumerate() {
            p.validate()
                .map_err(|source| ConvexHullError::InvalidPoint { index, source })?;
        }

        let n = points.len();
        let attempt = if n <= max_simple_hull_size::<D>() {
            simple_hull(points, &scratch.simple)
        } else if self.options.general_position && n <= self.options.max_incremental_hull_size {
            incremental_hull(points, &mut scratch.incremental)
        } else {
            tracing::debug!(
                points = n,
                general_position = self.options.general_position,
                max_incremental = self.options.max_incremental_hull_size,
                "routing hull to external fallback"
            );
            return self.compute_external(points);
        };

        match attempt {
            Err(ConvexHullError::GeometricDegeneracy { message }) => {
                tracing::debug!(points = n, %message, "degenerate hull input, retrying on external fallback");
                self.compute_external(points)
            }
            other => other,
        }
    }

    /// Runs the external fallback inside the process-wide critical section.
    fn compute_external(&self, points: &[Point<D>]) -> Result<Vec<Facet<D>>, ConvexHullError> {
        let _guard = fallback_lock().lock().unwrap_or_else(PoisonError::into_inner);
        let mut hull = self.fallback.hull(points)?;
        orient(points, &mut hull);
        Ok(hull)
    }
}
