//! Boundary extraction over a whole 2-D grid.
//!
//! [`extract_boundary`] walks the grid cells in row-major order, splits each
//! cell into its two triangles, and feeds them to a [`BoundaryAssembler`].
//! The assembled vertices are mapped into world space on the way out.
//!
//! # Examples
//!
//! ```rust
//! use multilabel_boundary::core::extraction::{extract_boundary, ExtractionOptions};
//! use multilabel_boundary::core::grid::Grid;
//!
//! // Label 0 owns the left half of a 4x4 grid, label 1 the right half.
//! let grid = Grid::from_fn([4, 4], 2, |[i, _], label| {
//!     let x = i as f64 / 3.0;
//!     if label == 0 { 1.0 - x } else { x }
//! })
//! .unwrap();
//!
//! let mesh = extract_boundary(&grid, &ExtractionOptions::default()).unwrap();
//! assert_eq!(mesh.edge_count(), 6);
//! assert!(mesh.points.iter().all(|p| (p[0] - 1.5).abs() < 1e-12));
//! ```

use crate::core::boundary_assembler::{
    BoundaryAssembler, BoundaryError, SimplexVertexSolver, TriangleCandidates, VertexStrategy,
};
use crate::core::cell_simplices::{CellSimplices, TriangleCorners};
use crate::core::grid::Grid;
use crate::core::multi_index::MultiIndex;
use crate::geometry::algorithms::convex_hull::{DEFAULT_MAX_INCREMENTAL_HULL_SIZE, HullOptions};
use crate::geometry::algorithms::fallback_hull::{BruteForceHull, ExternalHull};
use crate::geometry::point::Point;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that abort an extraction run.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExtractionError {
    /// Assembly failed for some triangle.
    #[error(transparent)]
    Boundary(#[from] BoundaryError),
    /// The options are invalid.
    #[error("Invalid extraction options: {message}")]
    Options {
        /// Description of the problem.
        message: String,
    },
}

impl From<ExtractionOptionsBuilderError> for ExtractionError {
    fn from(e: ExtractionOptionsBuilderError) -> Self {
        Self::Options {
            message: e.to_string(),
        }
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Configuration for [`extract_boundary`].
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::boundary_assembler::VertexStrategy;
/// use multilabel_boundary::core::extraction::ExtractionOptionsBuilder;
///
/// let options = ExtractionOptionsBuilder::default()
///     .strategy(VertexStrategy::BruteForce)
///     .parallel(true)
///     .build()
///     .unwrap();
/// assert!(options.general_position);
/// assert_eq!(options.domain_tolerance, 0.0);
///
/// assert!(ExtractionOptionsBuilder::default()
///     .domain_tolerance(-1.0)
///     .build()
///     .is_err());
/// ```
#[derive(Builder, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ExtractionOptions {
    /// How tie points are found within each simplex.
    #[builder(default)]
    pub strategy: VertexStrategy,
    /// Whether hull inputs may be assumed to be in general position.
    #[builder(default = "true")]
    pub general_position: bool,
    /// Largest dual point set handed to the incremental hull.
    #[builder(default = "DEFAULT_MAX_INCREMENTAL_HULL_SIZE")]
    pub max_incremental_hull_size: usize,
    /// Slack on the parametric domain test, in local simplex coordinates.
    #[builder(default = "0.0")]
    pub domain_tolerance: f64,
    /// Compute per-triangle candidates on the rayon pool.
    #[builder(default)]
    pub parallel: bool,
}

fn check_domain_tolerance(t: f64) -> Result<(), String> {
    if t.is_finite() && t >= 0.0 {
        Ok(())
    } else {
        Err(format!("domain_tolerance must be finite and non-negative, got {t}"))
    }
}

impl ExtractionOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        self.domain_tolerance.map_or(Ok(()), check_domain_tolerance)
    }
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            strategy: VertexStrategy::default(),
            general_position: true,
            max_incremental_hull_size: DEFAULT_MAX_INCREMENTAL_HULL_SIZE,
            domain_tolerance: 0.0,
            parallel: false,
        }
    }
}

impl ExtractionOptions {
    /// The hull engine settings implied by these options.
    #[must_use]
    pub const fn hull_options(&self) -> HullOptions {
        HullOptions {
            general_position: self.general_position,
            max_incremental_hull_size: self.max_incremental_hull_size,
        }
    }

    fn check(&self) -> Result<(), ExtractionError> {
        check_domain_tolerance(self.domain_tolerance)
            .map_err(|message| ExtractionError::Options { message })
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Boundary curves between labels, in world coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryMesh {
    /// Vertex positions.
    pub points: Vec<Point<2>>,
    /// Edges as indices into `points`.
    pub edges: Vec<[usize; 2]>,
    /// The two labels each edge separates, smaller label first.
    pub edge_labels: Vec<[usize; 2]>,
    /// The labels tying at each vertex.
    pub vertex_labels: Vec<MultiIndex>,
}

impl BoundaryMesh {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges separating labels `a` and `b`, in either order.
    pub fn edges_for_labels(&self, a: usize, b: usize) -> impl Iterator<Item = [usize; 2]> + '_ {
        let key = [a.min(b), a.max(b)];
        self.edges
            .iter()
            .zip(&self.edge_labels)
            .filter(move |(_, labels)| **labels == key)
            .map(|(edge, _)| *edge)
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Extracts the multi-label boundary of `grid`.
///
/// Sequential and parallel runs produce identical meshes.
///
/// # Errors
///
/// Returns [`ExtractionError::Options`] for an invalid `domain_tolerance` and
/// [`ExtractionError::Boundary`] when a triangle cannot be assembled. Local
/// numerical failures (singular intersections, points outside a simplex) are
/// not errors.
pub fn extract_boundary(
    grid: &Grid<2>,
    options: &ExtractionOptions,
) -> Result<BoundaryMesh, ExtractionError> {
    extract_boundary_with_fallback(grid, options, BruteForceHull::default())
}

/// [`extract_boundary`] with a caller-supplied hull for inputs the built-in
/// strategies do not handle.
///
/// # Errors
///
/// As [`extract_boundary`]; a failing `fallback` surfaces as
/// [`BoundaryError::Hull`].
pub fn extract_boundary_with_fallback<F>(
    grid: &Grid<2>,
    options: &ExtractionOptions,
    fallback: F,
) -> Result<BoundaryMesh, ExtractionError>
where
    F: ExternalHull<2> + ExternalHull<3> + Clone,
{
    options.check()?;
    let solver = SimplexVertexSolver::with_fallback(
        options.strategy,
        options.hull_options(),
        options.domain_tolerance,
        fallback,
    )?;
    let triangles: Vec<TriangleCorners> = grid
        .cells()
        .flat_map(|origin| *CellSimplices::new(origin).triangles())
        .collect();

    tracing::debug!(
        cells = grid.cell_count(),
        labels = grid.label_count(),
        strategy = ?options.strategy,
        parallel = options.parallel,
        "extracting boundary"
    );

    let mut assembler = BoundaryAssembler::new(solver);
    if options.parallel {
        let solver = assembler.solver();
        let candidates: Vec<TriangleCandidates> = triangles
            .par_iter()
            .map_init(
                || solver.scratch(),
                |scratch, triangle| solver.triangle_candidates(grid, triangle, scratch),
            )
            .collect::<Result<_, _>>()?;
        for candidate in candidates {
            assembler.merge(candidate)?;
        }
    } else {
        let mut scratch = assembler.solver().scratch();
        for triangle in &triangles {
            assembler.add_triangle(grid, triangle, &mut scratch)?;
        }
    }

    let assembled = assembler.finish();
    let (points, vertex_labels): (Vec<Point<2>>, Vec<MultiIndex>) = assembled
        .vertices
        .into_iter()
        .map(|v| (grid.to_world(&v.position), v.labels))
        .unzip();
    let mesh = BoundaryMesh {
        points,
        edges: assembled.edges,
        edge_labels: assembled.edge_labels,
        vertex_labels,
    };

    tracing::debug!(
        vertices = mesh.vertex_count(),
        edges = mesh.edge_count(),
        culled = assembled.culled_triangles,
        triangles = triangles.len(),
        "boundary extracted"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridTransform;
    use crate::geometry::algorithms::convex_hull::{ConvexHullError, Facet};
    use approx::assert_relative_eq;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// Labels 0 and 1 cross halfway along axis 0.
    #[expect(clippy::cast_precision_loss)]
    fn ramp_grid(n: usize) -> Grid<2> {
        Grid::from_fn([n, n], 2, |[i, _], label| {
            let x = i as f64 / (n - 1) as f64;
            if label == 0 { 1.0 - x } else { x }
        })
        .unwrap()
    }

    /// Six labels, all active on every triangle touching the bottom row.
    #[expect(clippy::cast_precision_loss)]
    fn six_label_fan() -> Grid<2> {
        Grid::from_fn([3, 2], 6, |[i, j], label| {
            let k = label as f64;
            match (i, j) {
                (0, 0) => 0.1 * k,
                (1, 0) => 0.1 * (5.0 - k) + 0.013 * k * k,
                (2, 0) => 0.05 * k + 0.011 * k * k * k,
                _ => 0.3 + 0.07 * ((k - 2.5) * (i as f64 + 1.3)).sin(),
            }
        })
        .unwrap()
    }

    #[derive(Clone, Debug)]
    struct RefusingHull;

    impl<const D: usize> ExternalHull<D> for RefusingHull {
        fn hull(&self, _points: &[Point<D>]) -> Result<Vec<Facet<D>>, ConvexHullError> {
            Err(ConvexHullError::FallbackFailed {
                message: "refused".to_string(),
            })
        }
    }

    // =========================================================================
    // OPTIONS
    // =========================================================================

    #[test]
    fn builder_defaults_match_default() {
        let built = ExtractionOptionsBuilder::default().build().unwrap();
        assert_eq!(built, ExtractionOptions::default());
        assert_eq!(built.hull_options(), HullOptions::default());
    }

    #[test]
    fn builder_rejects_bad_tolerance() {
        let err = ExtractionOptionsBuilder::default()
            .domain_tolerance(f64::NAN)
            .build()
            .unwrap_err();
        let err = ExtractionError::from(err);
        assert!(matches!(err, ExtractionError::Options { .. }));
    }

    #[test]
    fn extract_rejects_bad_tolerance() {
        let options = ExtractionOptions {
            domain_tolerance: -0.5,
            ..ExtractionOptions::default()
        };
        assert!(matches!(
            extract_boundary(&ramp_grid(3), &options),
            Err(ExtractionError::Options { .. })
        ));
    }

    #[test]
    fn builder_and_extract_report_the_same_tolerance_error() {
        let built = ExtractionOptionsBuilder::default()
            .domain_tolerance(-0.5)
            .build()
            .unwrap_err();
        let options = ExtractionOptions {
            domain_tolerance: -0.5,
            ..ExtractionOptions::default()
        };
        let direct = extract_boundary(&ramp_grid(3), &options).unwrap_err();
        assert_eq!(ExtractionError::from(built), direct);
        assert!(direct.to_string().contains("got -0.5"));
    }

    #[test]
    fn options_serialization_roundtrip() {
        let options = ExtractionOptions {
            strategy: VertexStrategy::BruteForce,
            parallel: true,
            ..ExtractionOptions::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: ExtractionOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }

    // =========================================================================
    // EXTRACTION
    // =========================================================================

    #[test]
    fn ties_on_grid_corners_are_culled() {
        // Labels tie exactly on column 1, so every triangle has a label that is
        // never exceeded.
        let mesh = extract_boundary(&ramp_grid(3), &ExtractionOptions::default()).unwrap();
        assert_eq!(mesh, BoundaryMesh::default());
    }

    #[test]
    fn four_by_four_ramp_has_one_polyline() {
        let mesh = extract_boundary(&ramp_grid(4), &ExtractionOptions::default()).unwrap();
        // x = 1.5 crosses 4 horizontal edges and 3 diagonals.
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.edge_count(), 6);
        for p in &mesh.points {
            assert_relative_eq!(p[0], 1.5, epsilon = 1e-12);
        }
        assert!(mesh.vertex_labels.iter().all(|l| *l == MultiIndex::pair(0, 1)));
        assert_eq!(mesh.edges_for_labels(1, 0).count(), mesh.edge_count());
        assert_eq!(mesh.edges_for_labels(0, 2).count(), 0);
    }

    #[test]
    fn world_transform_is_applied() {
        let grid = ramp_grid(4).with_transform(GridTransform::scale_translate([2.0, 1.0], [10.0, 0.0]));
        let mesh = extract_boundary(&grid, &ExtractionOptions::default()).unwrap();
        for p in &mesh.points {
            assert_relative_eq!(p[0], 13.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn single_label_grid_has_no_boundary() {
        let grid = Grid::from_fn([3, 4], 3, |_, label| if label == 2 { 1.0 } else { 0.0 }).unwrap();
        let mesh = extract_boundary(&grid, &ExtractionOptions::default()).unwrap();
        assert_eq!(mesh, BoundaryMesh::default());
    }

    #[test]
    fn parallel_matches_sequential() {
        let grid = ramp_grid(6);
        let sequential = extract_boundary(&grid, &ExtractionOptions::default()).unwrap();
        let parallel = extract_boundary(
            &grid,
            &ExtractionOptions {
                parallel: true,
                ..ExtractionOptions::default()
            },
        )
        .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn mesh_serialization_roundtrip() {
        let mesh = extract_boundary(&ramp_grid(4), &ExtractionOptions::default()).unwrap();
        let json = serde_json::to_string(&mesh).unwrap();
        let back: BoundaryMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mesh);
    }

    #[test]
    fn failing_fallback_aborts_extraction() {
        let grid = six_label_fan();
        for parallel in [false, true] {
            let options = ExtractionOptions {
                general_position: false,
                parallel,
                ..ExtractionOptions::default()
            };
            let result = extract_boundary_with_fallback(&grid, &options, RefusingHull);
            assert!(
                matches!(
                    result,
                    Err(ExtractionError::Boundary(BoundaryError::Hull(
                        ConvexHullError::FallbackFailed { .. }
                    )))
                ),
                "parallel = {parallel}: {result:?}"
            );
        }
    }

    #[test]
    fn default_fallback_handles_the_same_grid() {
        let grid = six_label_fan();
        let options = ExtractionOptions {
            general_position: false,
            ..ExtractionOptions::default()
        };
        let mesh = extract_boundary(&grid, &options).unwrap();
        assert!(mesh.edge_count() > 0);
    }
}
