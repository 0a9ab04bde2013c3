//! Per-simplex construction of boundary vertices and edges.
//!
//! For every grid triangle, and for each of its three edges, the assembler
//! finds the points where two or more labels tie for the maximum weight:
//!
//! - on an edge, the points where two labels tie;
//! - inside a triangle, the points where three labels tie.
//!
//! Each label's weights at the simplex corners define an affine function on
//! the canonical right simplex. With [`VertexStrategy::Hull`] the candidate
//! tuples come from the upper hull of the functions' dual points; with
//! [`VertexStrategy::BruteForce`] every tuple is intersected and tested.
//!
//! Vertices found on an edge or triangle are cached under the sorted linear
//! indices of its corners, so the edge shared by two triangles contributes its
//! vertices exactly once.

use crate::core::cell_simplices::{CornerIndex, EdgeCorners, TriangleCorners, triangle_edges};
use crate::core::collections::{
    Entry, FastHashMap, LabelValueBuffer, SIMPLEX_VERTEX_BUFFER_SIZE, SimplexIndexBuffer,
    SimplexVertexIdBuffer, SmallBuffer, fast_hash_map_with_capacity,
};
use crate::core::grid::{Grid, GridError};
use crate::core::multi_index::MultiIndex;
use crate::core::util::index_combinations;
use crate::geometry::affine_function::{AffineFunction, AffineFunctionError};
use crate::geometry::algorithms::convex_hull::{
    ConvexHullEngine, ConvexHullError, ConvexHullScratch, HullOptions,
};
use crate::geometry::algorithms::fallback_hull::{BruteForceHull, ExternalHull};
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that abort boundary assembly.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BoundaryError {
    /// Hull construction failed for a simplex.
    #[error(transparent)]
    Hull(#[from] ConvexHullError),
    /// A grid lookup failed.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// Corner samples could not be fitted.
    #[error(transparent)]
    Function(#[from] AffineFunctionError),
    /// A label pair met a triangle in other than zero or two vertices.
    #[error("Labels ({}, {}) have {count} boundary vertices in triangle {triangle}, expected 0 or 2", labels[0], labels[1])]
    InconsistentBoundary {
        /// The label pair.
        labels: [usize; 2],
        /// Number of vertices carrying both labels.
        count: usize,
        /// The triangle's corner key.
        triangle: MultiIndex,
    },
}

// =============================================================================
// TYPES
// =============================================================================

/// How tie points are found within a simplex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexStrategy {
    /// Upper hull of the labels' dual points.
    #[default]
    Hull,
    /// Every label pair or triple, filtered by a maximality test.
    BruteForce,
}

/// A boundary vertex in grid coordinates with the labels tying there.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    /// Position in grid coordinates.
    pub position: Point<2>,
    /// The tying labels.
    pub labels: MultiIndex,
}

/// Per-worker hull buffers for edges (2-D hulls) and triangles (3-D hulls).
#[derive(Clone, Debug)]
pub struct AssemblerScratch {
    edge: ConvexHullScratch<2>,
    triangle: ConvexHullScratch<3>,
}

impl AssemblerScratch {
    /// Creates scratch sized for `options`.
    #[must_use]
    pub fn new(options: &HullOptions) -> Self {
        Self {
            edge: ConvexHullScratch::for_options(options),
            triangle: ConvexHullScratch::for_options(options),
        }
    }
}

/// Candidate vertices of one triangle and its edges, computed without
/// touching the dedup maps.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleCandidates {
    key: MultiIndex,
    /// `None` when one label dominates and the triangle is skipped.
    parts: Option<CandidateParts>,
}

impl TriangleCandidates {
    /// `true` when the triangle was skipped.
    #[must_use]
    pub const fn is_culled(&self) -> bool {
        self.parts.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
struct CandidateParts {
    interior: Vec<VertexRecord>,
    edges: [(MultiIndex, Vec<VertexRecord>); 3],
}

// =============================================================================
// VERTEX SOLVER
// =============================================================================

/// Stateless tie-point computation for single simplices.
///
/// `F` is the external hull used for large or degenerate dual point sets, in
/// both the 2-D (edge) and 3-D (triangle) hull engines.
#[derive(Clone, Debug)]
pub struct SimplexVertexSolver<F = BruteForceHull> {
    strategy: VertexStrategy,
    domain_tolerance: f64,
    hull_options: HullOptions,
    edge_engine: ConvexHullEngine<2, F>,
    triangle_engine: ConvexHullEngine<3, F>,
}

impl SimplexVertexSolver<BruteForceHull> {
    /// Creates a solver backed by [`BruteForceHull`].
    ///
    /// # Errors
    ///
    /// Propagates hull engine construction errors.
    pub fn new(
        strategy: VertexStrategy,
        hull_options: HullOptions,
        domain_tolerance: f64,
    ) -> Result<Self, BoundaryError> {
        Self::with_fallback(strategy, hull_options, domain_tolerance, BruteForceHull::default())
    }
}

impl<F> SimplexVertexSolver<F>
where
    F: ExternalHull<2> + ExternalHull<3> + Clone,
{
    /// Creates a solver with a caller-supplied external hull.
    ///
    /// # Errors
    ///
    /// Propagates hull engine construction errors.
    pub fn with_fallback(
        strategy: VertexStrategy,
        hull_options: HullOptions,
        domain_tolerance: f64,
        fallback: F,
    ) -> Result<Self, BoundaryError> {
        Ok(Self {
            strategy,
            domain_tolerance,
            hull_options,
            edge_engine: ConvexHullEngine::with_fallback(hull_options, fallback.clone())?,
            triangle_engine: ConvexHullEngine::with_fallback(hull_options, fallback)?,
        })
    }

    /// Fresh scratch matching this solver's hull options.
    #[must_use]
    pub fn scratch(&self) -> AssemblerScratch {
        AssemblerScratch::new(&self.hull_options)
    }

    /// The configured strategy.
    #[must_use]
    pub const fn strategy(&self) -> VertexStrategy {
        self.strategy
    }

    /// Tie points of two labels along a grid edge.
    ///
    /// The edge should be canonical (corners ordered by linear index) so that
    /// every triangle sharing it gets bit-identical vertices.
    ///
    /// # Errors
    ///
    /// Returns hull and grid errors; singular intersections are skipped.
    pub fn edge_vertices(
        &self,
        grid: &Grid<2>,
        edge: &EdgeCorners,
        scratch: &mut AssemblerScratch,
    ) -> Result<Vec<VertexRecord>, BoundaryError> {
        let samples = corner_samples(grid, edge)?;
        let functions = fit_functions::<1>(grid.label_count(), &samples)?;
        let tol = self.domain_tolerance;
        let place = |p: &Point<1>| {
            let t = p[0];
            (-tol..=1.0 + tol).contains(&t).then(|| lerp_edge(edge, t))
        };
        match self.strategy {
            VertexStrategy::Hull => hull_vertices::<1, 2, F>(
                &self.edge_engine,
                &functions,
                &samples,
                &mut scratch.edge,
                place,
            ),
            VertexStrategy::BruteForce => Ok(brute_force_vertices::<1>(
                &functions,
                &all_labels(functions.len()),
                place,
            )),
        }
    }

    /// Tie points of three labels inside a grid triangle.
    ///
    /// # Errors
    ///
    /// Returns hull and grid errors; singular intersections are skipped.
    pub fn triangle_vertices(
        &self,
        grid: &Grid<2>,
        triangle: &TriangleCorners,
        scratch: &mut AssemblerScratch,
    ) -> Result<Vec<VertexRecord>, BoundaryError> {
        let samples = corner_samples(grid, triangle)?;
        let functions = fit_functions::<2>(grid.label_count(), &samples)?;
        let tol = self.domain_tolerance;
        let place = |p: &Point<2>| {
            let (x, y) = (p[0], p[1]);
            (x >= -tol && y >= -tol && x + y <= 1.0 + tol).then(|| map_triangle(triangle, x, y))
        };
        match self.strategy {
            VertexStrategy::Hull => hull_vertices::<2, 3, F>(
                &self.triangle_engine,
                &functions,
                &samples,
                &mut scratch.triangle,
                place,
            ),
            VertexStrategy::BruteForce => Ok(brute_force_vertices::<2>(
                &functions,
                &all_labels(functions.len()),
                place,
            )),
        }
    }

    /// Candidate vertices for a triangle and its three edges.
    ///
    /// # Errors
    ///
    /// Returns hull and grid errors.
    pub fn triangle_candidates(
        &self,
        grid: &Grid<2>,
        triangle: &TriangleCorners,
        scratch: &mut AssemblerScratch,
    ) -> Result<TriangleCandidates, BoundaryError> {
        let key = corner_key(grid, triangle)?;
        if is_dominated(grid, triangle)? {
            return Ok(TriangleCandidates { key, parts: None });
        }
        let interior = self.triangle_vertices(grid, triangle, scratch)?;
        let [e0, e1, e2] = triangle_edges(triangle);
        let mut edge = |e: EdgeCorners| -> Result<(MultiIndex, Vec<VertexRecord>), BoundaryError> {
            let e = canonical_edge(grid, e)?;
            Ok((corner_key(grid, &e)?, self.edge_vertices(grid, &e, scratch)?))
        };
        let edges = [edge(e0)?, edge(e1)?, edge(e2)?];
        Ok(TriangleCandidates {
            key,
            parts: Some(CandidateParts { interior, edges }),
        })
    }
}

// =============================================================================
// BOUNDARY ASSEMBLER
// =============================================================================

/// Accumulates deduplicated boundary vertices and edges over many triangles.
#[derive(Clone, Debug)]
pub struct BoundaryAssembler<F = BruteForceHull> {
    solver: SimplexVertexSolver<F>,
    vertices: Vec<VertexRecord>,
    edge_vertices: FastHashMap<MultiIndex, SimplexVertexIdBuffer>,
    triangle_vertices: FastHashMap<MultiIndex, SimplexVertexIdBuffer>,
    edges: Vec<[usize; 2]>,
    edge_labels: Vec<[usize; 2]>,
    culled: usize,
}

/// The assembled boundary in grid coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledBoundary {
    /// Vertices in discovery order.
    pub vertices: Vec<VertexRecord>,
    /// Boundary edges as vertex index pairs.
    pub edges: Vec<[usize; 2]>,
    /// The label pair separated by each edge.
    pub edge_labels: Vec<[usize; 2]>,
    /// Triangles skipped because one label dominated them.
    pub culled_triangles: usize,
}

impl<F> BoundaryAssembler<F>
where
    F: ExternalHull<2> + ExternalHull<3> + Clone,
{
    /// Creates an empty assembler.
    #[must_use]
    pub fn new(solver: SimplexVertexSolver<F>) -> Self {
        Self {
            solver,
            vertices: Vec::new(),
            edge_vertices: FastHashMap::default(),
            triangle_vertices: FastHashMap::default(),
            edges: Vec::new(),
            edge_labels: Vec::new(),
            culled: 0,
        }
    }

    /// The solver used for single simplices.
    #[must_use]
    pub const fn solver(&self) -> &SimplexVertexSolver<F> {
        &self.solver
    }

    /// Number of vertices registered so far.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Processes one triangle, computing only the fragments not seen before.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::InconsistentBoundary`] when a label pair does
    /// not form a single edge, and propagates hull and grid errors.
    pub fn add_triangle(
        &mut self,
        grid: &Grid<2>,
        triangle: &TriangleCorners,
        scratch: &mut AssemblerScratch,
    ) -> Result<(), BoundaryError> {
        if is_dominated(grid, triangle)? {
            self.culled += 1;
            return Ok(());
        }
        let key = corner_key(grid, triangle)?;
        if !self.triangle_vertices.contains_key(&key) {
            let found = self.solver.triangle_vertices(grid, triangle, scratch)?;
            self.register(true, key.clone(), found);
        }
        let mut edge_keys: [MultiIndex; 3] = Default::default();
        for (slot, e) in edge_keys.iter_mut().zip(triangle_edges(triangle)) {
            let e = canonical_edge(grid, e)?;
            let edge_key = corner_key(grid, &e)?;
            if !self.edge_vertices.contains_key(&edge_key) {
                let found = self.solver.edge_vertices(grid, &e, scratch)?;
                self.register(false, edge_key.clone(), found);
            }
            *slot = edge_key;
        }
        self.emit_edges(&key, &edge_keys)
    }

    /// Merges precomputed candidates; first write wins for every key.
    ///
    /// Merging candidates in traversal order reproduces [`Self::add_triangle`] exactly.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_triangle`].
    pub fn merge(&mut self, candidates: TriangleCandidates) -> Result<(), BoundaryError> {
        let TriangleCandidates { key, parts } = candidates;
        let Some(CandidateParts { interior, edges }) = parts else {
            self.culled += 1;
            return Ok(());
        };
        self.register(true, key.clone(), interior);
        let mut edge_keys: [MultiIndex; 3] = Default::default();
        for (slot, (edge_key, found)) in edge_keys.iter_mut().zip(edges) {
            self.register(false, edge_key.clone(), found);
            *slot = edge_key;
        }
        self.emit_edges(&key, &edge_keys)
    }

    /// Consumes the assembler and returns its output.
    #[must_use]
    pub fn finish(self) -> AssembledBoundary {
        AssembledBoundary {
            vertices: self.vertices,
            edges: self.edges,
            edge_labels: self.edge_labels,
            culled_triangles: self.culled,
        }
    }

    fn register(&mut self, interior: bool, key: MultiIndex, found: Vec<VertexRecord>) {
        let map = if interior {
            &mut self.triangle_vertices
        } else {
            &mut self.edge_vertices
        };
        if let Entry::Vacant(slot) = map.entry(key) {
            let start = self.vertices.len();
            let ids: SimplexVertexIdBuffer = (start..start + found.len()).collect();
            self.vertices.extend(found);
            slot.insert(ids);
        }
    }

    fn emit_edges(&mut self, key: &MultiIndex, edge_keys: &[MultiIndex; 3]) -> Result<(), BoundaryError> {
        let mut by_pair: FastHashMap<[usize; 2], SimplexVertexIdBuffer> =
            fast_hash_map_with_capacity(SIMPLEX_VERTEX_BUFFER_SIZE);
        let gathered = edge_keys
            .iter()
            .filter_map(|k| self.edge_vertices.get(k))
            .chain(self.triangle_vertices.get(key))
            .flatten()
            .copied();
        for id in gathered {
            let labels = self.vertices[id].labels.as_slice();
            for pair in index_combinations(labels.len(), 2) {
                by_pair
                    .entry([labels[pair[0]], labels[pair[1]]])
                    .or_default()
                    .push(id);
            }
        }

        let mut pairs: Vec<_> = by_pair.into_iter().collect();
        pairs.sort_unstable_by_key(|(pair, _)| *pair);
        for (labels, ids) in pairs {
            match ids.as_slice() {
                [a, b] => {
                    self.edges.push([*a, *b]);
                    self.edge_labels.push(labels);
                }
                _ => {
                    return Err(BoundaryError::InconsistentBoundary {
                        labels,
                        count: ids.len(),
                        triangle: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn corner_key(grid: &Grid<2>, corners: &[CornerIndex]) -> Result<MultiIndex, GridError> {
    corners
        .iter()
        .map(|c| grid.linearize(c))
        .collect::<Result<Vec<_>, _>>()
        .map(MultiIndex::from)
}

/// Orders an edge's corners by linear index.
fn canonical_edge(grid: &Grid<2>, e: EdgeCorners) -> Result<EdgeCorners, GridError> {
    if grid.linearize(&e[0])? <= grid.linearize(&e[1])? {
        Ok(e)
    } else {
        Ok([e[1], e[0]])
    }
}

/// Label weights at each corner of a simplex.
fn corner_samples(
    grid: &Grid<2>,
    corners: &[CornerIndex],
) -> Result<Vec<LabelValueBuffer>, GridError> {
    corners
        .iter()
        .map(|c| Ok(grid.values(grid.linearize(c)?).iter().copied().collect()))
        .collect()
}

/// `true` when some label is never exceeded at any corner of the triangle.
fn is_dominated(grid: &Grid<2>, triangle: &TriangleCorners) -> Result<bool, GridError> {
    let samples = corner_samples(grid, triangle)?;
    Ok((0..grid.label_count()).any(|n| {
        samples
            .iter()
            .all(|values| values.iter().all(|&other| other <= values[n]))
    }))
}

fn fit_functions<const L: usize>(
    label_count: usize,
    samples: &[LabelValueBuffer],
) -> Result<Vec<AffineFunction<L>>, AffineFunctionError> {
    (0..label_count)
        .map(|label| {
            let corner_values: LabelValueBuffer = samples.iter().map(|s| s[label]).collect();
            AffineFunction::<L>::from_corner_values(&corner_values)
        })
        .collect()
}

fn all_labels(label_count: usize) -> SimplexIndexBuffer {
    (0..label_count).collect()
}

/// Labels not strictly below some other label at every corner.
///
/// A label strictly below another at every corner is below it on the whole
/// simplex and cannot tie for the maximum there.
fn active_labels(samples: &[LabelValueBuffer], label_count: usize) -> SimplexIndexBuffer {
    (0..label_count)
        .filter(|&i| {
            !(0..label_count)
                .any(|j| j != i && samples.iter().all(|values| values[j] > values[i]))
        })
        .collect()
}

fn hull_vertices<const L: usize, const H: usize, F: ExternalHull<H>>(
    engine: &ConvexHullEngine<H, F>,
    functions: &[AffineFunction<L>],
    samples: &[LabelValueBuffer],
    scratch: &mut ConvexHullScratch<H>,
    place: impl Fn(&Point<L>) -> Option<Point<2>>,
) -> Result<Vec<VertexRecord>, BoundaryError> {
    let active = active_labels(samples, functions.len());
    match active.len().cmp(&H) {
        Ordering::Less => return Ok(Vec::new()),
        // A single candidate tuple has no hull to speak of.
        Ordering::Equal => return Ok(brute_force_vertices(functions, &active, place)),
        Ordering::Greater => {}
    }

    let duals = active
        .iter()
        .map(|&l| functions[l].dual::<H>())
        .collect::<Result<Vec<Point<H>>, _>>()?;

    let facets = engine.compute(&duals, scratch)?;

    let mut found = Vec::new();
    for facet in &facets {
        // Only facets facing down the constant axis lie on the upper envelope.
        if facet.normal(&duals)[0] >= 0.0 {
            continue;
        }
        // Intersect in ascending label order so both strategies solve the same system.
        let labels = MultiIndex::new(facet.vertices().iter().map(|&v| active[v]));
        let tied: SmallBuffer<AffineFunction<L>, 4> = labels.iter().map(|l| functions[l]).collect();
        match AffineFunction::intersect(&tied) {
            Ok(p) => {
                if let Some(position) = place(&p) {
                    found.push(VertexRecord { position, labels });
                }
            }
            Err(e) => tracing::trace!(%labels, error = %e, "dropping hull facet without intersection"),
        }
    }
    Ok(found)
}

/// Intersects every `(L+1)`-tuple of `candidates` and keeps the points where
/// no other label exceeds the tie value.
fn brute_force_vertices<const L: usize>(
    functions: &[AffineFunction<L>],
    candidates: &[usize],
    place: impl Fn(&Point<L>) -> Option<Point<2>>,
) -> Vec<VertexRecord> {
    let mut found = Vec::new();
    for combination in index_combinations(candidates.len(), L + 1) {
        let tuple: SimplexIndexBuffer = combination.iter().map(|&i| candidates[i]).collect();
        let tied: SmallBuffer<AffineFunction<L>, 4> = tuple.iter().map(|&l| functions[l]).collect();
        let labels = MultiIndex::new(tuple.iter().copied());
        let p = match AffineFunction::intersect(&tied) {
            Ok(p) => p,
            Err(e) => {
                tracing::trace!(%labels, error = %e, "skipping label tuple without intersection");
                continue;
            }
        };
        let Some(position) = place(&p) else {
            continue;
        };
        let value = tied[0].evaluate(&p);
        let is_maximum = functions
            .iter()
            .enumerate()
            .all(|(l, f)| tuple.contains(&l) || f.evaluate(&p) <= value);
        if is_maximum {
            found.push(VertexRecord { position, labels });
        }
    }
    found
}

#[expect(
    clippy::cast_precision_loss,
    reason = "grid coordinates are far below 2^52"
)]
fn corner_point(c: CornerIndex) -> Point<2> {
    Point::new([c[0] as f64, c[1] as f64])
}

fn lerp_edge(edge: &EdgeCorners, t: f64) -> Point<2> {
    let a = corner_point(edge[0]);
    let b = corner_point(edge[1]);
    a + (b - a) * t
}

fn map_triangle(triangle: &TriangleCorners, x: f64, y: f64) -> Point<2> {
    let s0 = corner_point(triangle[0]);
    let s1 = corner_point(triangle[1]);
    let s2 = corner_point(triangle[2]);
    s0 + (s1 - s0) * x + (s2 - s0) * y
}
