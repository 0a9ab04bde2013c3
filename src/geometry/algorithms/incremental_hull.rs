//! Beneath-beyond incremental convex hull for points in general position.
//!
//! Starting from the simplex on the first `D+1` points, each further point is
//! inserted by classifying every current facet: a facet whose hyperplane keeps
//! the new point on the same side as an interior reference point survives,
//! every other facet is visible from the new point and is dropped. Every ridge
//! shared by one surviving and one dropped facet is part of the horizon, and is
//! coned to the new point.

use crate::core::collections::{
    Entry, FastHashMap, RidgeIncidenceBuffer, SimplexIndexBuffer,
};
use crate::core::multi_index::MultiIndex;
use crate::geometry::algorithms::convex_hull::{ConvexHullError, Facet, orient};
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, signed_offset, simplex_orientation};

#[derive(Clone, Debug)]
struct FaceRecord<const D: usize> {
    facet: Facet<D>,
    normal: Point<D>,
    kept: bool,
}

#[derive(Clone, Debug)]
struct RidgeRecord {
    vertices: SimplexIndexBuffer,
    incident: RidgeIncidenceBuffer,
}

/// Reusable buffers for [`incremental_hull`].
///
/// The buffers are cleared, not freed, between insertions and between calls.
/// A scratch must not be shared between threads while in use; give each worker
/// its own.
#[derive(Clone, Debug)]
pub struct IncrementalHullScratch<const D: usize> {
    faces: Vec<FaceRecord<D>>,
    next_faces: Vec<FaceRecord<D>>,
    ridges: Vec<RidgeRecord>,
    ridge_lookup: FastHashMap<MultiIndex, usize>,
    max_points: usize,
}

impl<const D: usize> Default for IncrementalHullScratch<D> {
    fn default() -> Self {
        Self::with_max_points(usize::MAX)
    }
}

impl<const D: usize> IncrementalHullScratch<D> {
    /// Creates scratch that refuses inputs larger than `max_points`.
    #[must_use]
    pub fn with_max_points(max_points: usize) -> Self {
        Self {
            faces: Vec::new(),
            next_faces: Vec::new(),
            ridges: Vec::new(),
            ridge_lookup: FastHashMap::default(),
            max_points,
        }
    }

    /// The largest input this scratch accepts.
    #[must_use]
    pub const fn max_points(&self) -> usize {
        self.max_points
    }

    fn record(points: &[Point<D>], facet: Facet<D>) -> FaceRecord<D> {
        FaceRecord {
            normal: facet.normal(points),
            facet,
            kept: false,
        }
    }
}

/// Incremental hull of `points`, oriented outward.
///
/// # Errors
///
/// - [`ConvexHullError::UnsupportedDimension`] when `D < 2`.
/// - [`ConvexHullError::UnsupportedSize`] when `points` exceeds the scratch's ceiling.
/// - [`ConvexHullError::InsufficientPoints`] for `D` or fewer points.
/// - [`ConvexHullError::GeometricDegeneracy`] when the first `D+1` points are
///   affinely dependent or the facet set stops being a closed surface.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::geometry::algorithms::incremental_hull::{
///     incremental_hull, IncrementalHullScratch,
/// };
/// use multilabel_boundary::geometry::point::Point;
///
/// let pentagon: Vec<Point<2>> = (0..5u8)
///     .map(|k| {
///         let a = f64::from(k) * std::f64::consts::TAU / 5.0;
///         Point::new([a.cos(), a.sin()])
///     })
///     .collect();
/// let mut scratch = IncrementalHullScratch::default();
/// let hull = incremental_hull(&pentagon, &mut scratch).unwrap();
/// assert_eq!(hull.len(), 5);
/// ```
pub fn incremental_hull<const D: usize>(
    points: &[Point<D>],
    scratch: &mut IncrementalHullScratch<D>,
) -> Result<Vec<Facet<D>>, ConvexHullError> {
    if D < 2 {
        return Err(ConvexHullError::UnsupportedDimension { dimension: D });
    }
    let n = points.len();
    if n > scratch.max_points {
        return Err(ConvexHullError::UnsupportedSize {
            actual: n,
            max: scratch.max_points,
        });
    }
    if n <= D {
        return Err(ConvexHullError::InsufficientPoints {
            actual: n,
            required: D + 1,
            dimension: D,
        });
    }
    if matches!(
        simplex_orientation(&points[..=D]),
        Ok(Orientation::DEGENERATE) | Err(_)
    ) {
        return Err(ConvexHullError::GeometricDegeneracy {
            message: format!("initial simplex on the first {} points is flat", D + 1),
        });
    }

    let IncrementalHullScratch {
        faces,
        next_faces,
        ridges,
        ridge_lookup,
        ..
    } = scratch;

    faces.clear();
    for omit in 0..=D {
        let mut vertices = [0; D];
        for (slot, v) in vertices.iter_mut().zip((0..=D).filter(|&v| v != omit)) {
            *slot = v;
        }
        faces.push(IncrementalHullScratch::record(points, Facet::new(vertices)));
    }

    let mut sum = points[..=D]
        .iter()
        .fold(Point::origin(), |acc, &p| acc + p);
    let mut processed = D + 1;

    for v in (D + 1)..n {
        #[expect(clippy::cast_precision_loss, reason = "point counts are small")]
        let reference = sum * (1.0 / processed as f64);
        let p = points[v];

        next_faces.clear();
        for face in faces.iter_mut() {
            let origin = points[face.facet.vertices()[0]];
            face.kept = signed_offset(&face.normal, &origin, &reference)
                * signed_offset(&face.normal, &origin, &p)
                > 0.0;
            if face.kept {
                next_faces.push(face.clone());
            }
        }

        ridges.clear();
        ridge_lookup.clear();
        for (f, face) in faces.iter().enumerate() {
            for omit in 0..D {
                let ridge: SimplexIndexBuffer = face
                    .facet
                    .vertices()
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != omit)
                    .map(|(_, &vi)| vi)
                    .collect();
                match ridge_lookup.entry(MultiIndex::new(ridge.iter().copied())) {
                    Entry::Occupied(e) => ridges[*e.get()].incident.push(f),
                    Entry::Vacant(e) => {
                        e.insert(ridges.len());
                        let mut incident = RidgeIncidenceBuffer::new();
                        incident.push(f);
                        ridges.push(RidgeRecord {
                            vertices: ridge,
                            incident,
                        });
                    }
                }
            }
        }

        for ridge in ridges.iter() {
            let [a, b] = ridge.incident[..] else {
                return Err(ConvexHullError::GeometricDegeneracy {
                    message: format!(
                        "ridge {:?} is shared by {} facets while inserting point {v}",
                        ridge.vertices.as_slice(),
                        ridge.incident.len()
                    ),
                });
            };
            if faces[a].kept != faces[b].kept {
                let mut vertices = [v; D];
                vertices[..D - 1].copy_from_slice(&ridge.vertices);
                next_faces.push(IncrementalHullScratch::record(points, Facet::new(vertices)));
            }
        }

        std::mem::swap(faces, next_faces);
        sum = sum + p;
        processed += 1;
    }

    let mut hull: Vec<Facet<D>> = faces.iter().map(|f| f.facet).collect();
    orient(points, &mut hull);
    Ok(hull)
}
