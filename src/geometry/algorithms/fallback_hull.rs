//! External hull fallback for inputs the exact and incremental paths refuse.
//!
//! Implementations of [`ExternalHull`] are treated as not reentrant: the
//! engine only calls them while holding [`fallback_lock`], so at most one
//! fallback hull runs at a time in the whole process.

use crate::core::util::index_combinations;
use crate::geometry::algorithms::convex_hull::{ConvexHullError, Facet};
use crate::geometry::point::Point;
use crate::geometry::predicates::{hyperplane_normal_of, signed_offset};
use std::sync::Mutex;

static FALLBACK_LOCK: Mutex<()> = Mutex::new(());

/// The process-wide critical section guarding every [`ExternalHull`] call.
#[must_use]
pub fn fallback_lock() -> &'static Mutex<()> {
    &FALLBACK_LOCK
}

/// A general-purpose convex hull solver.
///
/// Implementations return every facet of the hull of `points` as exactly `D`
/// point indices. Orientation is fixed afterwards by the caller.
pub trait ExternalHull<const D: usize>: Send + Sync {
    /// Computes the hull facets.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHullError::FallbackFailed`] when the hull cannot be
    /// expressed as simplicial facets.
    fn hull(&self, points: &[Point<D>]) -> Result<Vec<Facet<D>>, ConvexHullError>;
}

/// Enumerates every `D`-subset and keeps those whose hyperplane supports the
/// whole point set.
///
/// `O(n^(D+1))`, exact up to `relative_tolerance`, and independent of
/// insertion order. A supporting hyperplane through more than `D` points
/// yields a non-simplicial facet and is reported as a failure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BruteForceHull {
    /// Side tests treat offsets below this fraction of the input's extent as zero.
    pub relative_tolerance: f64,
}

impl Default for BruteForceHull {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-10,
        }
    }
}

impl<const D: usize> ExternalHull<D> for BruteForceHull {
    fn hull(&self, points: &[Point<D>]) -> Result<Vec<Facet<D>>, ConvexHullError> {
        let n = points.len();
        if n <= D {
            return Err(ConvexHullError::FallbackFailed {
                message: format!("{n} points cannot span a {D}-dimensional hull"),
            });
        }

        let mut lo = [f64::INFINITY; D];
        let mut hi = [f64::NEG_INFINITY; D];
        for p in points {
            for (k, &c) in p.coords().iter().enumerate() {
                lo[k] = lo[k].min(c);
                hi[k] = hi[k].max(c);
            }
        }
        let extent = lo
            .iter()
            .zip(hi.iter())
            .map(|(l, h)| h - l)
            .fold(0.0f64, f64::max);

        let mut hull = Vec::new();
        for subset in index_combinations(n, D) {
            let normal = hyperplane_normal_of(|i| &points[subset[i]]);
            let norm = normal.squared_norm().sqrt();
            if norm <= f64::MIN_POSITIVE {
                continue;
            }
            let tol = self.relative_tolerance * norm * extent;
            let origin = points[subset[0]];

            let mut above = false;
            let mut below = false;
            let mut on_plane = 0usize;
            for (i, p) in points.iter().enumerate() {
                if subset.contains(&i) {
                    continue;
                }
                let s = signed_offset(&normal, &origin, p);
                if s > tol {
                    above = true;
                } else if s < -tol {
                    below = true;
                } else {
                    on_plane += 1;
                }
                if above && below {
                    break;
                }
            }
            if above && below {
                continue;
            }
            if on_plane > 0 {
                return Err(ConvexHullError::FallbackFailed {
                    message: format!(
                        "degenerate facet: {} coplanar points on a supporting hyperplane",
                        D + on_plane
                    ),
                });
            }

            let mut vertices = [0; D];
            vertices.copy_from_slice(&subset);
            hull.push(Facet::new(vertices));
        }

        if hull.is_empty() {
            return Err(ConvexHullError::FallbackFailed {
                message: format!("no supporting facets found for {n} points"),
            });
        }
        Ok(hull)
    }
}
