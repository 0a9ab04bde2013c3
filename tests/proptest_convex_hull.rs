//! Property-based tests for convex hull construction.
//!
//! This module uses proptest to verify that:
//! - The exact small-set hull agrees with the brute-force fallback
//! - `orient` is idempotent on engine output
//! - The incremental hull of a convex point set does not depend on insertion order
//!
//! Tests are generated for 2D and 3D using macros to reduce duplication.

use multilabel_boundary::core::multi_index::MultiIndex;
use multilabel_boundary::geometry::algorithms::convex_hull::{
    ConvexHullEngine, ConvexHullScratch, Facet, HullOptions, SimpleHullScratch, is_oriented,
    orient, simple_hull,
};
use multilabel_boundary::geometry::algorithms::fallback_hull::{BruteForceHull, ExternalHull};
use multilabel_boundary::geometry::algorithms::incremental_hull::{
    IncrementalHullScratch, incremental_hull,
};
use multilabel_boundary::geometry::point::Point;
use proptest::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

/// Strategy for generating finite f64 coordinates
fn finite_coordinate() -> impl Strategy<Value = f64> {
    (-100.0..100.0).prop_filter("must be finite", |x: &f64| x.is_finite())
}

fn keys<const D: usize>(facets: &[Facet<D>]) -> BTreeSet<MultiIndex> {
    facets.iter().map(Facet::key).collect()
}

/// Points on the moment curve `(t, t^2, ..., t^D)` are in convex general position.
fn moment_curve<const D: usize>(n: usize) -> Vec<Point<D>> {
    (0..n)
        .map(|k| {
            #[expect(clippy::cast_precision_loss)]
            let t = k as f64 / n as f64 * 2.0 - 1.0;
            let mut coords = [0.0; D];
            let mut power = 1.0;
            for c in &mut coords {
                power *= t;
                *c = power;
            }
            Point::new(coords)
        })
        .collect()
}

/// The strict fallback refuses near-degenerate inputs instead of guessing.
const STRICT: BruteForceHull = BruteForceHull {
    relative_tolerance: 1e-6,
};

// =============================================================================
// DIMENSIONAL TEST GENERATION MACROS
// =============================================================================

macro_rules! test_hull_properties {
    ($dim:literal) => {
        pastey::paste! {
            proptest! {
                /// Property: the exact small-set path finds the same facets as brute force
                #[test]
                fn [<prop_simple_hull_matches_brute_force_ $dim d>](
                    points in prop::collection::vec(
                        prop::array::[<uniform $dim>](finite_coordinate()).prop_map(Point::new),
                        ($dim + 1)..=($dim + 2)
                    )
                ) {
                    let reference = ExternalHull::<$dim>::hull(&STRICT, &points);
                    prop_assume!(reference.is_ok());
                    let exact = simple_hull::<$dim>(&points, &SimpleHullScratch::new());
                    prop_assume!(exact.is_ok());

                    let (exact, reference) = (exact.unwrap(), reference.unwrap());
                    prop_assert_eq!(keys(&exact), keys(&reference));
                    prop_assert!(is_oriented(&points, &exact));
                }

                /// Property: orienting an engine result again changes nothing
                #[test]
                fn [<prop_orient_is_idempotent_ $dim d>](
                    points in prop::collection::vec(
                        prop::array::[<uniform $dim>](finite_coordinate()).prop_map(Point::new),
                        ($dim + 1)..12
                    )
                ) {
                    let engine = ConvexHullEngine::<$dim>::new(HullOptions::default()).unwrap();
                    let hull = engine.compute(&points, &mut ConvexHullScratch::new());
                    prop_assume!(hull.is_ok());
                    let hull = hull.unwrap();

                    let mut again = hull.clone();
                    orient(&points, &mut again);
                    prop_assert_eq!(again, hull);
                }

                /// Property: insertion order does not change the incremental hull
                #[test]
                fn [<prop_incremental_hull_ignores_insertion_order_ $dim d>](
                    permutation in Just((0..9).collect::<Vec<usize>>()).prop_shuffle()
                ) {
                    let points = moment_curve::<$dim>(9);
                    let shuffled: Vec<Point<$dim>> = permutation.iter().map(|&i| points[i]).collect();

                    let mut scratch = IncrementalHullScratch::default();
                    let expected = keys(&incremental_hull(&points, &mut scratch).unwrap());
                    let hull = incremental_hull(&shuffled, &mut scratch).unwrap();
                    prop_assert!(is_oriented(&shuffled, &hull));

                    let relabeled: BTreeSet<MultiIndex> = hull
                        .iter()
                        .map(|f| MultiIndex::new(f.vertices().iter().map(|&v| permutation[v])))
                        .collect();
                    prop_assert_eq!(relabeled, expected);
                }
            }
        }
    };
}

test_hull_properties!(2);
test_hull_properties!(3);

// =============================================================================
// FIXED CONFIGURATIONS
// =============================================================================

#[test]
fn cyclic_polytope_facet_count() {
    // A 3-D cyclic polytope on n vertices has 2n - 4 facets.
    let points = moment_curve::<3>(9);
    let hull = incremental_hull(&points, &mut IncrementalHullScratch::default()).unwrap();
    assert_eq!(hull.len(), 14);
    assert_eq!(keys(&hull).len(), 14);
}

#[test]
fn engine_strategies_agree_on_convex_input() {
    let points = moment_curve::<3>(9);
    let incremental = ConvexHullEngine::<3>::new(HullOptions::default()).unwrap();
    let external = ConvexHullEngine::<3>::new(HullOptions {
        general_position: false,
        ..HullOptions::default()
    })
    .unwrap();

    let mut scratch = ConvexHullScratch::new();
    let a = incremental.compute(&points, &mut scratch).unwrap();
    let b = external.compute(&points, &mut scratch).unwrap();
    assert_eq!(keys(&a), keys(&b));
}
