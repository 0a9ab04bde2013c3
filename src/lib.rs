//! # multilabel-boundary
//!
//! This is a library for extracting the boundaries between regions of a 2-D grid
//! partitioned by several competing label fields, a generalization of
//! iso-contouring to more than two labels.
//!
//! Each grid cell is split into two triangles. Within a triangle every label's
//! samples define an affine function, and the boundary is where two or more of
//! those functions tie for the maximum. Tie points are found from the upper hull
//! of the functions' dual points, then stitched across triangles into a
//! deduplicated boundary mesh.
//!
//! # Features
//!
//! - d-dimensional convex hulls: exact small-set, incremental beneath-beyond, and a
//!   serialized external fallback behind the [`ExternalHull`](geometry::algorithms::fallback_hull::ExternalHull) trait
//! - Affine simplex functions with intersection and duality
//! - Hull-based and brute-force tie point strategies
//! - Sequential or [rayon](https://docs.rs/rayon) parallel extraction with identical output
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! Three labels, each dominant in one corner of a 2x2 grid, meet in a Y-junction:
//!
//! ```rust
//! use multilabel_boundary::prelude::*;
//!
//! let grid = Grid::from_fn([2, 2], 3, |corner, label| match (corner, label) {
//!     ([0, 0], 0) | ([1, 0], 1) | ([0, 1], 2) => 1.0,
//!     ([1, 1], 1) => 0.6,
//!     ([1, 1], 2) => 0.4,
//!     _ => 0.0,
//! })
//! .unwrap();
//!
//! let mesh = extract_boundary(&grid, &ExtractionOptions::default()).unwrap();
//! let junctions = mesh.vertex_labels.iter().filter(|l| l.len() == 3).count();
//! assert_eq!(junctions, 1);
//! assert_eq!(mesh.edges_for_labels(0, 1).count(), 1);
//! assert_eq!(mesh.edges_for_labels(0, 2).count(), 1);
//! assert_eq!(mesh.edges_for_labels(1, 2).count(), 2);
//! ```
//!
//! # Convex Hulls
//!
//! The hull engine is usable on its own:
//!
//! ```rust
//! use multilabel_boundary::prelude::*;
//!
//! let points = [
//!     Point::new([0.0, 0.0, 0.0]),
//!     Point::new([1.0, 0.0, 0.0]),
//!     Point::new([0.0, 1.0, 0.0]),
//!     Point::new([0.0, 0.0, 1.0]),
//!     Point::new([0.2, 0.2, 0.2]),
//! ];
//! let engine = ConvexHullEngine::<3>::new(HullOptions::default()).unwrap();
//! let hull = engine.compute(&points, &mut ConvexHullScratch::new()).unwrap();
//! assert_eq!(hull.len(), 4);
//! assert!(is_oriented(&points, &hull));
//! ```

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// Grids, boundary assembly, and extraction.
///
/// The `core` module holds the label [`Grid`](core::grid::Grid), the per-triangle
/// [`BoundaryAssembler`](core::boundary_assembler::BoundaryAssembler), and the
/// [`extract_boundary`](core::extraction::extract_boundary) entry point.
pub mod core {
    /// Per-simplex tie points, deduplication, and edge emission
    pub mod boundary_assembler;
    /// Decomposition of grid cells into triangles
    pub mod cell_simplices;
    /// High-performance collection types
    pub mod collections;
    /// Whole-grid extraction
    pub mod extraction;
    pub mod grid;
    pub mod multi_index;
    pub mod util;

    // Re-export the `core` modules.
    pub use boundary_assembler::*;
    pub use cell_simplices::*;
    pub use extraction::*;
    pub use grid::*;
    pub use multi_index::*;
    pub use util::*;
    // Note: collections module not re-exported here to avoid namespace pollution
    // Import specific types via prelude or use crate::core::collections::
}

/// Contains geometric types including the `Point` struct, affine simplex
/// functions, predicates, and convex hull algorithms.
pub mod geometry {
    /// Convex hull construction
    pub mod algorithms {
        /// Strategy dispatch, exact small-set hulls, and orientation
        pub mod convex_hull;
        /// Serialized general-purpose fallback
        pub mod fallback_hull;
        /// Beneath-beyond incremental hull
        pub mod incremental_hull;
        pub use convex_hull::*;
        pub use fallback_hull::*;
        pub use incremental_hull::*;
    }
    pub mod affine_function;
    pub mod matrix;
    pub mod point;
    pub mod predicates;
    pub use affine_function::*;
    pub use algorithms::*;
    pub use matrix::*;
    pub use point::*;
    pub use predicates::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        boundary_assembler::*, cell_simplices::*, extraction::*, grid::*, multi_index::*,
        util::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::{
        affine_function::*, algorithms::*, matrix::*, point::*, predicates::*,
    };
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            boundary_assembler::{AssemblerScratch, BoundaryAssembler, SimplexVertexSolver},
            extraction::BoundaryMesh,
            grid::Grid,
            multi_index::MultiIndex,
        },
        geometry::{
            AffineFunction, ConvexHullEngine, ConvexHullScratch, Point, algorithms::BruteForceHull,
        },
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point<3>>());
        assert!(is_normal::<AffineFunction<2>>());
        assert!(is_normal::<MultiIndex>());
        assert!(is_normal::<Grid<2>>());
        assert!(is_normal::<ConvexHullEngine<3>>());
        assert!(is_normal::<ConvexHullScratch<3>>());
        assert!(is_normal::<BruteForceHull>());
        assert!(is_normal::<SimplexVertexSolver>());
        assert!(is_normal::<AssemblerScratch>());
        assert!(is_normal::<BoundaryAssembler>());
        assert!(is_normal::<BoundaryMesh>());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<MultiIndex, usize> = fast_hash_map_with_capacity(4);
        map.insert(MultiIndex::pair(3, 1), 7);
        assert_eq!(map.get(&MultiIndex::from([1, 3])), Some(&7));

        let set: FastHashSet<usize> = FastHashSet::default();
        assert!(set.is_empty());

        let options = ExtractionOptions::default();
        assert_eq!(options.strategy, VertexStrategy::Hull);
    }
}
