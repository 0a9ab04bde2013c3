use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Optimized `HashMap` type for performance-critical operations.
/// Uses `rustc_hash::FxHasher` for faster hashing in non-cryptographic contexts.
///
/// All keys hashed by this crate are small integer tuples (grid corner
/// indices, label indices), so the hasher never sees attacker-controlled input.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(123, 456);
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Build hasher for [`FastHashMap`] and [`FastHashSet`].
pub type FastBuildHasher = FxBuildHasher;

/// Re-export the Entry enum for `FastHashMap`, used for first-write-wins inserts.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::collections::{Entry, FastHashMap};
///
/// let mut map: FastHashMap<u32, &str> = FastHashMap::default();
/// if let Entry::Vacant(e) = map.entry(7) {
///     e.insert("first");
/// }
/// if let Entry::Vacant(e) = map.entry(7) {
///     e.insert("second");
/// }
/// assert_eq!(map[&7], "first");
/// ```
pub use std::collections::hash_map::Entry;

/// Optimized `HashSet` type for membership tests.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::collections::FastHashSet;
///
/// let mut set: FastHashSet<usize> = FastHashSet::default();
/// set.insert(3);
/// assert!(set.contains(&3));
/// ```
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized Vec that uses stack allocation for small collections.
/// Provides heap fallback for larger collections.
///
/// # Size Guidelines
///
/// - **N=2**: Ridge incidence (every ridge of a closed hull has two facets)
/// - **N=4**: Labels tying at a boundary vertex
/// - **N=8**: Simplex corners, facet indices
/// - **N=16**: Per-simplex vertex lists
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
/// for i in 0..5 {
///     buffer.push(i);
/// }
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// SEMANTIC SIZE CONSTANTS
// =============================================================================

/// Semantic constant for the maximum practical dimension in computational geometry.
///
/// Hull dimensions in this crate are 2 and 3; simplex corner counts stay at or
/// below 4. 8 keeps every index tuple on the stack.
pub const MAX_PRACTICAL_DIMENSION_SIZE: usize = 8;

/// Inline capacity for per-simplex vertex lists.
pub const SIMPLEX_VERTEX_BUFFER_SIZE: usize = 16;
