//! Canonical, order-independent index tuples.
//!
//! A [`MultiIndex`] is the dedup key for everything discovered more than once
//! during extraction: grid edges and triangles (keyed by corner linear indices),
//! label sets at boundary vertices, and hull ridges (keyed by hull vertex
//! indices). The indices are sorted on construction, so the same set always
//! produces the same key no matter which simplex discovered it first.

use crate::core::collections::{MAX_PRACTICAL_DIMENSION_SIZE, SmallBuffer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A sorted tuple of small integers, usable as a hash or ordered-map key.
///
/// Duplicate entries are kept: a multi-index is a sorted tuple, not a set.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::multi_index::MultiIndex;
///
/// let a = MultiIndex::new([7, 2, 5]);
/// let b = MultiIndex::new([5, 7, 2]);
/// assert_eq!(a, b);
/// assert_eq!(a.as_slice(), &[2, 5, 7]);
/// assert!(a.contains(5));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<usize>", into = "Vec<usize>")]
pub struct MultiIndex {
    indices: SmallBuffer<usize, MAX_PRACTICAL_DIMENSION_SIZE>,
}

impl MultiIndex {
    /// Builds the canonical key for a collection of indices.
    #[must_use]
    pub fn new<I>(indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut indices: SmallBuffer<usize, MAX_PRACTICAL_DIMENSION_SIZE> =
            indices.into_iter().collect();
        indices.sort_unstable();
        Self { indices }
    }

    /// Builds the key for a pair, the most common case.
    #[inline]
    #[must_use]
    pub fn pair(a: usize, b: usize) -> Self {
        Self::new([a, b])
    }

    /// The sorted indices.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Number of indices.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` when the key holds no indices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Membership test by binary search.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Iterates over the sorted indices.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

impl FromIterator<usize> for MultiIndex {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<usize>> for MultiIndex {
    fn from(indices: Vec<usize>) -> Self {
        Self::new(indices)
    }
}

impl From<MultiIndex> for Vec<usize> {
    fn from(key: MultiIndex) -> Self {
        key.indices.into_vec()
    }
}

impl<const N: usize> From<[usize; N]> for MultiIndex {
    fn from(indices: [usize; N]) -> Self {
        Self::new(indices)
    }
}

impl fmt::Display for MultiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, idx) in self.indices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collections::FastHashMap;

    #[test]
    fn canonicalization_is_order_independent() {
        let perms = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let keys: Vec<MultiIndex> = perms.iter().map(|p| MultiIndex::from(*p)).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn keys_work_in_hash_maps() {
        let mut map: FastHashMap<MultiIndex, u32> = FastHashMap::default();
        map.insert(MultiIndex::pair(4, 1), 10);
        assert_eq!(map.get(&MultiIndex::pair(1, 4)), Some(&10));
        assert_eq!(map.get(&MultiIndex::pair(1, 5)), None);
    }

    #[test]
    fn ordering_is_lexicographic_on_sorted_indices() {
        let a = MultiIndex::new([3, 1]);
        let b = MultiIndex::new([2, 5]);
        assert!(a < b);
        assert!(MultiIndex::new([1]) < MultiIndex::new([2, 1]));
        assert!(MultiIndex::new([1, 0]) < MultiIndex::new([1]));
    }

    #[test]
    fn membership_and_length() {
        let labels = MultiIndex::new([0, 2, 3]);
        assert!(labels.contains(2));
        assert!(!labels.contains(1));
        assert_eq!(labels.len(), 3);
        assert!(!labels.is_empty());
        assert!(MultiIndex::default().is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let k = MultiIndex::new([2, 2, 1]);
        assert_eq!(k.as_slice(), &[1, 2, 2]);
    }

    #[test]
    fn display_and_serde() {
        let k = MultiIndex::new([9, 4]);
        assert_eq!(k.to_string(), "{4, 9}");

        let json = serde_json::to_string(&k).unwrap();
        assert_eq!(json, "[4,9]");
        let back: MultiIndex = serde_json::from_str("[9,4]").unwrap();
        assert_eq!(back, k);
    }
}
