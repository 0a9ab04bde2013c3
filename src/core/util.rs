//! General helper utilities

use crate::core::collections::SimplexIndexBuffer;

// =============================================================================
// COMBINATIONS
// =============================================================================

/// Generate all `k`-element index combinations of `0..n` in lexicographic order.
///
/// Used to enumerate candidate hull facets and candidate label tuples.
///
/// # Examples
///
/// ```
/// use multilabel_boundary::core::util::index_combinations;
///
/// let combos = index_combinations(4, 2);
/// assert_eq!(combos.len(), 6);
/// assert_eq!(combos[0].as_slice(), &[0, 1]);
/// assert_eq!(combos[5].as_slice(), &[2, 3]);
/// ```
#[must_use]
pub fn index_combinations(n: usize, k: usize) -> Vec<SimplexIndexBuffer> {
    let mut combinations = Vec::with_capacity(binomial(n, k));

    if k == 0 {
        combinations.push(SimplexIndexBuffer::new());
        return combinations;
    }

    if k > n {
        return combinations;
    }

    let mut indices: SimplexIndexBuffer = (0..k).collect();

    loop {
        combinations.push(indices.clone());

        // Find next combination
        let mut i = k;
        loop {
            if i == 0 {
                return combinations;
            }
            i -= 1;
            if indices[i] != i + n - k {
                break;
            }
        }

        indices[i] += 1;
        for j in (i + 1)..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

/// Number of `k`-element subsets of an `n`-element set.
#[must_use]
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}
