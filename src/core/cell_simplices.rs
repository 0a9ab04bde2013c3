//! Decomposition of 2-D grid cells into triangles.

/// A grid corner by integer coordinates.
pub type CornerIndex = [usize; 2];

/// A triangle by its three corners.
pub type TriangleCorners = [CornerIndex; 3];

/// A grid edge by its two corners.
pub type EdgeCorners = [CornerIndex; 2];

/// The two triangles covering the cell whose lowest corner is `origin`.
///
/// Both triangles share the diagonal from `origin + (1, 0)` to `origin + (0, 1)`.
///
/// # Examples
///
/// ```rust
/// use multilabel_boundary::core::cell_simplices::CellSimplices;
///
/// let cell = CellSimplices::new([2, 5]);
/// assert_eq!(cell.triangles()[0], [[2, 5], [3, 5], [2, 6]]);
/// assert_eq!(cell.triangles()[1], [[3, 6], [2, 6], [3, 5]]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSimplices {
    triangles: [TriangleCorners; 2],
}

impl CellSimplices {
    /// Number of triangles per cell.
    pub const COUNT: usize = 2;

    /// Decomposes the cell at `origin`.
    #[must_use]
    pub const fn new(origin: CornerIndex) -> Self {
        let [i, j] = origin;
        Self {
            triangles: [
                [[i, j], [i + 1, j], [i, j + 1]],
                [[i + 1, j + 1], [i, j + 1], [i + 1, j]],
            ],
        }
    }

    /// The triangles, in processing order.
    #[must_use]
    pub const fn triangles(&self) -> &[TriangleCorners; 2] {
        &self.triangles
    }
}

/// The edges of a triangle; edge `d` is the one opposite corner `d`.
#[must_use]
pub const fn triangle_edges(t: &TriangleCorners) -> [EdgeCorners; 3] {
    [[t[1], t[2]], [t[2], t[0]], [t[0], t[1]]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangles_cover_all_four_corners() {
        let cell = CellSimplices::new([0, 0]);
        let mut corners: Vec<CornerIndex> = cell.triangles().iter().flatten().copied().collect();
        corners.sort_unstable();
        corners.dedup();
        assert_eq!(corners, vec![[0, 0], [0, 1], [1, 0], [1, 1]]);
    }

    #[test]
    fn triangles_share_the_diagonal() {
        let cell = CellSimplices::new([4, 7]);
        let [a, b] = cell.triangles();
        let shared: Vec<_> = a.iter().filter(|c| b.contains(c)).collect();
        assert_eq!(shared, vec![&[5, 7], &[4, 8]]);
    }

    #[test]
    fn edges_are_opposite_their_corner() {
        let t = CellSimplices::new([0, 0]).triangles()[0];
        for (d, edge) in triangle_edges(&t).iter().enumerate() {
            assert!(!edge.contains(&t[d]));
        }
    }
}
