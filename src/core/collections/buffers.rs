//! Semantic buffer aliases used by the hull engine and the boundary assembler.

use super::{MAX_PRACTICAL_DIMENSION_SIZE, SIMPLEX_VERTEX_BUFFER_SIZE, SmallBuffer};

/// Indices of the vertices of one hull facet or one local simplex.
pub type SimplexIndexBuffer = SmallBuffer<usize, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Facets incident to a ridge. A closed hull has exactly two per ridge.
pub type RidgeIncidenceBuffer = SmallBuffer<usize, 2>;

/// Per-simplex list of boundary vertex ids, in discovery order.
pub type SimplexVertexIdBuffer = SmallBuffer<usize, SIMPLEX_VERTEX_BUFFER_SIZE>;

/// Label values sampled at one grid corner.
pub type LabelValueBuffer = SmallBuffer<f64, MAX_PRACTICAL_DIMENSION_SIZE>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_buffers_stay_inline() {
        let idx: SimplexIndexBuffer = (0..4).collect();
        assert!(!idx.spilled());

        let mut ridge = RidgeIncidenceBuffer::new();
        ridge.push(3);
        ridge.push(8);
        assert!(!ridge.spilled());

        let ids: SimplexVertexIdBuffer = (0..7).collect();
        assert_eq!(ids.len(), 7);
        assert!(!ids.spilled());

        let values: LabelValueBuffer = [0.1, 0.7, 0.2].into_iter().collect();
        assert_eq!(values.len(), 3);
    }
}
