//! Mesh output of the contour builder.

use glam::Vec2;
use strata_field::FillType;

/// Index range of one material's triangles inside [`ContourMesh::indices`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmeshRange {
    /// Material the range belongs to.
    pub fill: FillType,
    /// First index in the shared index buffer.
    pub start: usize,
    /// Number of indices (a multiple of 3).
    pub index_count: usize,
}

impl SubmeshRange {
    /// Number of triangles in the range.
    pub fn triangle_count(&self) -> usize {
        self.index_count / 3
    }

    /// Returns `true` when the material produced no geometry.
    pub fn is_empty(&self) -> bool {
        self.index_count == 0
    }
}

/// Triangulated contour of one chunk.
///
/// All materials share one vertex buffer; each material's triangles occupy a
/// contiguous index range so a renderer can bind one material per
/// [`SubmeshRange`].
#[derive(Debug, Default)]
pub struct ContourMesh {
    /// Shared vertex positions in chunk-local space.
    pub vertices: Vec<Vec2>,
    /// Triangle indices into `vertices`.
    pub indices: Vec<u32>,
    /// One range per supported material, in [`FillType::MATERIALS`] order.
    /// Ranges for materials absent from the chunk are empty.
    pub submeshes: Vec<SubmeshRange>,
}

impl ContourMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of triangles across all submeshes.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Clears all buffers, keeping their allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.submeshes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submesh_triangle_count() {
        let range = SubmeshRange {
            fill: FillType::Rock,
            start: 6,
            index_count: 9,
        };
        assert_eq!(range.triangle_count(), 3);
        assert!(!range.is_empty());
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut mesh = ContourMesh::new();
        mesh.vertices.push(Vec2::ZERO);
        mesh.indices.extend([0, 0, 0]);
        let cap = mesh.vertices.capacity();
        mesh.clear();
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.vertices.capacity() >= cap);
    }
}
