//! Per-chunk voxel buffers.

use glam::Vec2;

use crate::fill::FillType;
use crate::grid;
use crate::modification::GridModification;
use crate::rect::Rect;

/// Flat per-chunk data store for one square region of the terrain field.
///
/// Holds four parallel buffers indexed by flat cell index: the fill type, the
/// sub-cell boundary offsets along the cell's right and top edges (packed as
/// `Vec2 { x: right, y: top }`, each in `[0, cell_size]`), and the boundary
/// normals at those two crossings.
///
/// `resolution` counts cells per side *including* one duplicated border row
/// and column shared with the neighboring chunks; the duplicated cells always
/// carry zero offsets so meshes stay seam-free across chunks.
///
/// The field exclusively owns its buffers. Scheduled tasks borrow them
/// through the lock that wraps the field; a chunk may only be dropped after
/// its outstanding task handle completed.
pub struct VoxelField {
    origin: Vec2,
    cell_size: f32,
    resolution: usize,
    pub fill_types: Vec<FillType>,
    pub offsets: Vec<Vec2>,
    pub normals_x: Vec<Vec2>,
    pub normals_y: Vec<Vec2>,
    modifiers: Vec<GridModification>,
}

impl VoxelField {
    /// Creates an empty field.
    ///
    /// `resolution` includes the duplicated border row/column and must be at
    /// least 2.
    pub fn new(origin: Vec2, cell_size: f32, resolution: usize) -> Self {
        debug_assert!(resolution >= 2);
        debug_assert!(cell_size > 0.0);
        let len = resolution * resolution;
        Self {
            origin,
            cell_size,
            resolution,
            fill_types: vec![FillType::None; len],
            offsets: vec![Vec2::ZERO; len],
            normals_x: vec![Vec2::ZERO; len],
            normals_y: vec![Vec2::ZERO; len],
            modifiers: Vec::new(),
        }
    }

    /// Bottom-left corner of the chunk in world space.
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// World-space edge length of one cell.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cells per side, including the duplicated border row/column.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of cells in the flat buffers.
    pub fn cell_count(&self) -> usize {
        self.resolution * self.resolution
    }

    /// World-space extent of the chunk (excluding the duplicated border,
    /// which overlaps the neighbor).
    pub fn extent(&self) -> f32 {
        self.cell_size * (self.resolution - 1) as f32
    }

    /// World-space bounds of the chunk.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.origin, self.origin + Vec2::splat(self.extent()))
    }

    /// Chunk-local position of a cell's bottom-left corner.
    pub fn cell_position(&self, index: usize) -> Vec2 {
        grid::cell_position(index, self.resolution, self.cell_size)
    }

    /// Queues a modification, already expressed in chunk-local coordinates.
    pub fn push_modifier(&mut self, modification: GridModification) {
        self.modifiers.push(modification);
    }

    /// Pending modifications in submission order.
    pub fn modifiers(&self) -> &[GridModification] {
        &self.modifiers
    }

    /// Removes and returns all pending modifications.
    pub fn take_modifiers(&mut self) -> Vec<GridModification> {
        std::mem::take(&mut self.modifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modification::{BlendMode, ModifierShape};
    use glam::vec2;

    #[test]
    fn test_new_field_is_empty_and_zeroed() {
        let field = VoxelField::new(Vec2::ZERO, 1.0, 5);
        assert_eq!(field.cell_count(), 25);
        assert!(field.fill_types.iter().all(|&f| f == FillType::None));
        assert!(field.offsets.iter().all(|&o| o == Vec2::ZERO));
    }

    #[test]
    fn test_bounds_exclude_duplicated_border() {
        let field = VoxelField::new(vec2(8.0, 8.0), 2.0, 5);
        let b = field.bounds();
        assert_eq!(b.min, vec2(8.0, 8.0));
        // 4 owned cells per side at cell size 2.
        assert_eq!(b.max, vec2(16.0, 16.0));
    }

    #[test]
    fn test_take_modifiers_preserves_order_and_clears() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 3);
        for extent in [1.0, 2.0] {
            field.push_modifier(GridModification {
                shape: ModifierShape::Circle,
                blend: BlendMode::Always,
                fill: FillType::Rock,
                center: Vec2::ZERO,
                extent,
            });
        }
        let taken = field.take_modifiers();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].extent, 1.0);
        assert_eq!(taken[1].extent, 2.0);
        assert!(field.modifiers().is_empty());
    }
}
