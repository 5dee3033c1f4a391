//! Cell index math and marching-squares corner configurations.
//!
//! Cells are stored in a flat row-major array: `(0, 0)` is the bottom-left
//! cell, x varies fastest. The last row and column of a chunk duplicate the
//! first row/column of the neighboring chunks.

use glam::Vec2;

use crate::fill::FillType;

/// Converts a flat cell index to its bottom-left corner position in
/// chunk-local space.
pub fn cell_position(index: usize, resolution: usize, cell_size: f32) -> Vec2 {
    let (x, y) = cell_coords(index, resolution);
    Vec2::new(x as f32 * cell_size, y as f32 * cell_size)
}

/// Converts a flat cell index to `(x, y)` cell coordinates.
pub fn cell_coords(index: usize, resolution: usize) -> (usize, usize) {
    (index % resolution, index / resolution)
}

/// Converts `(x, y)` cell coordinates to a flat index.
pub fn cell_index(x: usize, y: usize, resolution: usize) -> usize {
    x + y * resolution
}

/// Returns `true` for cells in the duplicated last row or column, which
/// mirror data owned by the neighboring chunk.
pub fn is_border_cell(index: usize, resolution: usize) -> bool {
    let (x, y) = cell_coords(index, resolution);
    x == resolution - 1 || y == resolution - 1
}

/// Fill type at `index`, or `None` when the index is past the end of the
/// buffer (reads off the top of the chunk).
pub fn neighbor_fill(fill_types: &[FillType], index: usize) -> FillType {
    fill_types.get(index).copied().unwrap_or(FillType::None)
}

/// Offset (or normal) at `index`, or zero when the index is out of range.
pub fn neighbor_vec(values: &[Vec2], index: usize) -> Vec2 {
    values.get(index).copied().unwrap_or(Vec2::ZERO)
}

/// Builds the 4-bit marching-squares configuration for one 2×2 corner group.
///
/// Bit 1 is the cell's own corner (bottom-left of the group), bit 2 the top
/// neighbor, bit 4 the top-right neighbor, and bit 8 the right neighbor. A
/// corner's bit is set when its fill equals `compare`.
pub fn corner_config(
    compare: FillType,
    bottom_left: FillType,
    top_left: FillType,
    top_right: FillType,
    bottom_right: FillType,
) -> u8 {
    let mut config = 0;
    if compare == bottom_left {
        config |= 1;
    }
    if compare == top_left {
        config |= 2;
    }
    if compare == top_right {
        config |= 4;
    }
    if compare == bottom_right {
        config |= 8;
    }
    config
}

/// Configuration of the corner group anchored at `index`, reading the top,
/// top-right, and right neighbors out of the flat buffer. Out-of-range
/// neighbors read as `FillType::None`.
pub fn cell_config(fill_types: &[FillType], index: usize, resolution: usize, fill: FillType) -> u8 {
    corner_config(
        fill,
        fill_types[index],
        neighbor_fill(fill_types, index + resolution),
        neighbor_fill(fill_types, index + resolution + 1),
        neighbor_fill(fill_types, index + 1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        let resolution = 7;
        for index in 0..resolution * resolution {
            let (x, y) = cell_coords(index, resolution);
            assert_eq!(cell_index(x, y, resolution), index);
        }
    }

    #[test]
    fn test_cell_position_scales_by_cell_size() {
        let p = cell_position(cell_index(3, 2, 5), 5, 0.5);
        assert_eq!(p, Vec2::new(1.5, 1.0));
    }

    #[test]
    fn test_border_cells_are_last_row_and_column() {
        let resolution = 4;
        for index in 0..resolution * resolution {
            let (x, y) = cell_coords(index, resolution);
            assert_eq!(
                is_border_cell(index, resolution),
                x == 3 || y == 3,
                "cell ({x}, {y})"
            );
        }
    }

    #[test]
    fn test_corner_config_bits() {
        use FillType::{None, Rock};
        assert_eq!(corner_config(Rock, None, None, None, None), 0);
        assert_eq!(corner_config(Rock, Rock, None, None, None), 1);
        assert_eq!(corner_config(Rock, None, Rock, None, None), 2);
        assert_eq!(corner_config(Rock, None, None, Rock, None), 4);
        assert_eq!(corner_config(Rock, None, None, None, Rock), 8);
        assert_eq!(corner_config(Rock, Rock, Rock, Rock, Rock), 15);
    }

    #[test]
    fn test_cell_config_reads_none_past_buffer_end() {
        use FillType::Rock;
        // 2x2 grid, everything rock: the top-right cell has no top or right
        // neighbors inside the buffer.
        let fills = vec![Rock; 4];
        assert_eq!(cell_config(&fills, 3, 2, Rock), 1);
    }
}
