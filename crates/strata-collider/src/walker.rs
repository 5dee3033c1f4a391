//! Boundary walker: traces closed contour polylines per material.
//!
//! For every supported fill type the chunk is scanned for unvisited boundary
//! cells (marching-squares configuration other than 0 or 15). From a
//! discovered cell the walker first backtracks along the boundary to a
//! canonical loop start, so the same loop always begins at the same cell no
//! matter where the scan found it, then walks the boundary clockwise. Each
//! visited cell contributes one interpolated crossing vertex and a cardinal
//! step from a fixed 12-entry direction table; when the walk returns to the
//! start cell the first vertex is repeated, closing the polyline.
//!
//! The two opposite-corner configurations (5 and 10) are ambiguous diagonal
//! cases: the backtrack stops on them and the forward walk emits nothing
//! there, so an isolated diagonal pair produces no loop at all. Cells in the
//! duplicated border row/column are never used as loop seeds; their geometry
//! belongs to the neighboring chunk.

use glam::Vec2;

use strata_field::field::VoxelField;
use strata_field::fill::FillType;
use strata_field::grid;

use crate::outline::{ChunkOutline, OutlineLoop};

/// Traces all boundary loops of the field into a fresh outline.
pub fn trace_outlines(field: &VoxelField) -> ChunkOutline {
    let mut outline = ChunkOutline::new();
    trace_outlines_into(field, &mut outline);
    outline
}

/// Traces all boundary loops of the field into `outline`, reusing its
/// buffers.
pub fn trace_outlines_into(field: &VoxelField, outline: &mut ChunkOutline) {
    outline.vertices.clear();
    outline.loops.clear();

    let mut walker = Walker {
        fills: &field.fill_types,
        offsets: &field.offsets,
        resolution: field.resolution(),
        cell_size: field.cell_size(),
        visited: vec![false; field.cell_count()],
    };

    for &fill in &FillType::MATERIALS {
        walker.visited.fill(false);
        for index in 0..walker.fills.len() {
            if grid::is_border_cell(index, walker.resolution) || walker.visited[index] {
                continue;
            }
            walker.trace(index, fill, outline);
        }
    }
}

struct Walker<'a> {
    fills: &'a [FillType],
    offsets: &'a [Vec2],
    resolution: usize,
    cell_size: f32,
    visited: Vec<bool>,
}

impl Walker<'_> {
    fn config(&self, index: usize, fill: FillType) -> u8 {
        grid::cell_config(self.fills, index, self.resolution, fill)
    }

    fn trace(&mut self, discovered: usize, fill: FillType, outline: &mut ChunkOutline) {
        let config = self.config(discovered, fill);
        if config == 0 || config == 15 {
            return;
        }

        let start = self.find_loop_start(discovered, fill);
        let mut start_vertex = Vec2::ZERO;
        let mut count = 0;
        let mut index = start;
        loop {
            if count > 0 && index == start {
                // Loop closed: repeat the first vertex.
                outline.vertices.push(start_vertex);
                count += 1;
                break;
            }
            let config = self.config(index, fill);
            if config == 0 || config == 15 {
                break;
            }
            self.visited[index] = true;
            let Some((vertex, step)) = self.forward(index, config) else {
                // Ambiguous diagonal: the walk ends here.
                break;
            };
            if count == 0 {
                start_vertex = vertex;
            }
            outline.vertices.push(vertex);
            count += 1;
            let Some(next) = self.step(index, step) else {
                break;
            };
            index = next;
        }

        if count != 0 {
            outline.loops.push(OutlineLoop { fill, len: count });
        }
    }

    /// Backtracks counter-clockwise along the boundary until the walk closes
    /// on the discovery cell, leaves the chunk, or hits an ambiguous diagonal
    /// configuration; the cell it stops at is the canonical loop start.
    fn find_loop_start(&self, discovered: usize, fill: FillType) -> usize {
        let mut index = discovered;
        loop {
            let config = self.config(index, fill);
            let Some(step) = backward_step(config) else {
                return index;
            };
            let Some(next) = self.step(index, step) else {
                return index;
            };
            if next == discovered {
                return discovered;
            }
            index = next;
        }
    }

    /// Crossing vertex emitted at this cell plus the clockwise step to the
    /// next boundary cell, or `None` for the ambiguous diagonals.
    fn forward(&self, index: usize, config: u8) -> Option<(Vec2, (i32, i32))> {
        let cur = grid::cell_position(index, self.resolution, self.cell_size);
        match config {
            // Boundary exits through the bottom edge.
            1 | 3 | 7 => {
                let off = self.offsets[index];
                Some((cur + Vec2::new(off.x, 0.0), (0, -1)))
            }
            // Through the left edge.
            2 | 6 | 14 => {
                let off = self.offsets[index];
                Some((cur + Vec2::new(0.0, off.y), (-1, 0)))
            }
            // Through the top edge.
            4 | 12 | 13 => {
                let top = grid::cell_position(index + self.resolution, self.resolution, self.cell_size);
                let top_off = grid::neighbor_vec(self.offsets, index + self.resolution);
                Some((top + Vec2::new(top_off.x, 0.0), (0, 1)))
            }
            // Through the right edge.
            8 | 9 | 11 => {
                let right = grid::cell_position(index + 1, self.resolution, self.cell_size);
                let right_off = grid::neighbor_vec(self.offsets, index + 1);
                Some((right + Vec2::new(0.0, right_off.y), (1, 0)))
            }
            5 | 10 => None,
            // The caller only walks along the boundary; a full or empty cell
            // here means the step tables are inconsistent.
            _ => unreachable!("walk stepped off the boundary (configuration {config})"),
        }
    }

    fn step(&self, index: usize, (dx, dy): (i32, i32)) -> Option<usize> {
        let (x, y) = grid::cell_coords(index, self.resolution);
        let x = x as i32 + dx;
        let y = y as i32 + dy;
        if x < 0 || y < 0 || x >= self.resolution as i32 || y >= self.resolution as i32 {
            return None;
        }
        Some(grid::cell_index(x as usize, y as usize, self.resolution))
    }
}

/// Counter-clockwise step for the canonical-start backtrack, or `None` for
/// the ambiguous diagonal configurations.
fn backward_step(config: u8) -> Option<(i32, i32)> {
    match config {
        1 => Some((-1, 0)),
        2 => Some((0, 1)),
        4 => Some((1, 0)),
        8 => Some((0, -1)),
        3 => Some((0, 1)),
        6 => Some((1, 0)),
        12 => Some((0, -1)),
        9 => Some((-1, 0)),
        7 => Some((1, 0)),
        14 => Some((0, -1)),
        13 => Some((-1, 0)),
        11 => Some((0, 1)),
        5 | 10 => None,
        _ => unreachable!("backtrack stepped off the boundary (configuration {config})"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
