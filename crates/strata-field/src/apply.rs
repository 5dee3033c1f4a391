//! Modification apply engine.
//!
//! Two per-cell passes fold a chunk's pending modification list into its
//! buffers, in submission order:
//!
//! 1. The fill pass rewrites `fill_types`; the last qualifying modifier wins.
//! 2. The offset pass re-derives sub-cell boundary offsets and normals from
//!    the *updated* fill types, intersecting each modifier's shape edge with
//!    the cell's right and top edge segments analytically.
//!
//! Both passes are embarrassingly parallel: the buffers are partitioned into
//! fixed-size batches processed on scoped threads with no cross-batch
//! communication. The fill pass only writes `fill_types[index]`; the offset
//! pass reads the whole fill buffer but writes only its own cell's offset
//! and normals.
//!
//! Fills fold modifiers against the evolving fill type while offsets gate on
//! the settled fills, so overlapping modifiers can leave an offset that
//! disagrees with the winning fill. This mirrors the long-standing behavior
//! of the apply pipeline; applying the same list a second time settles.

use glam::Vec2;
use tracing::trace;

use crate::field::VoxelField;
use crate::fill::FillType;
use crate::grid;
use crate::modification::{GridModification, ModifierShape};

/// Cells per parallel batch. Batches never exchange data.
pub const BATCH_SIZE: usize = 64;

/// Applies and clears the field's pending modification list.
pub fn apply_pending(field: &mut VoxelField) {
    let modifiers = field.take_modifiers();
    if modifiers.is_empty() {
        return;
    }
    trace!(count = modifiers.len(), "applying pending modifications");
    apply_fill_pass(field, &modifiers);
    apply_offset_pass(field, &modifiers);
}

/// Rewrites every cell's fill type from the modifier list.
///
/// A modifier changes a cell only if its target fill differs from the cell's
/// current fill, the blend mode permits writing over the current fill, and
/// the cell's corner position lies inside the shape.
pub fn apply_fill_pass(field: &mut VoxelField, modifiers: &[GridModification]) {
    let resolution = field.resolution();
    let cell_size = field.cell_size();
    let slice_len = batch_slice_len(field.cell_count());

    std::thread::scope(|scope| {
        for (slice, fills) in field.fill_types.chunks_mut(slice_len).enumerate() {
            let base = slice * slice_len;
            scope.spawn(move || {
                for (i, fill) in fills.iter_mut().enumerate() {
                    *fill = fold_fill(base + i, *fill, modifiers, resolution, cell_size);
                }
            });
        }
    });
}

/// Recomputes every cell's edge offsets and boundary normals from the
/// updated fill types.
pub fn apply_offset_pass(field: &mut VoxelField, modifiers: &[GridModification]) {
    let resolution = field.resolution();
    let cell_size = field.cell_size();
    let slice_len = batch_slice_len(field.cell_count());
    let fills: &[FillType] = &field.fill_types;

    std::thread::scope(|scope| {
        let offsets = field.offsets.chunks_mut(slice_len);
        let normals_x = field.normals_x.chunks_mut(slice_len);
        let normals_y = field.normals_y.chunks_mut(slice_len);
        for (slice, ((offsets, normals_x), normals_y)) in
            offsets.zip(normals_x).zip(normals_y).enumerate()
        {
            let base = slice * slice_len;
            scope.spawn(move || {
                for i in 0..offsets.len() {
                    let edges = recompute_cell(
                        base + i,
                        fills,
                        modifiers,
                        resolution,
                        cell_size,
                        CellEdges {
                            offset: offsets[i],
                            normal_x: normals_x[i],
                            normal_y: normals_y[i],
                        },
                    );
                    offsets[i] = edges.offset;
                    normals_x[i] = edges.normal_x;
                    normals_y[i] = edges.normal_y;
                }
            });
        }
    });
}

/// Batch slice length: whole batches, spread over the available cores.
fn batch_slice_len(total: usize) -> usize {
    let workers = num_cpus::get().max(1);
    let batches = total.div_ceil(BATCH_SIZE).max(1);
    batches.div_ceil(workers) * BATCH_SIZE
}

fn fold_fill(
    index: usize,
    current: FillType,
    modifiers: &[GridModification],
    resolution: usize,
    cell_size: f32,
) -> FillType {
    let position = grid::cell_position(index, resolution, cell_size);
    let mut fill = current;
    for modifier in modifiers {
        if modifier.fill == fill || !modifier.blend.permits_fill(fill) {
            continue;
        }
        if modifier.contains(position) {
            fill = modifier.fill;
        }
    }
    fill
}

/// The mutable per-cell outputs of the offset pass.
#[derive(Clone, Copy)]
struct CellEdges {
    offset: Vec2,
    normal_x: Vec2,
    normal_y: Vec2,
}

impl CellEdges {
    const ZERO: Self = Self {
        offset: Vec2::ZERO,
        normal_x: Vec2::ZERO,
        normal_y: Vec2::ZERO,
    };
}

fn recompute_cell(
    index: usize,
    fills: &[FillType],
    modifiers: &[GridModification],
    resolution: usize,
    cell_size: f32,
    mut edges: CellEdges,
) -> CellEdges {
    let current = fills[index];
    let top = grid::neighbor_fill(fills, index + resolution);
    let right = grid::neighbor_fill(fills, index + 1);

    // No boundary crosses either edge.
    if current == top && current == right {
        return CellEdges::ZERO;
    }

    for modifier in modifiers {
        match modifier.shape {
            ModifierShape::Circle => {
                circle_edges(index, fills, modifier, resolution, cell_size, &mut edges);
            }
            ModifierShape::Square => {
                square_edges(index, fills, modifier, resolution, cell_size, &mut edges);
            }
        }
    }

    // The duplicated border row/column always stays at zero so the seam with
    // the neighboring chunk is continuous.
    let (x, y) = grid::cell_coords(index, resolution);
    if x == resolution - 1 {
        edges.offset.x = 0.0;
    }
    if y == resolution - 1 {
        edges.offset.y = 0.0;
    }
    edges
}

fn circle_edges(
    index: usize,
    fills: &[FillType],
    modifier: &GridModification,
    resolution: usize,
    cell_size: f32,
    edges: &mut CellEdges,
) {
    let position = grid::cell_position(index, resolution, cell_size);
    let top_position = grid::cell_position(index + resolution, resolution, cell_size);
    let right_position = grid::cell_position(index + 1, resolution, cell_size);

    let difference = position - modifier.center;
    let within = difference.length() <= modifier.extent;
    let top_within = top_position.distance(modifier.center) <= modifier.extent;
    let right_within = right_position.distance(modifier.center) <= modifier.extent;

    let current = fills[index];
    let top = grid::neighbor_fill(fills, index + resolution);
    let right = grid::neighbor_fill(fills, index + 1);

    // Chord half-lengths of the circle against the cell's column and row.
    // A negative radicand means the circle misses the line entirely; clamp
    // instead of letting a NaN escape into the buffers.
    let radius_sq = modifier.extent * modifier.extent;
    let intersect_x = (radius_sq - difference.y * difference.y).max(0.0).sqrt();
    let intersect_y = (radius_sq - difference.x * difference.x).max(0.0).sqrt();

    let can_modify_y = modifier.blend.permits_offset(current, top);
    let can_modify_x = modifier.blend.permits_offset(current, right);

    if top == current {
        edges.offset.y = 0.0;
        edges.normal_y = Vec2::ZERO;
    } else if can_modify_y && within && !top_within {
        // Growing upward into the circle: keep the largest coverage.
        let new_offset = (intersect_y - difference.y).clamp(0.0, cell_size);
        if new_offset > edges.offset.y {
            edges.offset.y = new_offset;
            edges.normal_y =
                (position + Vec2::new(0.0, edges.offset.y) - modifier.center).normalize_or_zero();
        }
    } else if can_modify_y && !within && top_within {
        // Shrinking away from the circle: keep the smallest coverage.
        let new_offset = (-(intersect_y + difference.y)).clamp(0.0, cell_size);
        if edges.offset.y == 0.0 || edges.offset.y > new_offset {
            edges.offset.y = new_offset;
            edges.normal_y =
                (position + Vec2::new(0.0, edges.offset.y) - modifier.center).normalize_or_zero();
        }
    }

    if right == current {
        edges.offset.x = 0.0;
        edges.normal_x = Vec2::ZERO;
    } else if can_modify_x && within && !right_within {
        let new_offset = (intersect_x - difference.x).clamp(0.0, cell_size);
        if new_offset > edges.offset.x {
            edges.offset.x = new_offset;
            edges.normal_x =
                (position + Vec2::new(edges.offset.x, 0.0) - modifier.center).normalize_or_zero();
        }
    } else if can_modify_x && !within && right_within {
        let new_offset = (-(intersect_x + difference.x)).clamp(0.0, cell_size);
        if edges.offset.x == 0.0 || edges.offset.x > new_offset {
            edges.offset.x = new_offset;
            edges.normal_x =
                (position + Vec2::new(edges.offset.x, 0.0) - modifier.center).normalize_or_zero();
        }
    }
}

fn square_edges(
    index: usize,
    fills: &[FillType],
    modifier: &GridModification,
    resolution: usize,
    cell_size: f32,
    edges: &mut CellEdges,
) {
    let min = modifier.center - Vec2::splat(modifier.extent);
    let max = modifier.center + Vec2::splat(modifier.extent);

    let position = grid::cell_position(index, resolution, cell_size);
    let current = fills[index];

    let within_height = position.y >= min.y && position.y <= max.y;
    let within_length = position.x >= min.x && position.x <= max.x;

    // Right edge (x axis): only cells in the box's vertical span can cross.
    if within_height {
        let right = grid::neighbor_fill(fills, index + 1);
        let right_position = grid::cell_position(index + 1, resolution, cell_size);
        let right_within = right_position.x >= min.x && right_position.x <= max.x;
        let can_modify_x = modifier.blend.permits_offset(current, right);

        if current == right {
            edges.offset.x = 0.0;
            edges.normal_x = Vec2::ZERO;
        } else if can_modify_x && within_length && !right_within {
            let new_offset = (max.x - position.x).clamp(0.0, cell_size);
            if new_offset > edges.offset.x {
                edges.offset.x = new_offset;
                edges.normal_x = Vec2::X;
            }
        } else if can_modify_x && !within_length && right_within {
            let new_offset = (min.x - position.x).clamp(0.0, cell_size);
            if edges.offset.x == 0.0 || edges.offset.x > new_offset {
                edges.offset.x = new_offset;
                edges.normal_x = -Vec2::X;
            }
        }
    }

    // Top edge (y axis).
    if within_length {
        let top = grid::neighbor_fill(fills, index + resolution);
        let top_position = grid::cell_position(index + resolution, resolution, cell_size);
        let top_within = top_position.y >= min.y && top_position.y <= max.y;
        let can_modify_y = modifier.blend.permits_offset(current, top);

        if current == top {
            edges.offset.y = 0.0;
            edges.normal_y = Vec2::ZERO;
        } else if can_modify_y && within_height && !top_within {
            let new_offset = (max.y - position.y).clamp(0.0, cell_size);
            if new_offset > edges.offset.y {
                edges.offset.y = new_offset;
                edges.normal_y = Vec2::Y;
            }
        } else if can_modify_y && !within_height && top_within {
            let new_offset = (min.y - position.y).clamp(0.0, cell_size);
            if edges.offset.y == 0.0 || edges.offset.y > new_offset {
                edges.offset.y = new_offset;
                edges.normal_y = -Vec2::Y;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modification::BlendMode;
    use glam::vec2;

    fn circle(blend: BlendMode, fill: FillType, center: Vec2, extent: f32) -> GridModification {
        GridModification {
            shape: ModifierShape::Circle,
            blend,
            fill,
            center,
            extent,
        }
    }

    fn square(blend: BlendMode, fill: FillType, center: Vec2, extent: f32) -> GridModification {
        GridModification {
            shape: ModifierShape::Square,
            blend,
            fill,
            center,
            extent,
        }
    }

    fn apply(field: &mut VoxelField, modifiers: &[GridModification]) {
        apply_fill_pass(field, modifiers);
        apply_offset_pass(field, modifiers);
    }

    #[test]
    fn test_circle_fill_forms_connected_disc() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 5);
        apply(
            &mut field,
            &[circle(BlendMode::Always, FillType::Rock, vec2(2.0, 2.0), 1.5)],
        );

        let filled: Vec<usize> = (0..field.cell_count())
            .filter(|&i| field.fill_types[i] == FillType::Rock)
            .collect();
        assert!(!filled.is_empty());
        for &i in &filled {
            let p = field.cell_position(i);
            assert!(p.distance(vec2(2.0, 2.0)) < 1.5, "cell at {p:?}");
        }
        // Connectivity: every filled cell has a filled 4-neighbor.
        for &i in &filled {
            let (x, y) = grid::cell_coords(i, 5);
            let has_neighbor = filled.iter().any(|&j| {
                let (nx, ny) = grid::cell_coords(j, 5);
                nx.abs_diff(x) + ny.abs_diff(y) == 1
            });
            assert!(has_neighbor, "isolated cell at ({x}, {y})");
        }
    }

    #[test]
    fn test_same_fill_neighbors_zero_offsets_and_normals() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 6);
        apply(
            &mut field,
            &[circle(BlendMode::Always, FillType::Rock, vec2(2.5, 2.5), 2.0)],
        );

        let resolution = field.resolution();
        for index in 0..field.cell_count() {
            let current = field.fill_types[index];
            let top = grid::neighbor_fill(&field.fill_types, index + resolution);
            let right = grid::neighbor_fill(&field.fill_types, index + 1);
            if current == top && current == right {
                assert_eq!(field.offsets[index], Vec2::ZERO, "cell {index}");
                assert_eq!(field.normals_x[index], Vec2::ZERO, "cell {index}");
                assert_eq!(field.normals_y[index], Vec2::ZERO, "cell {index}");
            }
        }
    }

    #[test]
    fn test_offsets_stay_within_cell_size() {
        let mut field = VoxelField::new(Vec2::ZERO, 0.5, 8);
        apply(
            &mut field,
            &[
                circle(BlendMode::Always, FillType::Rock, vec2(1.7, 1.3), 1.2),
                square(BlendMode::Always, FillType::Soil, vec2(2.4, 2.4), 0.9),
            ],
        );
        for (index, offset) in field.offsets.iter().enumerate() {
            assert!(
                (0.0..=0.5).contains(&offset.x) && (0.0..=0.5).contains(&offset.y),
                "offset out of range at cell {index}: {offset:?}"
            );
        }
    }

    #[test]
    fn test_duplicated_border_offsets_forced_to_zero() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 5);
        // A circle hanging over the right/top border of the chunk.
        apply(
            &mut field,
            &[circle(BlendMode::Always, FillType::Rock, vec2(4.0, 4.0), 1.4)],
        );
        for index in 0..field.cell_count() {
            let (x, y) = grid::cell_coords(index, 5);
            if x == 4 {
                assert_eq!(field.offsets[index].x, 0.0, "cell ({x}, {y})");
            }
            if y == 4 {
                assert_eq!(field.offsets[index].y, 0.0, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_apply_is_idempotent_once_settled() {
        let mods = [
            circle(BlendMode::Always, FillType::Rock, vec2(2.0, 2.0), 1.5),
            square(BlendMode::Replace, FillType::Soil, vec2(2.5, 2.5), 1.0),
        ];
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 6);
        apply(&mut field, &mods);
        let fills_once = field.fill_types.clone();
        let offsets_once = field.offsets.clone();

        apply(&mut field, &mods);
        assert_eq!(field.fill_types, fills_once);
        assert_eq!(field.offsets, offsets_once);
    }

    #[test]
    fn test_fill_then_replace_scenario() {
        // Two Fill-mode modifiers over empty space, then one Replace of a
        // different type: the final fill equals the Replace type strictly
        // within its own shape and is untouched elsewhere.
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 7);
        let fill_a = circle(BlendMode::Fill, FillType::Rock, vec2(2.0, 3.0), 1.6);
        let fill_b = circle(BlendMode::Fill, FillType::Rock, vec2(4.0, 3.0), 1.6);
        let replace = square(BlendMode::Replace, FillType::Soil, vec2(3.0, 3.0), 1.0);
        apply(&mut field, &[fill_a, fill_b, replace]);

        for index in 0..field.cell_count() {
            let p = field.cell_position(index);
            let inside_replace = replace.contains(p);
            let inside_fill = fill_a.contains(p) || fill_b.contains(p);
            let expected = if inside_replace && inside_fill {
                FillType::Soil
            } else if inside_fill {
                FillType::Rock
            } else {
                FillType::None
            };
            assert_eq!(field.fill_types[index], expected, "cell at {p:?}");
        }
    }

    #[test]
    fn test_fill_mode_does_not_overwrite_existing_material() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 5);
        apply(
            &mut field,
            &[square(BlendMode::Always, FillType::Rock, vec2(1.0, 1.0), 1.0)],
        );
        apply(
            &mut field,
            &[square(BlendMode::Fill, FillType::Soil, vec2(1.0, 1.0), 2.0)],
        );
        // Cells that were rock stay rock; only empty cells gained soil.
        let rock_center = grid::cell_index(1, 1, 5);
        assert_eq!(field.fill_types[rock_center], FillType::Rock);
        let outside = grid::cell_index(3, 1, 5);
        assert_eq!(field.fill_types[outside], FillType::Soil);
    }

    #[test]
    fn test_coincident_modifier_centers_keep_offsets_finite() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 6);
        let center = vec2(2.0, 2.0);
        apply(
            &mut field,
            &[
                circle(BlendMode::Always, FillType::Rock, center, 1.5),
                circle(BlendMode::Always, FillType::None, center, 1.5),
                circle(BlendMode::Always, FillType::Soil, center, 1.5),
            ],
        );
        for (index, offset) in field.offsets.iter().enumerate() {
            assert!(offset.is_finite(), "non-finite offset at cell {index}");
        }
        for normal in field.normals_x.iter().chain(field.normals_y.iter()) {
            assert!(normal.is_finite());
        }
    }

    #[test]
    fn test_circle_offset_is_exact_chord_intersection() {
        // Circle centered on a cell corner: the crossing on the right edge of
        // the cell one step left sits exactly at radius - 1 from that corner.
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 8);
        apply(
            &mut field,
            &[circle(BlendMode::Always, FillType::Rock, vec2(3.0, 3.0), 1.5)],
        );
        // Cell (4, 3) is inside (distance 1.0 < 1.5), right neighbor (5, 3)
        // is outside: crossing at x = 3 + 1.5, so offset.x = 0.5.
        let index = grid::cell_index(4, 3, 8);
        assert!((field.offsets[index].x - 0.5).abs() < 1e-5);
        // The normal points radially outward (+X here).
        assert!((field.normals_x[index] - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_square_offset_clamps_to_box_edge() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 8);
        apply(
            &mut field,
            &[square(BlendMode::Always, FillType::Rock, vec2(2.0, 2.0), 1.25)],
        );
        // Cell (3, 2) is inside (x = 3 <= 3.25), right neighbor is outside:
        // crossing at the box edge x = 3.25, offset 0.25 with an axis normal.
        let index = grid::cell_index(3, 2, 8);
        assert!((field.offsets[index].x - 0.25).abs() < 1e-5);
        assert_eq!(field.normals_x[index], Vec2::X);
    }

    #[test]
    fn test_apply_pending_drains_modifier_list() {
        let mut field = VoxelField::new(Vec2::ZERO, 1.0, 5);
        field.push_modifier(circle(BlendMode::Always, FillType::Rock, vec2(2.0, 2.0), 1.5));
        apply_pending(&mut field);
        assert!(field.modifiers().is_empty());
        assert!(field.fill_types.contains(&FillType::Rock));
    }
}
