//! Single-pass marching-squares triangulation.
//!
//! For every supported material, each cell's 2×2 corner group is classified
//! into a 4-bit configuration; a fixed table of per-configuration emitters
//! turns the configuration into triangles, using the interpolated sub-cell
//! offset points instead of raw corner positions. The scan runs left-to-right
//! and bottom-to-top so emitted vertex indices can be shared with the cell to
//! the left and the row below through a [`VertexCache`].
//!
//! Configurations that collapse a boundary corner into one triangle (one and
//! three set corners) first test whether the two boundary edges meet at a
//! sharp angle; if so, an extra vertex at the analytic intersection of the
//! two edges is inserted, chamfering the corner instead of creasing it.

use glam::Vec2;

use strata_field::field::VoxelField;
use strata_field::fill::FillType;
use strata_field::grid;

use crate::mesh::{ContourMesh, SubmeshRange};
use crate::vertex_cache::VertexCache;

/// Builds [`ContourMesh`]es from voxel fields, reusing its vertex cache
/// across builds.
pub struct ContourMeshBuilder {
    sharpness_limit: f32,
    cache: VertexCache,
}

impl ContourMeshBuilder {
    /// Creates a builder for chunks of `resolution` cells per side.
    ///
    /// `max_interior_angle_deg` is the largest interior boundary angle that is
    /// still rendered as a crease; anything sharper gets chamfered.
    pub fn new(resolution: usize, max_interior_angle_deg: f32) -> Self {
        Self {
            sharpness_limit: max_interior_angle_deg.to_radians().cos(),
            cache: VertexCache::new(resolution),
        }
    }

    /// Triangulates the field into a fresh mesh.
    pub fn build(&mut self, field: &VoxelField) -> ContourMesh {
        let mut mesh = ContourMesh::new();
        self.build_into(field, &mut mesh);
        mesh
    }

    /// Triangulates the field into `mesh`, reusing its buffers.
    pub fn build_into(&mut self, field: &VoxelField, mesh: &mut ContourMesh) {
        mesh.clear();
        if self.cache.resolution() != field.resolution() {
            self.cache = VertexCache::new(field.resolution());
        }

        for &fill in &FillType::MATERIALS {
            let start = mesh.indices.len();
            let mut pass = Pass {
                fills: &field.fill_types,
                offsets: &field.offsets,
                normals_x: &field.normals_x,
                normals_y: &field.normals_y,
                resolution: field.resolution(),
                cell_size: field.cell_size(),
                sharpness_limit: self.sharpness_limit,
                fill,
                cache: &mut self.cache,
                mesh,
            };
            pass.run();
            mesh.submeshes.push(SubmeshRange {
                fill,
                start,
                index_count: mesh.indices.len() - start,
            });
        }
    }
}

/// Per-configuration triangle emitter.
type Emitter = fn(&mut Pass<'_>, usize);

/// Emitters indexed by the 4-bit corner configuration (bit 1 = cell corner,
/// 2 = top, 4 = top-right, 8 = right).
const EMITTERS: [Emitter; 16] = [
    emit_nothing,            // 0
    corner_bottom_left,      // 1
    corner_top_left,         // 2
    side_left,               // 3
    corner_top_right,        // 4
    diagonal_rising,         // 5
    side_top,                // 6
    all_but_bottom_right,    // 7
    corner_bottom_right,     // 8
    side_bottom,             // 9
    diagonal_falling,        // 10
    all_but_top_right,       // 11
    side_right,              // 12
    all_but_top_left,        // 13
    all_but_bottom_left,     // 14
    all_corners,             // 15
];

/// One material's scan over a chunk.
struct Pass<'a> {
    fills: &'a [FillType],
    offsets: &'a [Vec2],
    normals_x: &'a [Vec2],
    normals_y: &'a [Vec2],
    resolution: usize,
    cell_size: f32,
    sharpness_limit: f32,
    fill: FillType,
    cache: &'a mut VertexCache,
    mesh: &'a mut ContourMesh,
}

impl Pass<'_> {
    fn run(&mut self) {
        for index in 0..self.fills.len() {
            // The last cell of a row closes it: roll the cache up.
            if index % self.resolution == self.resolution - 1 {
                self.cache.swap();
                continue;
            }
            let config = grid::cell_config(self.fills, index, self.resolution, self.fill);
            EMITTERS[config as usize](self, index);
        }
    }

    fn position(&self, index: usize) -> Vec2 {
        grid::cell_position(index, self.resolution, self.cell_size)
    }

    fn offset(&self, index: usize) -> Vec2 {
        grid::neighbor_vec(self.offsets, index)
    }

    fn normal_x(&self, index: usize) -> Vec2 {
        grid::neighbor_vec(self.normals_x, index)
    }

    fn normal_y(&self, index: usize) -> Vec2 {
        grid::neighbor_vec(self.normals_y, index)
    }

    fn first_row(&self, index: usize) -> bool {
        index < self.resolution
    }

    fn first_column(&self, index: usize) -> bool {
        index % self.resolution == 0
    }

    /// Cache column for `prev_row`/`next_row` (two entries per cell).
    fn cache_index(&self, index: usize) -> usize {
        (index % self.resolution) * 2
    }

    /// Cache column for `mid_row` (one entry per cell).
    fn mid_index(&self, index: usize) -> usize {
        index % self.resolution
    }

    fn push(&mut self, position: Vec2) -> u32 {
        self.mesh.vertices.push(position);
        (self.mesh.vertices.len() - 1) as u32
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.mesh.indices.extend([a, b, c]);
    }

    fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.triangle(a, b, c);
        self.triangle(a, c, d);
    }

    fn pentagon(&mut self, a: u32, b: u32, c: u32, d: u32, e: u32) {
        self.triangle(a, b, c);
        self.triangle(a, c, d);
        self.triangle(a, d, e);
    }

    fn hexagon(&mut self, a: u32, b: u32, c: u32, d: u32, e: u32, f: u32) {
        self.triangle(a, b, c);
        self.triangle(a, c, d);
        self.triangle(a, d, e);
        self.triangle(a, e, f);
    }

    /// Chamfer vertex for two boundary edges given as cell-local point plus
    /// normal, or `None` when the corner is not sharp or the edges are too
    /// close to parallel for a stable intersection.
    fn chamfer(&self, point_a: Vec2, normal_a: Vec2, point_b: Vec2, normal_b: Vec2) -> Option<Vec2> {
        if normal_a == Vec2::ZERO || normal_b == Vec2::ZERO {
            return None;
        }
        let dot = normal_a.dot(-normal_b);
        if dot < self.sharpness_limit || dot >= 0.9999 {
            return None;
        }
        line_intersection(point_a, normal_a, point_b, normal_b)
    }
}

/// Intersection of two lines each given as a point and a normal. Returns
/// `None` when the lines are near parallel, so a degenerate configuration
/// never produces a non-finite vertex.
fn line_intersection(point_a: Vec2, normal_a: Vec2, point_b: Vec2, normal_b: Vec2) -> Option<Vec2> {
    let along_b = Vec2::new(normal_b.y, -normal_b.x);
    let denominator = normal_a.dot(along_b);
    if denominator.abs() < 1e-6 {
        return None;
    }
    let t = normal_a.dot(point_a - point_b) / denominator;
    Some(point_b + along_b * t)
}

fn emit_nothing(_pass: &mut Pass<'_>, _index: usize) {}

fn corner_bottom_left(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let off = p.offset(index);

    if p.first_row(index) && p.first_column(index) {
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
    }
    if p.first_column(index) {
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }
    if p.first_row(index) {
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
    }

    let corner = p.cache.prev_row[ci];
    let left = p.cache.mid_row[mi];
    let bottom = p.cache.prev_row[ci + 1];
    let chamfer = p.chamfer(
        Vec2::new(off.x, 0.0),
        p.normal_x(index),
        Vec2::new(0.0, off.y),
        p.normal_y(index),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.quad(corner, left, v, bottom);
        }
        None => p.triangle(corner, left, bottom),
    }
}

fn corner_top_left(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let off = p.offset(index);
    let top_off = p.offset(index + p.resolution);

    let v = p.push(top);
    p.cache.next_row[ci] = v;
    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;
    if p.first_column(index) {
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }

    let top_corner = p.cache.next_row[ci];
    let top_edge = p.cache.next_row[ci + 1];
    let left = p.cache.mid_row[mi];
    let chamfer = p.chamfer(
        Vec2::new(top_off.x, p.cell_size),
        p.normal_x(index + p.resolution),
        Vec2::new(0.0, off.y),
        p.normal_y(index),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.quad(top_corner, top_edge, v, left);
        }
        None => p.triangle(top_corner, top_edge, left),
    }
}

fn corner_top_right(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);
    let top_off = p.offset(index + p.resolution);
    let right_off = p.offset(index + 1);

    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;
    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;

    let corner = p.cache.next_row[ci + 2];
    let right_edge = p.cache.mid_row[mi + 1];
    let top_edge = p.cache.next_row[ci + 1];
    let chamfer = p.chamfer(
        Vec2::new(top_off.x, p.cell_size),
        p.normal_x(index + p.resolution),
        Vec2::new(p.cell_size, right_off.y),
        p.normal_y(index + 1),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.quad(corner, right_edge, v, top_edge);
        }
        None => p.triangle(corner, right_edge, top_edge),
    }
}

fn corner_bottom_right(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let right_off = p.offset(index + 1);

    if p.first_row(index) {
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
    }
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;

    let corner = p.cache.prev_row[ci + 2];
    let bottom = p.cache.prev_row[ci + 1];
    let right_edge = p.cache.mid_row[mi + 1];
    let chamfer = p.chamfer(
        Vec2::new(off.x, 0.0),
        p.normal_x(index),
        Vec2::new(p.cell_size, right_off.y),
        p.normal_y(index + 1),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.quad(corner, bottom, v, right_edge);
        }
        None => p.triangle(corner, bottom, right_edge),
    }
}

fn side_left(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let off = p.offset(index);
    let top_off = p.offset(index + p.resolution);

    if p.first_row(index) {
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
    }
    let v = p.push(top);
    p.cache.next_row[ci] = v;
    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;

    p.quad(
        p.cache.prev_row[ci],
        p.cache.next_row[ci],
        p.cache.next_row[ci + 1],
        p.cache.prev_row[ci + 1],
    );
}

fn side_top(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let right_off = p.offset(index + 1);

    let v = p.push(top);
    p.cache.next_row[ci] = v;
    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;
    if p.first_column(index) {
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }

    p.quad(
        p.cache.next_row[ci],
        p.cache.next_row[ci + 2],
        p.cache.mid_row[mi + 1],
        p.cache.mid_row[mi],
    );
}

fn side_right(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let top_off = p.offset(index + p.resolution);

    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;
    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;
    if p.first_row(index) {
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
    }

    p.quad(
        p.cache.next_row[ci + 1],
        p.cache.next_row[ci + 2],
        p.cache.prev_row[ci + 2],
        p.cache.prev_row[ci + 1],
    );
}

fn side_bottom(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let right_off = p.offset(index + 1);

    if p.first_row(index) {
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
    }
    if p.first_column(index) {
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;

    p.quad(
        p.cache.prev_row[ci + 2],
        p.cache.prev_row[ci],
        p.cache.mid_row[mi],
        p.cache.mid_row[mi + 1],
    );
}

/// Material in the bottom-left and top-right corners: two disconnected
/// triangles across the diagonal.
fn diagonal_rising(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let top_off = p.offset(index + p.resolution);
    let right_off = p.offset(index + 1);

    if p.first_row(index) {
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
    }
    if p.first_column(index) {
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }
    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;
    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;

    p.triangle(
        p.cache.prev_row[ci],
        p.cache.mid_row[mi],
        p.cache.prev_row[ci + 1],
    );
    p.triangle(
        p.cache.next_row[ci + 2],
        p.cache.mid_row[mi + 1],
        p.cache.next_row[ci + 1],
    );
}

/// Material in the top-left and bottom-right corners.
fn diagonal_falling(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let top_off = p.offset(index + p.resolution);
    let right_off = p.offset(index + 1);

    let v = p.push(top);
    p.cache.next_row[ci] = v;
    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;
    if p.first_column(index) {
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }
    if p.first_row(index) {
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
    }
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;

    p.triangle(
        p.cache.next_row[ci],
        p.cache.next_row[ci + 1],
        p.cache.mid_row[mi],
    );
    p.triangle(
        p.cache.prev_row[ci + 2],
        p.cache.prev_row[ci + 1],
        p.cache.mid_row[mi + 1],
    );
}

fn all_but_bottom_right(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let right_off = p.offset(index + 1);

    let v = p.push(top);
    p.cache.next_row[ci] = v;
    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;
    if p.first_row(index) {
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
    }

    let chamfer = p.chamfer(
        Vec2::new(off.x, 0.0),
        p.normal_x(index),
        Vec2::new(p.cell_size, right_off.y),
        p.normal_y(index + 1),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.hexagon(
                p.cache.next_row[ci],
                p.cache.next_row[ci + 2],
                p.cache.mid_row[mi + 1],
                v,
                p.cache.prev_row[ci + 1],
                p.cache.prev_row[ci],
            );
        }
        None => p.pentagon(
            p.cache.next_row[ci],
            p.cache.next_row[ci + 2],
            p.cache.mid_row[mi + 1],
            p.cache.prev_row[ci + 1],
            p.cache.prev_row[ci],
        ),
    }
}

fn all_but_bottom_left(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);
    let off = p.offset(index);

    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;
    if p.first_row(index) {
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
        let v = p.push(cur + Vec2::new(off.x, 0.0));
        p.cache.prev_row[ci + 1] = v;
    }
    if p.first_column(index) {
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }
    let v = p.push(top);
    p.cache.next_row[ci] = v;

    let chamfer = p.chamfer(
        Vec2::new(off.x, 0.0),
        p.normal_x(index),
        Vec2::new(0.0, off.y),
        p.normal_y(index),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.hexagon(
                p.cache.next_row[ci + 2],
                p.cache.prev_row[ci + 2],
                p.cache.prev_row[ci + 1],
                v,
                p.cache.mid_row[mi],
                p.cache.next_row[ci],
            );
        }
        None => p.pentagon(
            p.cache.next_row[ci + 2],
            p.cache.prev_row[ci + 2],
            p.cache.prev_row[ci + 1],
            p.cache.mid_row[mi],
            p.cache.next_row[ci],
        ),
    }
}

fn all_but_top_left(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);
    let off = p.offset(index);
    let top_off = p.offset(index + p.resolution);

    if p.first_row(index) {
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
    }
    if p.first_column(index) {
        let v = p.push(cur + Vec2::new(0.0, off.y));
        p.cache.mid_row[mi] = v;
    }
    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;
    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;

    let chamfer = p.chamfer(
        Vec2::new(0.0, off.y),
        p.normal_y(index),
        Vec2::new(top_off.x, p.cell_size),
        p.normal_x(index + p.resolution),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.hexagon(
                p.cache.prev_row[ci + 2],
                p.cache.prev_row[ci],
                p.cache.mid_row[mi],
                v,
                p.cache.next_row[ci + 1],
                p.cache.next_row[ci + 2],
            );
        }
        None => p.pentagon(
            p.cache.prev_row[ci + 2],
            p.cache.prev_row[ci],
            p.cache.mid_row[mi],
            p.cache.next_row[ci + 1],
            p.cache.next_row[ci + 2],
        ),
    }
}

fn all_but_top_right(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let mi = p.mid_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let right = p.position(index + 1);
    let top_off = p.offset(index + p.resolution);
    let right_off = p.offset(index + 1);

    if p.first_row(index) {
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
    }
    let v = p.push(top);
    p.cache.next_row[ci] = v;
    let v = p.push(top + Vec2::new(top_off.x, 0.0));
    p.cache.next_row[ci + 1] = v;
    let v = p.push(right + Vec2::new(0.0, right_off.y));
    p.cache.mid_row[mi + 1] = v;

    let chamfer = p.chamfer(
        Vec2::new(top_off.x, p.cell_size),
        p.normal_x(index + p.resolution),
        Vec2::new(p.cell_size, right_off.y),
        p.normal_y(index + 1),
    );
    match chamfer {
        Some(extra) => {
            let v = p.push(cur + extra);
            p.hexagon(
                p.cache.prev_row[ci],
                p.cache.next_row[ci],
                p.cache.next_row[ci + 1],
                v,
                p.cache.mid_row[mi + 1],
                p.cache.prev_row[ci + 2],
            );
        }
        None => p.pentagon(
            p.cache.prev_row[ci],
            p.cache.next_row[ci],
            p.cache.next_row[ci + 1],
            p.cache.mid_row[mi + 1],
            p.cache.prev_row[ci + 2],
        ),
    }
}

fn all_corners(p: &mut Pass<'_>, index: usize) {
    let ci = p.cache_index(index);
    let cur = p.position(index);
    let top = p.position(index + p.resolution);
    let top_right = p.position(index + p.resolution + 1);
    let right = p.position(index + 1);

    if p.first_column(index) {
        let v = p.push(cur);
        p.cache.prev_row[ci] = v;
    }
    let v = p.push(top);
    p.cache.next_row[ci] = v;
    let v = p.push(top_right);
    p.cache.next_row[ci + 2] = v;
    if p.first_row(index) {
        let v = p.push(right);
        p.cache.prev_row[ci + 2] = v;
    }

    p.quad(
        p.cache.prev_row[ci],
        p.cache.next_row[ci],
        p.cache.next_row[ci + 2],
        p.cache.prev_row[ci + 2],
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
