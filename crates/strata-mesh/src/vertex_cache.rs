//! Rolling vertex index cache for the single-pass mesh scan.

/// Three-row cache of already-emitted vertex indices.
///
/// The scan runs left-to-right, bottom-to-top, so every vertex a cell shares
/// with an earlier cell was emitted either by the cell to its left or by the
/// row below. Keeping three rows of indices is enough for O(1) amortized
/// vertex reuse without a hash map:
///
/// ```text
/// * - * - *   next_row  (top corners and top-edge crossings)
/// * - - - *   mid_row   (left/right-edge crossings)
/// o - * - *   prev_row  (bottom corners and bottom-edge crossings)
/// ```
///
/// `prev_row` and `next_row` store two entries per cell column (the corner
/// and the crossing on the horizontal edge to its right), `mid_row` one entry
/// per column (the crossing on the cell's left vertical edge). At the end of
/// each row `next_row` becomes `prev_row`.
pub struct VertexCache {
    pub prev_row: Vec<u32>,
    pub mid_row: Vec<u32>,
    pub next_row: Vec<u32>,
}

impl VertexCache {
    /// Creates a cache sized for `resolution` cells per row.
    pub fn new(resolution: usize) -> Self {
        Self {
            prev_row: vec![0; resolution * 2],
            mid_row: vec![0; resolution],
            next_row: vec![0; resolution * 2],
        }
    }

    /// Columns the cache was sized for.
    pub fn resolution(&self) -> usize {
        self.mid_row.len()
    }

    /// Rolls the cache up one row: the finished row's top edge becomes the
    /// next row's bottom edge.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.prev_row, &mut self.next_row);
    }
}
