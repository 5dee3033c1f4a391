//! Collider output of the boundary walker.

use glam::Vec2;
use strata_field::FillType;

/// One closed boundary polyline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutlineLoop {
    /// Material the loop encloses.
    pub fill: FillType,
    /// Number of vertices in the flattened buffer, including the repeated
    /// closing vertex.
    pub len: usize,
}

/// All boundary loops of one chunk, flattened into a shared vertex buffer.
///
/// A physics collaborator turns each loop into an edge collider, picking
/// material and layer from a [`SurfaceTemplate`](crate::SurfaceTemplate) by
/// the loop's fill type.
#[derive(Debug, Default)]
pub struct ChunkOutline {
    /// Loop vertices in chunk-local space, loops stored back to back.
    pub vertices: Vec<Vec2>,
    /// One entry per traced loop, in trace order.
    pub loops: Vec<OutlineLoop>,
}

impl ChunkOutline {
    /// Creates an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates the loops together with their vertex slices.
    pub fn iter(&self) -> impl Iterator<Item = (OutlineLoop, &[Vec2])> {
        let mut start = 0;
        self.loops.iter().map(move |&l| {
            let slice = &self.vertices[start..start + l.len];
            start += l.len;
            (l, slice)
        })
    }

    /// Number of traced loops.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Returns `true` when no boundary was found.
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn test_iter_slices_loops_back_to_back() {
        let outline = ChunkOutline {
            vertices: vec![
                vec2(0.0, 0.0),
                vec2(1.0, 0.0),
                vec2(0.0, 0.0),
                vec2(5.0, 5.0),
                vec2(6.0, 5.0),
                vec2(5.0, 5.0),
            ],
            loops: vec![
                OutlineLoop {
                    fill: FillType::Rock,
                    len: 3,
                },
                OutlineLoop {
                    fill: FillType::Soil,
                    len: 3,
                },
            ],
        };
        let collected: Vec<_> = outline.iter().collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].0.fill, FillType::Rock);
        assert_eq!(collected[0].1[0], vec2(0.0, 0.0));
        assert_eq!(collected[1].0.fill, FillType::Soil);
        assert_eq!(collected[1].1[1], vec2(6.0, 5.0));
    }
}
