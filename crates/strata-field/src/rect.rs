//! Axis-aligned 2D bounding box used for modification/chunk intersection
//! tests.

use glam::Vec2;

/// Axis-aligned bounding box in world space.
///
/// Invariant: `min.x <= max.x` and `min.y <= max.y`. The constructor enforces
/// this by sorting components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Creates a rect from two corners, sorting components so `min <= max`
    /// on both axes.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a rect from a center point and half-extents.
    pub fn from_center_half_extents(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns `true` if the point lies inside or on the boundary.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Returns `true` if this rect overlaps `other`, including touching edges.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Returns the size of the rect on both axes.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}
