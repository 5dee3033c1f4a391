//! Shape-based edit requests applied to the field.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::fill::FillType;
use crate::rect::Rect;

/// Shape of a modification's footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierShape {
    /// Euclidean disc; `extent` is the radius.
    Circle,
    /// Axis-aligned box; `extent` is the half side length.
    Square,
}

/// Compositing rule deciding which existing cells a modification may touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    /// Overwrites unconditionally.
    Always,
    /// Only overwrites cells that already hold a material.
    Replace,
    /// Only fills empty cells.
    Fill,
}

impl BlendMode {
    /// Whether the fill pass may change a cell currently holding `current`.
    pub fn permits_fill(self, current: FillType) -> bool {
        match self {
            BlendMode::Always => true,
            BlendMode::Replace => current != FillType::None,
            BlendMode::Fill => current == FillType::None,
        }
    }

    /// Whether the offset pass may move the boundary on the edge between a
    /// cell holding `current` and its neighbor holding `other`.
    ///
    /// This table is intentionally asymmetric with [`permits_fill`]: offsets
    /// are re-derived from the settled fill types and gate on the edge's two
    /// sides rather than on the written cell alone.
    ///
    /// [`permits_fill`]: BlendMode::permits_fill
    pub fn permits_offset(self, current: FillType, other: FillType) -> bool {
        match self {
            BlendMode::Always => true,
            BlendMode::Replace => current != other && other != FillType::None,
            BlendMode::Fill => {
                current == other || other == FillType::None || current == FillType::None
            }
        }
    }
}

/// One queued edit: stamp `fill` over every cell inside the shape, subject
/// to the blend mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridModification {
    pub shape: ModifierShape,
    pub blend: BlendMode,
    pub fill: FillType,
    /// Shape center. World space when queued, chunk-local once clipped to a
    /// chunk.
    pub center: Vec2,
    /// Radius (circle) or half side length (square). Must be positive.
    pub extent: f32,
}

impl GridModification {
    /// Axis-aligned box covering the shape, used to find intersecting chunks.
    pub fn bounds(&self) -> Rect {
        Rect::from_center_half_extents(self.center, Vec2::splat(self.extent))
    }

    /// Returns `true` if the point lies inside the shape. Circle containment
    /// is strict (`< extent`), square containment is edge-inclusive, matching
    /// the fill pass rules.
    pub fn contains(&self, point: Vec2) -> bool {
        match self.shape {
            ModifierShape::Circle => self.center.distance(point) < self.extent,
            ModifierShape::Square => self.bounds().contains_point(point),
        }
    }

    /// The same modification expressed relative to `origin` (chunk-local
    /// coordinates).
    pub fn translated(&self, origin: Vec2) -> Self {
        Self {
            center: self.center - origin,
            ..*self
        }
    }
}
