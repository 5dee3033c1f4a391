//! Fill type → physics material/layer lookup for collider consumers.

use serde::{Deserialize, Serialize};
use strata_field::FillType;

/// Friction/restitution pair assigned to a collider edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.4,
            restitution: 0.0,
        }
    }
}

/// Physics properties of one fill type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEntry {
    pub material: PhysicsMaterial,
    /// Collision layer the fill type's colliders are placed on.
    pub layer: u32,
}

/// Maps fill types to the physics properties of their boundary colliders.
///
/// Materials without an explicit entry fall back to [`SurfaceEntry::default`]
/// (default layer, default material) so a partially configured template still
/// produces working colliders.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SurfaceTemplate {
    entries: [Option<SurfaceEntry>; FillType::MATERIALS.len()],
}

impl SurfaceTemplate {
    /// Creates a template with no explicit entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry for a material.
    ///
    /// # Panics
    ///
    /// Panics if `fill` is [`FillType::None`]; empty space has no surface.
    pub fn set(&mut self, fill: FillType, entry: SurfaceEntry) {
        self.entries[Self::material_index(fill)] = Some(entry);
    }

    /// Entry for a material, falling back to defaults when unset.
    ///
    /// # Panics
    ///
    /// Panics if `fill` is [`FillType::None`]: looking up empty space is a
    /// contract violation in the caller, not a recoverable condition.
    pub fn entry(&self, fill: FillType) -> SurfaceEntry {
        self.entries[Self::material_index(fill)].unwrap_or_default()
    }

    fn material_index(fill: FillType) -> usize {
        fill.material_index()
            .unwrap_or_else(|| panic!("no surface properties exist for {fill:?}"))
    }
}
