//! Material identifiers stored in every grid cell.

use serde::{Deserialize, Serialize};

/// Material assigned to a grid cell. `None` is empty space; zero-initialized
/// buffers therefore represent an empty chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillType {
    /// Empty space.
    #[default]
    None,
    Rock,
    Soil,
    Sand,
    Clay,
}

impl FillType {
    /// All supported (non-`None`) materials, in contour-generation order.
    pub const MATERIALS: [FillType; 4] = [
        FillType::Rock,
        FillType::Soil,
        FillType::Sand,
        FillType::Clay,
    ];

    /// Dense index into per-material tables, or `None` for empty space.
    pub fn material_index(self) -> Option<usize> {
        match self {
            FillType::None => None,
            FillType::Rock => Some(0),
            FillType::Soil => Some(1),
            FillType::Sand => Some(2),
            FillType::Clay => Some(3),
        }
    }

    /// Returns `true` for any material other than `None`.
    pub fn is_solid(self) -> bool {
        self != FillType::None
    }
}
