//! Terrain configuration.

use serde::{Deserialize, Serialize};

use crate::worldgen::WorldGenSettings;

/// Static configuration shared by every chunk of a terrain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Owned cells per chunk side, excluding the duplicated border
    /// row/column shared with the neighbor.
    pub chunk_resolution: usize,
    /// World-space edge length of one cell.
    pub cell_size: f32,
    /// Largest interior boundary angle (degrees) still rendered as a crease;
    /// sharper corners get chamfered.
    pub max_sharp_angle_deg: f32,
    /// Height-line world generation seeding freshly loaded chunks, or `None`
    /// to start chunks empty.
    pub worldgen: Option<WorldGenSettings>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_resolution: 64,
            cell_size: 1.0,
            max_sharp_angle_deg: 135.0,
            worldgen: None,
        }
    }
}

impl TerrainConfig {
    /// Cells per side of a chunk's buffers, including the duplicated border.
    pub fn field_resolution(&self) -> usize {
        self.chunk_resolution + 1
    }

    /// World-space side length of one chunk.
    pub fn chunk_extent(&self) -> f32 {
        self.cell_size * self.chunk_resolution as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_resolution_includes_border() {
        let config = TerrainConfig {
            chunk_resolution: 8,
            ..TerrainConfig::default()
        };
        assert_eq!(config.field_resolution(), 9);
        assert_eq!(config.chunk_extent(), 8.0);
    }
}
