//! Layered Perlin height-line world generation.

use glam::vec2;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use tracing::trace;

use strata_field::{FillType, VoxelField};
use strata_tasks::{TaskHandle, TaskPool};

use crate::producer::{ChunkProducer, ProducerId, ProducerLifecycle, SharedField};

/// Parameters of the generated height line.
///
/// The surface height at a world `x` is a primary Perlin octave scaled to
/// `height_scale`, plus a secondary octave whose amplitude is modulated by a
/// low-frequency roughness octave. Identical settings always generate
/// identical chunks.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WorldGenSettings {
    pub seed: u32,
    /// Material assigned to cells below the height line.
    pub fill: FillType,
    /// Base world height the noise octaves are stacked on.
    pub height_offset: f32,
    pub noise_frequency: f32,
    pub height_scale: f32,
    pub roughness_frequency: f32,
    pub roughness_height_scale: f32,
    /// Frequency multiplier of the secondary octave relative to the primary.
    pub max_roughness_modifier: f32,
}

impl Default for WorldGenSettings {
    fn default() -> Self {
        Self {
            seed: 1337,
            fill: FillType::Rock,
            height_offset: -5.0,
            noise_frequency: 5.0,
            height_scale: 10.0,
            roughness_frequency: 1.0,
            roughness_height_scale: 5.0,
            max_roughness_modifier: 2.0,
        }
    }
}

/// Fills a chunk's buffers from the height line.
///
/// Cells below the surface get the configured fill; the cell row the line
/// crosses gets the exact `offset.y` and the slope normal, and a slope sign
/// change inside a cell produces an `offset.x` crossing. Offsets outside
/// `(0, cell_size)` and degenerate slopes are dropped rather than written.
pub fn generate(field: &mut VoxelField, settings: &WorldGenSettings) {
    let perlin = Perlin::new(settings.seed);
    let heights = HeightLine {
        perlin,
        offset: noise_offset(settings.seed),
        settings: *settings,
    };
    let origin = field.origin();
    let cell_size = field.cell_size();
    trace!(?origin, seed = settings.seed, "generating chunk heights");

    for index in 0..field.cell_count() {
        let position = origin + field.cell_position(index);
        let height = heights.at(position.x);
        let next_height = heights.at(position.x + cell_size);
        let slope_normal = vec2(height - next_height, cell_size).normalize_or_zero();

        let y_offset = height - position.y;
        field.fill_types[index] = if y_offset < 0.0 {
            FillType::None
        } else {
            settings.fill
        };

        let mut offset = field.offsets[index];
        if y_offset > 0.0 && y_offset < cell_size {
            offset.y = y_offset;
            field.normals_y[index] = slope_normal;
        }

        if sign(y_offset) != sign(next_height - position.y) {
            // The surface crosses the cell's bottom edge between this column
            // and the next.
            let adjacent = vec2(0.0, -y_offset).normalize_or_zero();
            let oblique = vec2(cell_size, next_height - height).normalize_or_zero();
            let angle = oblique.dot(adjacent).clamp(-1.0, 1.0).acos();
            let x_offset = (angle.tan() * -y_offset).abs();
            if x_offset > 0.0 && x_offset < cell_size && x_offset.is_finite() {
                offset.x = x_offset;
                field.normals_x[index] = slope_normal;
            }
        }
        field.offsets[index] = offset;
    }
}

struct HeightLine {
    perlin: Perlin,
    offset: f32,
    settings: WorldGenSettings,
}

impl HeightLine {
    fn at(&self, x: f32) -> f32 {
        let s = &self.settings;
        let primary_offset = (x + self.offset) * s.noise_frequency;
        let primary = self.perlin_01(primary_offset, -primary_offset) * s.height_scale;

        let roughness_offset = (x + self.offset) * s.roughness_frequency;
        let roughness = self.perlin_01(roughness_offset, roughness_offset);

        let secondary_offset = (x + self.offset) * s.noise_frequency * s.max_roughness_modifier;
        let secondary =
            (self.perlin_01(-secondary_offset, secondary_offset) - 0.5) * s.roughness_height_scale;

        s.height_offset + primary + secondary * roughness
    }

    /// Perlin sample remapped from `[-1, 1]` to `[0, 1]`.
    fn perlin_01(&self, x: f32, y: f32) -> f32 {
        (self.perlin.get([x as f64, y as f64]) as f32 + 1.0) * 0.5
    }
}

/// Deterministic per-seed shift spreading seeds apart in the noise domain.
fn noise_offset(seed: u32) -> f32 {
    let hashed = seed.wrapping_mul(0x9E37_79B9);
    (hashed % 20_000) as f32 - 10_000.0
}

fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Blocking one-shot producer seeding a freshly loaded chunk.
pub struct WorldGenProducer {
    settings: WorldGenSettings,
}

impl WorldGenProducer {
    pub const ID: ProducerId = ProducerId("world-generation");

    pub fn new(settings: WorldGenSettings) -> Self {
        Self { settings }
    }
}

impl ChunkProducer for WorldGenProducer {
    fn id(&self) -> ProducerId {
        Self::ID
    }

    fn is_blocking(&self) -> bool {
        true
    }

    fn schedule(&mut self, field: &SharedField, pool: &TaskPool, after: TaskHandle) -> TaskHandle {
        let field = std::sync::Arc::clone(field);
        let settings = self.settings;
        pool.spawn_after(after, move || {
            let mut field = field.write().expect("voxel field lock poisoned");
            generate(&mut field, &settings);
        })
    }

    fn on_completed(&mut self, _field: &SharedField) -> ProducerLifecycle {
        // One-shot: the chunk is seeded exactly once.
        ProducerLifecycle::Remove
    }
}
