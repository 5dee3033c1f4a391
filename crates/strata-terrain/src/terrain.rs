//! Terrain orchestrator.
//!
//! Owns the sparse chunk map, the queued world-space modifications, and the
//! task pool driving the per-chunk producer pipelines. A caller-driven
//! [`Terrain::update`] forms one frame: complete last frame's pipelines,
//! distribute queued edits to the chunks they touch, and schedule the dirty
//! chunks' apply pass plus producer graph.

use std::fmt;
use std::sync::{Arc, RwLock};

use glam::{Vec2, vec2};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use strata_field::{GridModification, Rect, VoxelField, apply_pending};
use strata_tasks::{TaskHandle, TaskPool};

use crate::config::TerrainConfig;
use crate::graph::{DependencyGraph, GraphError};
use crate::producer::{ChunkProducer, ProducerId, SharedField};
use crate::worldgen::WorldGenProducer;

/// Integer chunk grid coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space bottom-left corner of the chunk.
    pub fn origin(self, chunk_extent: f32) -> Vec2 {
        vec2(self.x as f32, self.y as f32) * chunk_extent
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Buffered lifecycle notification for collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    Loaded(ChunkCoord),
    Unloaded(ChunkCoord),
}

/// Factory attaching a producer to every current and future chunk.
pub type ProducerFactory = Box<dyn Fn(ChunkCoord) -> Box<dyn ChunkProducer>>;

struct Chunk {
    field: SharedField,
    graph: DependencyGraph,
    /// Outstanding pipeline handle of the last schedule, if any.
    handle: Option<TaskHandle>,
    bounds: Rect,
}

/// The terrain: a sparse map of chunks plus the machinery editing them.
pub struct Terrain {
    config: TerrainConfig,
    pool: TaskPool,
    chunks: FxHashMap<ChunkCoord, Chunk>,
    dirty: FxHashSet<ChunkCoord>,
    queued: Vec<GridModification>,
    factories: Vec<ProducerFactory>,
    events: Vec<ChunkEvent>,
}

impl Terrain {
    pub fn new(config: TerrainConfig) -> Self {
        Self::with_pool(config, TaskPool::new())
    }

    pub fn with_pool(config: TerrainConfig, pool: TaskPool) -> Self {
        Self {
            config,
            pool,
            chunks: FxHashMap::default(),
            dirty: FxHashSet::default(),
            queued: Vec::new(),
            factories: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_chunk_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// The chunk's shared field, for read-side consumers.
    pub fn chunk_field(&self, coord: ChunkCoord) -> Option<SharedField> {
        self.chunks.get(&coord).map(|c| Arc::clone(&c.field))
    }

    /// Attaches a producer to every loaded chunk and to each chunk loaded
    /// from now on.
    ///
    /// Registration is all-or-nothing: every chunk's graph is validated
    /// before any of them is touched, so a rejected factory leaves the
    /// terrain exactly as it was.
    pub fn add_producer_factory<F>(&mut self, factory: F) -> Result<(), GraphError>
    where
        F: Fn(ChunkCoord) -> Box<dyn ChunkProducer> + 'static,
    {
        let mut pending: Vec<(ChunkCoord, Box<dyn ChunkProducer>)> = Vec::new();
        for (&coord, chunk) in &self.chunks {
            let producer = factory(coord);
            if chunk.graph.contains(producer.id()) {
                return Err(GraphError::DuplicateProducer(producer.id()));
            }
            pending.push((coord, producer));
        }
        for (coord, producer) in pending {
            let chunk = self
                .chunks
                .get_mut(&coord)
                .expect("validated chunk disappeared");
            chunk.graph.insert(producer)?;
            self.dirty.insert(coord);
        }
        self.factories.push(Box::new(factory));
        Ok(())
    }

    /// Producer ids of a chunk's graph in schedule order.
    pub fn producer_ids(&self, coord: ChunkCoord) -> Option<Vec<ProducerId>> {
        self.chunks.get(&coord).map(|c| c.graph.ids().collect())
    }

    /// Creates the chunk's field, seeds its producer graph, and marks it
    /// dirty so the first `update` runs its pipeline. Loading an already
    /// loaded chunk is a no-op.
    pub fn load_chunk(&mut self, coord: ChunkCoord) -> Result<(), GraphError> {
        if self.chunks.contains_key(&coord) {
            trace!(%coord, "chunk already loaded");
            return Ok(());
        }

        let origin = coord.origin(self.config.chunk_extent());
        let field = VoxelField::new(origin, self.config.cell_size, self.config.field_resolution());
        let bounds = field.bounds();

        let mut graph = DependencyGraph::new();
        if let Some(settings) = self.config.worldgen {
            graph.insert(Box::new(WorldGenProducer::new(settings)))?;
        }
        for factory in &self.factories {
            graph.insert(factory(coord))?;
        }

        self.chunks.insert(
            coord,
            Chunk {
                field: Arc::new(RwLock::new(field)),
                graph,
                handle: None,
                bounds,
            },
        );
        self.dirty.insert(coord);
        self.events.push(ChunkEvent::Loaded(coord));
        debug!(%coord, "chunk loaded");
        Ok(())
    }

    /// Removes the chunk, waiting out its outstanding pipeline first so no
    /// task is left holding buffers the caller believes gone.
    pub fn unload_chunk(&mut self, coord: ChunkCoord) {
        let Some(mut chunk) = self.chunks.remove(&coord) else {
            return;
        };
        self.dirty.remove(&coord);
        if let Some(handle) = chunk.handle.take() {
            handle.wait();
            chunk.graph.notify_completed(&chunk.field);
        }
        self.events.push(ChunkEvent::Unloaded(coord));
        debug!(%coord, "chunk unloaded");
    }

    /// Queues a world-space edit; the next `update` applies it to every
    /// intersecting chunk.
    pub fn submit_modification(&mut self, modification: GridModification) {
        trace!(?modification, "modification queued");
        self.queued.push(modification);
    }

    /// Runs one frame of the pipeline.
    pub fn update(&mut self) {
        self.complete_finished();
        self.distribute_modifications();
        self.schedule_dirty();
    }

    /// Runs one frame and waits for every scheduled pipeline, for
    /// non-interactive contexts that need the results immediately.
    pub fn update_blocking(&mut self) {
        self.update();
        self.complete_finished();
    }

    /// Drains the buffered lifecycle events.
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    fn complete_finished(&mut self) {
        for chunk in self.chunks.values_mut() {
            if let Some(handle) = chunk.handle.take() {
                handle.wait();
                chunk.graph.notify_completed(&chunk.field);
            }
        }
    }

    fn distribute_modifications(&mut self) {
        for modification in std::mem::take(&mut self.queued) {
            let bounds = modification.bounds();
            for (&coord, chunk) in &mut self.chunks {
                if !chunk.bounds.intersects(&bounds) {
                    continue;
                }
                let local = modification.translated(chunk.bounds.min);
                chunk
                    .field
                    .write()
                    .expect("voxel field lock poisoned")
                    .push_modifier(local);
                self.dirty.insert(coord);
            }
        }
    }

    fn schedule_dirty(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let dirty: Vec<ChunkCoord> = self.dirty.drain().collect();
        for coord in dirty {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            debug!(%coord, "scheduling chunk pipeline");

            let field = Arc::clone(&chunk.field);
            let applied = self.pool.spawn(move || {
                let mut field = field.write().expect("voxel field lock poisoned");
                apply_pending(&mut field);
            });
            let handle = chunk.graph.schedule_all(&chunk.field, &self.pool, applied);
            chunk.handle = Some(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use glam::vec2;
    use strata_collider::{ChunkOutline, SurfaceTemplate};
    use strata_field::{BlendMode, FillType, ModifierShape, grid};
    use strata_mesh::ContourMesh;

    use crate::collider_producer::ColliderProducer;
    use crate::mesh_producer::MeshProducer;
    use crate::producer::OutputSlot;
    use crate::worldgen::WorldGenSettings;

    fn config() -> TerrainConfig {
        TerrainConfig {
            chunk_resolution: 8,
            cell_size: 1.0,
            max_sharp_angle_deg: 135.0,
            worldgen: None,
        }
    }

    fn circle(fill: FillType, blend: BlendMode, center: Vec2, extent: f32) -> GridModification {
        GridModification {
            shape: ModifierShape::Circle,
            blend,
            fill,
            center,
            extent,
        }
    }

    fn solid_cells(terrain: &Terrain, coord: ChunkCoord) -> usize {
        let field = terrain.chunk_field(coord).expect("chunk loaded");
        let field = field.read().unwrap();
        field.fill_types.iter().filter(|f| f.is_solid()).count()
    }

    #[test]
    fn test_disc_produces_mesh_and_single_collider_loop() {
        let mut terrain = Terrain::new(config());
        let resolution = terrain.config().field_resolution();

        let meshes: Arc<Mutex<Vec<OutputSlot<ContourMesh>>>> = Arc::default();
        let outlines: Arc<Mutex<Vec<OutputSlot<ChunkOutline>>>> = Arc::default();
        terrain
            .add_producer_factory({
                let meshes = Arc::clone(&meshes);
                move |_| {
                    let producer = MeshProducer::new(resolution, 135.0);
                    meshes.lock().unwrap().push(producer.output());
                    Box::new(producer)
                }
            })
            .unwrap();
        terrain
            .add_producer_factory({
                let outlines = Arc::clone(&outlines);
                move |_| {
                    let producer = ColliderProducer::new(SurfaceTemplate::default());
                    outlines.lock().unwrap().push(producer.output());
                    Box::new(producer)
                }
            })
            .unwrap();

        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        terrain.submit_modification(circle(
            FillType::Rock,
            BlendMode::Always,
            vec2(4.0, 4.0),
            2.5,
        ));
        terrain.update_blocking();

        assert!(solid_cells(&terrain, ChunkCoord::new(0, 0)) > 0);

        let mesh = meshes.lock().unwrap()[0].take().expect("mesh produced");
        assert!(mesh.triangle_count() > 0, "the disc should triangulate");

        let outline = outlines.lock().unwrap()[0].take().expect("outline produced");
        assert_eq!(outline.len(), 1, "one connected disc, one loop");
    }

    #[test]
    fn test_rejected_factory_leaves_chunks_untouched() {
        let mut terrain = Terrain::new(config());
        let resolution = terrain.config().field_resolution();
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        terrain.load_chunk(ChunkCoord::new(1, 0)).unwrap();

        terrain
            .add_producer_factory(move |_| Box::new(MeshProducer::new(resolution, 135.0)))
            .unwrap();
        let err =
            terrain.add_producer_factory(move |_| Box::new(MeshProducer::new(resolution, 135.0)));
        assert!(matches!(err, Err(GraphError::DuplicateProducer(_))));

        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)] {
            let ids = terrain.producer_ids(coord).unwrap();
            assert_eq!(ids, vec![MeshProducer::ID], "each chunk keeps one copy");
        }

        // The rejected factory must not apply to chunks loaded later either.
        terrain.load_chunk(ChunkCoord::new(2, 0)).unwrap();
        let ids = terrain.producer_ids(ChunkCoord::new(2, 0)).unwrap();
        assert_eq!(ids, vec![MeshProducer::ID]);
    }

    #[test]
    fn test_modification_spans_intersecting_chunks() {
        let mut terrain = Terrain::new(config());
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        terrain.load_chunk(ChunkCoord::new(1, 0)).unwrap();
        terrain.load_chunk(ChunkCoord::new(0, 1)).unwrap();

        // Straddles the border between the two bottom chunks, far from the
        // top one.
        terrain.submit_modification(circle(
            FillType::Rock,
            BlendMode::Always,
            vec2(8.0, 3.0),
            2.0,
        ));
        terrain.update_blocking();

        assert!(solid_cells(&terrain, ChunkCoord::new(0, 0)) > 0);
        assert!(solid_cells(&terrain, ChunkCoord::new(1, 0)) > 0);
        assert_eq!(solid_cells(&terrain, ChunkCoord::new(0, 1)), 0);
    }

    #[test]
    fn test_fill_then_replace_respects_blend_modes() {
        let mut terrain = Terrain::new(config());
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();

        terrain.submit_modification(circle(
            FillType::Rock,
            BlendMode::Fill,
            vec2(4.0, 4.0),
            2.5,
        ));
        terrain.submit_modification(circle(
            FillType::Soil,
            BlendMode::Replace,
            vec2(5.0, 4.0),
            1.5,
        ));
        terrain.update_blocking();

        let field = terrain.chunk_field(ChunkCoord::new(0, 0)).unwrap();
        let field = field.read().unwrap();
        let fill_at = |x, y| field.fill_types[grid::cell_index(x, y, 9)];

        assert_eq!(fill_at(5, 4), FillType::Soil, "replaced inside both discs");
        assert_eq!(fill_at(2, 4), FillType::Rock, "rock-only region untouched");
        assert_eq!(fill_at(0, 0), FillType::None, "outside both discs");
    }

    #[test]
    fn test_worldgen_seeds_loaded_chunks_deterministically() {
        let worldgen = WorldGenSettings {
            seed: 7,
            fill: FillType::Soil,
            height_offset: 4.0,
            height_scale: 2.0,
            noise_frequency: 0.3,
            roughness_frequency: 0.1,
            roughness_height_scale: 0.5,
            max_roughness_modifier: 2.0,
        };
        let config = TerrainConfig {
            worldgen: Some(worldgen),
            ..config()
        };

        let generate = |config: &TerrainConfig| {
            let mut terrain = Terrain::new(config.clone());
            terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
            terrain.update_blocking();
            let field = terrain.chunk_field(ChunkCoord::new(0, 0)).unwrap();
            let fills = field.read().unwrap().fill_types.clone();
            fills
        };

        let a = generate(&config);
        let b = generate(&config);
        assert_eq!(a, b, "same seed, same chunk");
        assert!(a.iter().any(|f| f.is_solid()), "ground below the line");
        assert!(a.iter().any(|f| !f.is_solid()), "air above the line");
    }

    #[test]
    fn test_unload_while_scheduled_completes_cleanly() {
        let mut terrain = Terrain::new(config());
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        terrain.submit_modification(circle(
            FillType::Rock,
            BlendMode::Always,
            vec2(4.0, 4.0),
            2.5,
        ));

        // Schedule without completing, then unload immediately.
        terrain.update();
        terrain.unload_chunk(ChunkCoord::new(0, 0));

        assert!(!terrain.is_chunk_loaded(ChunkCoord::new(0, 0)));
        // The terrain stays usable afterwards.
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        terrain.update_blocking();
    }

    #[test]
    fn test_lifecycle_events_buffer_and_drain() {
        let mut terrain = Terrain::new(config());
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        terrain.load_chunk(ChunkCoord::new(1, 0)).unwrap();
        terrain.unload_chunk(ChunkCoord::new(1, 0));

        let events = terrain.drain_events();
        assert_eq!(
            events,
            vec![
                ChunkEvent::Loaded(ChunkCoord::new(0, 0)),
                ChunkEvent::Loaded(ChunkCoord::new(1, 0)),
                ChunkEvent::Unloaded(ChunkCoord::new(1, 0)),
            ]
        );
        assert!(terrain.drain_events().is_empty(), "drain clears the buffer");
    }

    #[test]
    fn test_loading_twice_is_a_no_op() {
        let mut terrain = Terrain::new(config());
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        terrain.load_chunk(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(terrain.chunk_count(), 1);
        assert_eq!(terrain.drain_events().len(), 1);
    }
}
