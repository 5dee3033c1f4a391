//! Terrain orchestrator: chunk lifecycle, queued edits, and the
//! dependency-ordered producer pipeline deriving meshes and colliders from
//! the material field.

pub mod collider_producer;
pub mod config;
pub mod graph;
pub mod mesh_producer;
pub mod producer;
pub mod terrain;
pub mod worldgen;

pub use collider_producer::ColliderProducer;
pub use config::TerrainConfig;
pub use graph::{DependencyGraph, GraphError};
pub use mesh_producer::MeshProducer;
pub use producer::{ChunkProducer, OutputSlot, ProducerId, ProducerLifecycle, SharedField};
pub use terrain::{ChunkCoord, ChunkEvent, ProducerFactory, Terrain};
pub use worldgen::{WorldGenProducer, WorldGenSettings};
