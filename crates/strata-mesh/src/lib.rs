//! Contour mesh generation for the chunked material field.
//!
//! A single-pass marching-squares triangulation turns a chunk's fill types
//! and sub-cell boundary offsets into a smooth mesh with one submesh index
//! range per material.

pub mod contour;
pub mod mesh;
pub mod vertex_cache;

pub use contour::ContourMeshBuilder;
pub use mesh::{ContourMesh, SubmeshRange};
pub use vertex_cache::VertexCache;
