//! Physics boundary extraction for the chunked material field.
//!
//! The boundary walker traces closed contour polylines per material for
//! collider generation; the surface template maps fill types to physics
//! materials and collision layers.

pub mod outline;
pub mod template;
pub mod walker;

pub use outline::{ChunkOutline, OutlineLoop};
pub use template::{PhysicsMaterial, SurfaceEntry, SurfaceTemplate};
pub use walker::trace_outlines;
