//! Chunked 2D material field: fill types, per-chunk voxel buffers, and the
//! modification apply engine that folds shape-based edits into fill types and
//! sub-cell boundary offsets.

pub mod apply;
pub mod field;
pub mod fill;
pub mod grid;
pub mod modification;
pub mod rect;

pub use apply::{apply_fill_pass, apply_offset_pass, apply_pending};
pub use field::VoxelField;
pub use fill::FillType;
pub use modification::{BlendMode, GridModification, ModifierShape};
pub use rect::Rect;
