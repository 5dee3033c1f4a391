//! Boundary outline producer.

use std::sync::Arc;

use strata_collider::{ChunkOutline, SurfaceTemplate, walker};
use strata_tasks::{TaskHandle, TaskPool};

use crate::producer::{ChunkProducer, OutputSlot, ProducerId, SharedField};

/// Traces a chunk's boundary loops whenever the field changed and hands the
/// [`ChunkOutline`] to the physics integration through an [`OutputSlot`].
///
/// The paired [`SurfaceTemplate`] maps each loop's fill type to its physics
/// material and collision layer when the consumer instantiates colliders.
pub struct ColliderProducer {
    template: Arc<SurfaceTemplate>,
    output: OutputSlot<ChunkOutline>,
}

impl ColliderProducer {
    pub const ID: ProducerId = ProducerId("chunk-outline");

    pub fn new(template: SurfaceTemplate) -> Self {
        Self {
            template: Arc::new(template),
            output: OutputSlot::new(),
        }
    }

    /// Slot the traced outlines appear in.
    pub fn output(&self) -> OutputSlot<ChunkOutline> {
        self.output.clone()
    }

    /// Surface properties to apply to the produced loops.
    pub fn template(&self) -> &SurfaceTemplate {
        &self.template
    }
}

impl ChunkProducer for ColliderProducer {
    fn id(&self) -> ProducerId {
        Self::ID
    }

    fn schedule(&mut self, field: &SharedField, pool: &TaskPool, after: TaskHandle) -> TaskHandle {
        let field = Arc::clone(field);
        let output = self.output.clone();
        pool.spawn_after(after, move || {
            let field = field.read().expect("voxel field lock poisoned");
            output.put(walker::trace_outlines(&field));
        })
    }
}
