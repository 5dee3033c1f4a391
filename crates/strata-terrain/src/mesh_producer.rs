//! Contour mesh producer.

use std::sync::{Arc, Mutex};

use strata_mesh::{ContourMesh, ContourMeshBuilder};
use strata_tasks::{TaskHandle, TaskPool};

use crate::producer::{ChunkProducer, OutputSlot, ProducerId, SharedField};

/// Rebuilds a chunk's [`ContourMesh`] whenever the field changed and hands it
/// to the renderer through an [`OutputSlot`].
///
/// The builder (and its vertex cache) is reused across rebuilds; only the
/// finished mesh crosses the slot.
pub struct MeshProducer {
    builder: Arc<Mutex<ContourMeshBuilder>>,
    output: OutputSlot<ContourMesh>,
}

impl MeshProducer {
    pub const ID: ProducerId = ProducerId("contour-mesh");

    pub fn new(resolution: usize, max_interior_angle_deg: f32) -> Self {
        Self {
            builder: Arc::new(Mutex::new(ContourMeshBuilder::new(
                resolution,
                max_interior_angle_deg,
            ))),
            output: OutputSlot::new(),
        }
    }

    /// Slot the finished meshes appear in.
    pub fn output(&self) -> OutputSlot<ContourMesh> {
        self.output.clone()
    }
}

impl ChunkProducer for MeshProducer {
    fn id(&self) -> ProducerId {
        Self::ID
    }

    fn schedule(&mut self, field: &SharedField, pool: &TaskPool, after: TaskHandle) -> TaskHandle {
        let field = Arc::clone(field);
        let builder = Arc::clone(&self.builder);
        let output = self.output.clone();
        pool.spawn_after(after, move || {
            let field = field.read().expect("voxel field lock poisoned");
            let mut builder = builder.lock().expect("mesh builder lock poisoned");
            output.put(builder.build(&field));
        })
    }
}
