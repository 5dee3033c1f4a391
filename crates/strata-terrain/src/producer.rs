//! Per-chunk derived-data producer contract.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use strata_field::VoxelField;
use strata_tasks::{TaskHandle, TaskPool};

/// A chunk's field behind the lock scheduled tasks share.
///
/// The apply pass takes the write lock; downstream producers take read locks
/// and write only their private output slots.
pub type SharedField = Arc<RwLock<VoxelField>>;

/// Stable identifier of a producer, used for dependency declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProducerId(pub &'static str);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// What a producer wants done with itself once its tasks completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProducerLifecycle {
    /// Keep the producer; it reschedules every time the chunk goes dirty.
    Retain,
    /// Drop the producer from the graph; one-shot work is done.
    Remove,
}

/// A unit of derived per-chunk data, scheduled whenever the chunk's field
/// changed.
///
/// Producers are registered into a chunk's [`DependencyGraph`] and scheduled
/// after the modification apply pass. A *blocking* producer mutates the field
/// itself (world generation); its handle becomes the dependency of everything
/// scheduled after it. Non-blocking producers only read the field and run
/// concurrently with each other.
///
/// [`DependencyGraph`]: crate::graph::DependencyGraph
pub trait ChunkProducer: Send {
    fn id(&self) -> ProducerId;

    /// Producers that must be positioned (and therefore scheduled) before
    /// this one. Every listed id must already be registered.
    fn depends_on(&self) -> &'static [ProducerId] {
        &[]
    }

    /// Blocking producers write the field and serialize the schedule chain.
    fn is_blocking(&self) -> bool {
        false
    }

    /// Queues this producer's work on the pool, no earlier than `after`.
    fn schedule(&mut self, field: &SharedField, pool: &TaskPool, after: TaskHandle) -> TaskHandle;

    /// Called once the chunk's whole pipeline completed, in reverse
    /// registration order.
    fn on_completed(&mut self, field: &SharedField) -> ProducerLifecycle {
        let _ = field;
        ProducerLifecycle::Retain
    }
}

/// Single-value hand-off slot between a producer's task and its consumer.
///
/// The producing task overwrites the slot on every completed build; the
/// consumer takes the latest value whenever convenient. Clones share the same
/// slot.
pub struct OutputSlot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> OutputSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    /// Takes the latest produced value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.inner.lock().expect("output slot poisoned").take()
    }

    /// Returns `true` if a produced value is waiting.
    pub fn is_filled(&self) -> bool {
        self.inner.lock().expect("output slot poisoned").is_some()
    }

    pub(crate) fn put(&self, value: T) {
        *self.inner.lock().expect("output slot poisoned") = Some(value);
    }
}

impl<T> Clone for OutputSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for OutputSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
