//! Ordered producer registry with dependency-constrained insertion.

use thiserror::Error;
use tracing::{debug, trace};

use strata_tasks::{TaskHandle, TaskPool};

use crate::producer::{ChunkProducer, ProducerId, ProducerLifecycle, SharedField};

/// Recoverable registration errors.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("producer `{0}` is already registered")]
    DuplicateProducer(ProducerId),
}

/// A chunk's producers in schedule order.
///
/// The registration position encodes the dependencies: a producer is placed
/// after the latest of its declared predecessors and before its earliest
/// already-registered dependent. Declared predecessors must already be
/// registered, so dependency edges always point backward in the list and a
/// cycle cannot be represented; an inverted bound pair is still checked and
/// fatal.
///
/// Unconstrained placement follows the blocking split: blocking producers go
/// before the first non-blocking one, non-blocking producers append at the
/// end.
#[derive(Default)]
pub struct DependencyGraph {
    producers: Vec<Box<dyn ChunkProducer>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    pub fn contains(&self, id: ProducerId) -> bool {
        self.position(id).is_some()
    }

    /// Registered producer ids in schedule order.
    pub fn ids(&self) -> impl Iterator<Item = ProducerId> + '_ {
        self.producers.iter().map(|p| p.id())
    }

    /// Registers a producer at the position its declarations allow.
    ///
    /// # Panics
    ///
    /// Panics if the producer declares a predecessor that is not registered
    /// (including itself), or if the predecessor/dependent bounds invert.
    /// Both are producer wiring bugs, not runtime conditions.
    pub fn insert(&mut self, producer: Box<dyn ChunkProducer>) -> Result<(), GraphError> {
        let id = producer.id();
        if self.contains(id) {
            return Err(GraphError::DuplicateProducer(id));
        }

        let mut after = 0;
        for &dep in producer.depends_on() {
            let Some(position) = self.position(dep) else {
                panic!("producer `{id}` depends on unregistered producer `{dep}`");
            };
            after = after.max(position + 1);
        }
        let before = self
            .producers
            .iter()
            .position(|p| p.depends_on().contains(&id))
            .unwrap_or(self.producers.len());
        assert!(
            after <= before,
            "producer `{id}` cannot be ordered: must come after position {after} \
             but before position {before}"
        );

        let preferred = if producer.is_blocking() {
            self.first_non_blocking()
        } else {
            self.producers.len()
        };
        let position = preferred.clamp(after, before);

        debug!(%id, position, blocking = producer.is_blocking(), "producer registered");
        self.producers.insert(position, producer);
        Ok(())
    }

    pub fn remove(&mut self, id: ProducerId) -> bool {
        match self.position(id) {
            Some(position) => {
                self.producers.remove(position);
                true
            }
            None => false,
        }
    }

    /// Schedules every producer against the pool.
    ///
    /// Blocking producers extend the serial chain: everything registered
    /// after one waits on its handle. Non-blocking producers schedule against
    /// the current chain and fan out; the returned handle covers the fan and
    /// the final chain.
    pub fn schedule_all(
        &mut self,
        field: &SharedField,
        pool: &TaskPool,
        after: TaskHandle,
    ) -> TaskHandle {
        let mut chain = after;
        let mut fan: Vec<TaskHandle> = Vec::new();
        for producer in &mut self.producers {
            trace!(id = %producer.id(), blocking = producer.is_blocking(), "scheduling producer");
            if producer.is_blocking() {
                // A blocking producer also waits out any fan scheduled
                // before it.
                if !fan.is_empty() {
                    fan.push(chain);
                    chain = TaskHandle::combine(fan.drain(..));
                }
                chain = producer.schedule(field, pool, chain);
            } else {
                fan.push(producer.schedule(field, pool, chain.clone()));
            }
        }

        if fan.is_empty() {
            chain
        } else {
            fan.push(chain);
            TaskHandle::combine(fan)
        }
    }

    /// Notifies producers that the chunk's pipeline completed, in reverse
    /// registration order, dropping those that report
    /// [`ProducerLifecycle::Remove`].
    pub fn notify_completed(&mut self, field: &SharedField) {
        for position in (0..self.producers.len()).rev() {
            if self.producers[position].on_completed(field) == ProducerLifecycle::Remove {
                let id = self.producers[position].id();
                debug!(%id, "one-shot producer removed");
                self.producers.remove(position);
            }
        }
    }

    fn position(&self, id: ProducerId) -> Option<usize> {
        self.producers.iter().position(|p| p.id() == id)
    }

    fn first_non_blocking(&self) -> usize {
        self.producers
            .iter()
            .position(|p| !p.is_blocking())
            .unwrap_or(self.producers.len())
    }
}
