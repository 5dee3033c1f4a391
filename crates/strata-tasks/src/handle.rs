//! Completion handles for scheduled work.

use std::sync::{Arc, Condvar, Mutex};

/// Completion flag shared between one scheduled task and its dependents.
#[derive(Debug, Default)]
struct Completion {
    done: Mutex<bool>,
    signal: Condvar,
}

impl Completion {
    fn complete(&self) {
        let mut done = self.done.lock().expect("completion flag poisoned");
        *done = true;
        self.signal.notify_all();
    }

    fn wait(&self) {
        let mut done = self.done.lock().expect("completion flag poisoned");
        while !*done {
            done = self.signal.wait(done).expect("completion flag poisoned");
        }
    }

    fn is_complete(&self) -> bool {
        *self.done.lock().expect("completion flag poisoned")
    }
}

/// Opaque reference to scheduled work: a set of completion flags.
///
/// Handles are cheap to clone, and combining handles unions their flag sets,
/// so one handle can stand for the completion of many tasks (a fan-in).
/// Waiting on a handle blocks until every flag in the set is raised; a handle
/// with an empty set ([`TaskHandle::ready`]) is always complete.
#[derive(Clone, Debug, Default)]
pub struct TaskHandle {
    completions: Vec<Arc<Completion>>,
}

impl TaskHandle {
    /// A handle that is already complete, used as the root dependency of a
    /// chain.
    pub fn ready() -> Self {
        Self::default()
    }

    /// A pending handle plus the signal that completes it.
    pub(crate) fn pending() -> (Self, TaskSignal) {
        let completion = Arc::new(Completion::default());
        (
            Self {
                completions: vec![Arc::clone(&completion)],
            },
            TaskSignal(completion),
        )
    }

    /// Combines handles into one that completes when all of them have.
    pub fn combine<I>(handles: I) -> Self
    where
        I: IntoIterator<Item = TaskHandle>,
    {
        let mut completions = Vec::new();
        for handle in handles {
            completions.extend(handle.completions);
        }
        Self { completions }
    }

    /// Blocks until every task the handle refers to has completed.
    pub fn wait(&self) {
        for completion in &self.completions {
            completion.wait();
        }
    }

    /// Returns `true` when every task the handle refers to has completed.
    pub fn is_complete(&self) -> bool {
        self.completions.iter().all(|c| c.is_complete())
    }
}

/// Write side of a pending handle; raising it wakes all waiters.
pub(crate) struct TaskSignal(Arc<Completion>);

impl TaskSignal {
    pub(crate) fn complete(self) {
        self.0.complete();
    }
}
