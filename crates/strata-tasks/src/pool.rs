//! Worker pool executing tasks in dependency order.

use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;
use tracing::warn;

use crate::handle::{TaskHandle, TaskSignal};

/// Errors surfaced by [`TaskPool::try_spawn_after`].
#[derive(Debug, Error)]
pub enum TaskPoolError {
    /// The worker threads are gone; no further tasks can be queued.
    #[error("task pool has shut down")]
    Shutdown,
}

/// Type-erased unit of work.
pub type Task = Box<dyn FnOnce() + Send>;

struct Job {
    after: TaskHandle,
    work: Task,
    signal: TaskSignal,
}

/// Fixed set of worker threads draining a shared FIFO queue.
///
/// Dependencies are expressed as [`TaskHandle`]s of previously spawned tasks
/// and a worker blocks on them before running its job. Because a handle can
/// only name work that was queued earlier, the earliest incomplete job in the
/// queue is always runnable, so the pool cannot deadlock on its own
/// dependencies.
pub struct TaskPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskPool {
    /// Creates a pool with one worker per logical core, minus one for the
    /// thread driving the pool.
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get().saturating_sub(1).max(1))
    }

    /// Creates a pool with an explicit worker count (at least 1).
    pub fn with_workers(count: usize) -> Self {
        let (sender, receiver) = unbounded::<Job>();
        let workers = (0..count.max(1))
            .map(|n| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("strata-worker-{n}"))
                    .spawn(move || worker_loop(receiver))
                    .unwrap_or_else(|e| panic!("failed to spawn worker thread: {e}"))
            })
            .collect();
        Self {
            sender: Some(sender),
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues a task with no dependencies.
    pub fn spawn<F>(&self, work: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.spawn_after(TaskHandle::ready(), work)
    }

    /// Queues a task that runs only once `after` has completed.
    ///
    /// If the pool has shut down the task is run inline on the calling thread
    /// instead of being lost, and the returned handle is already complete.
    pub fn spawn_after<F>(&self, after: TaskHandle, work: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        match self.try_spawn_after(after, Box::new(work)) {
            Ok(handle) => handle,
            Err((TaskPoolError::Shutdown, work)) => {
                warn!("task pool has shut down, running task inline");
                after_shutdown_inline(work)
            }
        }
    }

    /// Queues a task that runs only once `after` has completed, handing the
    /// work back on failure so the caller decides what to do with it.
    pub fn try_spawn_after(
        &self,
        after: TaskHandle,
        work: Task,
    ) -> Result<TaskHandle, (TaskPoolError, Task)> {
        let Some(sender) = &self.sender else {
            return Err((TaskPoolError::Shutdown, work));
        };
        let (handle, signal) = TaskHandle::pending();
        let job = Job {
            after,
            work,
            signal,
        };
        match sender.send(job) {
            Ok(()) => Ok(handle),
            Err(send_error) => {
                // Only reachable when every worker died mid-task; complete
                // the orphaned signal so nothing ever waits on it and hand
                // the work back.
                let job = send_error.into_inner();
                job.signal.complete();
                Err((TaskPoolError::Shutdown, job.work))
            }
        }
    }

    /// Disconnects the queue and joins the workers after they drain it.
    ///
    /// Subsequent `try_spawn_after` calls fail with
    /// [`TaskPoolError::Shutdown`]; `spawn`/`spawn_after` run inline.
    pub fn shutdown(&mut self) {
        self.sender = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("task pool worker panicked");
            }
        }
    }
}

fn after_shutdown_inline(work: Task) -> TaskHandle {
    work();
    TaskHandle::ready()
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        job.after.wait();
        (job.work)();
        job.signal.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_spawned_task_runs() {
        let pool = TaskPool::with_workers(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = {
            let counter = Arc::clone(&counter);
            pool.spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };
        handle.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dependency_order_is_respected() {
        let pool = TaskPool::with_workers(4);
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        let first = {
            let log = Arc::clone(&log);
            pool.spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                log.lock().unwrap().push("first");
            })
        };
        let second = {
            let log = Arc::clone(&log);
            pool.spawn_after(first, move || {
                log.lock().unwrap().push("second");
            })
        };

        second.wait();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_fan_in_waits_for_all_dependencies() {
        let pool = TaskPool::with_workers(4);
        let counter = Arc::new(AtomicUsize::new(0));

        let deps: Vec<TaskHandle> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.spawn(move || {
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let observed = Arc::new(AtomicUsize::new(0));
        let joined = {
            let counter = Arc::clone(&counter);
            let observed = Arc::clone(&observed);
            pool.spawn_after(TaskHandle::combine(deps), move || {
                observed.store(counter.load(Ordering::SeqCst), Ordering::SeqCst);
            })
        };

        joined.wait();
        assert_eq!(observed.load(Ordering::SeqCst), 4, "ran before its fan-in");
    }

    #[test]
    fn test_chain_through_single_worker_makes_progress() {
        // Deep chains must not deadlock even when only one worker exists.
        let pool = TaskPool::with_workers(1);
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handle = TaskHandle::ready();
        for _ in 0..32 {
            let counter = Arc::clone(&counter);
            handle = pool.spawn_after(handle, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        handle.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn test_drop_drains_queued_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = TaskPool::with_workers(2);
            for _ in 0..16 {
                let counter = Arc::clone(&counter);
                pool.spawn(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        // Drop joined the workers after the queue drained.
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_spawn_after_shutdown_runs_inline() {
        let mut pool = TaskPool::with_workers(1);
        pool.shutdown();

        let err = pool
            .try_spawn_after(TaskHandle::ready(), Box::new(|| {}))
            .err();
        assert!(matches!(err, Some((TaskPoolError::Shutdown, _))));

        let counter = Arc::new(AtomicUsize::new(0));
        let handle = {
            let counter = Arc::clone(&counter);
            pool.spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(handle.is_complete());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
