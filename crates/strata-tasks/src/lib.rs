//! Work-distributing task pool with explicit happens-after dependencies.
//!
//! A [`TaskHandle`] names the completion of scheduled work; handles can be
//! combined into fan-in points and passed to [`TaskPool::spawn_after`] to
//! form a dependency DAG without any shared global lock.

pub mod handle;
pub mod pool;

pub use handle::TaskHandle;
pub use pool::{Task, TaskPool, TaskPoolError};
