//! Thread pools for running connection workers.
//!
//! The server is generic over a [`ThreadPool`] so the worker scheduling
//! strategy is pluggable:
//!
//! - [`NaiveThreadPool`] starts a fresh OS thread per job
//! - [`SharedQueueThreadPool`] feeds a fixed set of threads from a shared
//!   crossbeam channel and replaces workers that panic
//! - [`RayonThreadPool`] delegates to rayon's work-stealing pool

use crate::Result;

/// A pool of threads that jobs can be spawned onto.
pub trait ThreadPool {
    /// Creates a pool holding `threads` threads.
    ///
    /// Spawning the threads happens here; an OS-level failure to start one
    /// fails pool creation rather than a later `spawn` call.
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// Runs `job` on one of the pool's threads.
    ///
    /// A job that panics takes down only itself; the pool keeps accepting
    /// jobs afterwards.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;
}

mod naive;
mod rayon_pool;
mod shared_queue;

pub use self::naive::NaiveThreadPool;
pub use self::rayon_pool::RayonThreadPool;
pub use self::shared_queue::SharedQueueThreadPool;
