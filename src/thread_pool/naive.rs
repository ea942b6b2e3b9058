use std::thread;

use super::ThreadPool;
use crate::Result;

/// Not really a pool: every spawned job gets a brand new OS thread.
///
/// Useful as a baseline and for tests; the per-connection cost is one
/// thread creation.
pub struct NaiveThreadPool;

impl ThreadPool for NaiveThreadPool {
    fn new(_threads: u32) -> Result<Self> {
        Ok(NaiveThreadPool)
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        thread::spawn(job);
    }
}
