use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error};

use super::ThreadPool;
use crate::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads fed from one shared job queue.
///
/// The queue is a crossbeam MPMC channel used single-producer: the pool
/// sends, every worker receives. A worker whose job panics is replaced by a
/// fresh thread, so a panicking connection handler never shrinks the pool.
pub struct SharedQueueThreadPool {
    tx: Sender<Job>,
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: u32) -> Result<Self> {
        let (tx, rx) = channel::unbounded::<Job>();
        for _ in 0..threads {
            let worker = Worker(rx.clone());
            thread::Builder::new().spawn(move || run_jobs(worker))?;
        }
        Ok(SharedQueueThreadPool { tx })
    }

    /// # Panics
    /// panics if every worker thread has died and could not be respawned
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Box::new(job))
            .expect("no worker threads left in the pool");
    }
}

/// The receiving half a worker thread runs on. Dropping one during a panic
/// spawns its replacement.
#[derive(Clone)]
struct Worker(Receiver<Job>);

impl Drop for Worker {
    fn drop(&mut self) {
        if thread::panicking() {
            debug!("worker died in a panic, spawning a replacement");
            let worker = self.clone();
            if let Err(e) = thread::Builder::new().spawn(move || run_jobs(worker)) {
                error!("failed to respawn worker thread: {}", e);
            }
        }
    }
}

fn run_jobs(worker: Worker) {
    loop {
        match worker.0.recv() {
            Ok(job) => job(),
            // channel closed: the pool was dropped
            Err(_) => break,
        }
    }
}
