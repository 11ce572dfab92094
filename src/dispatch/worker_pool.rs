use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

use crate::chunk::Chunk;
use crate::error::{GeneticError, Result};

use super::{job_for, ChunkExecutor, ChunkOutcome, DispatcherKind, Job, OutcomeSlots};

/// A fixed set of long-lived workers draining one shared queue.
///
/// The queue holds at most `workers` pending chunks, so the dispatching
/// thread produces work at the pace the workers consume it. Results travel
/// back on a channel created per dispatch; the dispatch returns once every
/// chunk has reported. The workers outlive the dispatch and serve every
/// phase of every generation. Dropping the executor closes the queue and
/// joins the workers.
pub struct WorkerPoolExecutor {
    queue: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
    workers: usize,
}

impl WorkerPoolExecutor {
    /// # Errors
    ///
    /// Returns a `Configuration` error if `workers` is zero or a worker
    /// thread cannot be spawned.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(GeneticError::Configuration(
                "Worker count must be positive".to_string(),
            ));
        }

        let (queue, jobs) = crossbeam_channel::bounded::<Job>(workers);
        let mut executor = Self {
            queue: Some(queue),
            handles: Vec::with_capacity(workers),
            workers,
        };

        for id in 0..workers {
            let jobs = jobs.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-pool-{}", id))
                .spawn(move || work_loop(id, jobs))
                .map_err(|e| {
                    GeneticError::Configuration(format!("Failed to spawn worker {}: {}", id, e))
                })?;
            executor.handles.push(handle);
        }

        debug!(workers, "worker pool started");
        Ok(executor)
    }
}

fn work_loop(id: usize, jobs: Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        job();
    }
    trace!(worker = id, "worker pool queue closed");
}

impl fmt::Debug for WorkerPoolExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPoolExecutor")
            .field("workers", &self.workers)
            .field("running", &self.queue.is_some())
            .finish()
    }
}

impl ChunkExecutor for WorkerPoolExecutor {
    fn kind(&self) -> DispatcherKind {
        DispatcherKind::WorkerPool
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn execute<P, T, F>(&self, work: Vec<(Chunk, P)>, process: F) -> Vec<ChunkOutcome<T>>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: Fn(Chunk, P) -> Result<T> + Send + Sync + 'static,
    {
        let process = Arc::new(process);
        let mut slots = OutcomeSlots::new(work.iter().map(|(chunk, _)| *chunk).collect());
        let (reply, replies) = crossbeam_channel::unbounded();

        if let Some(queue) = &self.queue {
            for (index, (chunk, payload)) in work.into_iter().enumerate() {
                let job = job_for(index, chunk, payload, Arc::clone(&process), reply.clone());
                if queue.send(job).is_err() {
                    // Every worker is gone; the rejected job is dropped with
                    // its reply handle and the chunk is reported as lost.
                    break;
                }
            }
        }
        drop(reply);

        // Ends once every job has replied or been dropped.
        for (index, result) in replies.iter() {
            slots.fill(index, result);
        }
        slots.finish()
    }
}

impl Drop for WorkerPoolExecutor {
    fn drop(&mut self) {
        self.queue.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        debug!(workers = self.workers, "worker pool stopped");
    }
}
