use std::fmt;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::chunk::Chunk;
use crate::error::{GeneticError, Result};

use super::{job_for, ChunkExecutor, ChunkOutcome, DispatcherKind, OutcomeSlots};

/// Spawns one task per chunk and joins on all of them.
///
/// Tasks run on a dedicated rayon pool of `workers` threads that is built
/// once and reused for every dispatch, so no more than `workers` chunks are
/// processed at the same time however many tasks are spawned.
pub struct ForkJoinExecutor {
    pool: ThreadPool,
    workers: usize,
}

impl ForkJoinExecutor {
    /// # Errors
    ///
    /// Returns a `Configuration` error if `workers` is zero or the pool
    /// cannot be built.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(GeneticError::Configuration(
                "Worker count must be positive".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("fork-join-{}", index))
            .build()
            .map_err(|e| {
                GeneticError::Configuration(format!("Failed to build fork-join pool: {}", e))
            })?;

        debug!(workers, "fork-join pool started");
        Ok(Self { pool, workers })
    }
}

impl fmt::Debug for ForkJoinExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkJoinExecutor")
            .field("workers", &self.workers)
            .finish()
    }
}

impl ChunkExecutor for ForkJoinExecutor {
    fn kind(&self) -> DispatcherKind {
        DispatcherKind::ForkJoin
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

        self.pool.scope(|scope| {
            for (index, (chunk, payload)) in work.into_iter().enumerate() {
                let job = job_for(index, chunk, payload, Arc::clone(&process), reply.clone());
                scope.spawn(move |_| job());
            }
        });
        drop(reply);

        // The scope has joined every task, so all replies are already queued.
        for (index, result) in replies.try_iter() {
            slots.fill(index, result);
        }
        slots.finish()
    }
}
