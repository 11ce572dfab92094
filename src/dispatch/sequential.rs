use crate::chunk::Chunk;
use crate::error::Result;

use super::{run_guarded, ChunkExecutor, ChunkOutcome, DispatcherKind};

/// Runs every chunk on the calling thread, one after another.
///
/// This is the single-threaded baseline the concurrent backends are measured
/// and tested against.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ChunkExecutor for SequentialExecutor {
    fn kind(&self) -> DispatcherKind {
        DispatcherKind::Sequential
    }

    fn workers(&self) -> usize {
        1
    }

    fn execute<P, T, F>(&self, work: Vec<(Chunk, P)>, process: F) -> Vec<ChunkOutcome<T>>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: Fn(Chunk, P) -> Result<T> + Send + Sync + 'static,
    {
        work.into_iter()
            .map(|(chunk, payload)| ChunkOutcome {
                chunk,
                result: run_guarded(chunk, || process(chunk, payload)),
            })
            .collect()
    }
}
