//! # Chunk dispatch
//!
//! The [`ChunkExecutor`] trait is the one concurrency contract the engine
//! depends on. Given a list of chunks, each paired with an owned payload, and
//! a processing function, an executor:
//!
//! - runs the function exactly once per chunk,
//! - keeps at most `workers()` executions active at the same time,
//! - blocks the caller until every chunk has finished,
//! - returns one [`ChunkOutcome`] per chunk, in the order the work was given.
//!
//! A chunk whose function returns an error or panics yields a
//! `GeneticError::Dispatch` outcome for that chunk only. A chunk whose worker
//! vanished before reporting does the same. Nothing is dropped silently.
//!
//! Four backends honor the contract:
//!
//! - [`SequentialExecutor`] runs every chunk inline on the caller's thread.
//! - [`ForkJoinExecutor`] spawns one rayon task per chunk into a pool and
//!   joins on the scope.
//! - [`WorkerPoolExecutor`] feeds a bounded queue drained by long-lived
//!   worker threads.
//! - [`ActorExecutor`] sends each chunk as a request to one of several
//!   actors, round-robin, and waits on the reply of every request.
//!
//! [`Dispatcher`] selects one of them at runtime.

pub mod actor;
pub mod fork_join;
pub mod sequential;
pub mod worker_pool;

use std::any::Any;
use std::fmt::{self, Debug};
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::chunk::Chunk;
use crate::error::{GeneticError, Result};

pub use actor::ActorExecutor;
pub use fork_join::ForkJoinExecutor;
pub use sequential::SequentialExecutor;
pub use worker_pool::WorkerPoolExecutor;

/// Result of processing one chunk.
#[derive(Debug)]
pub struct ChunkOutcome<T> {
    pub chunk: Chunk,
    pub result: Result<T>,
}

/// Runs chunked work across a bounded set of workers, barrier style.
pub trait ChunkExecutor: Debug + Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> DispatcherKind;

    /// Upper bound on concurrently running chunk functions.
    fn workers(&self) -> usize;

    /// Processes every chunk and returns once all of them are done.
    ///
    /// Outcomes come back in the order of `work`, whatever order the chunks
    /// actually ran in.
    fn execute<P, T, F>(&self, work: Vec<(Chunk, P)>, process: F) -> Vec<ChunkOutcome<T>>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: Fn(Chunk, P) -> Result<T> + Send + Sync + 'static;
}

/// Keeps the successful results in order, or returns the first failure.
pub fn collect_outcomes<T>(outcomes: Vec<ChunkOutcome<T>>) -> Result<Vec<(Chunk, T)>> {
    outcomes
        .into_iter()
        .map(|outcome| outcome.result.map(|value| (outcome.chunk, value)))
        .collect()
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatcherKind {
    Sequential,
    ForkJoin,
    WorkerPool,
    Actor,
}

impl DispatcherKind {
    pub const ALL: [DispatcherKind; 4] = [
        DispatcherKind::Sequential,
        DispatcherKind::ForkJoin,
        DispatcherKind::WorkerPool,
        DispatcherKind::Actor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DispatcherKind::Sequential => "sequential",
            DispatcherKind::ForkJoin => "fork-join",
            DispatcherKind::WorkerPool => "worker-pool",
            DispatcherKind::Actor => "actor",
        }
    }
}

impl fmt::Display for DispatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DispatcherKind {
    type Err = GeneticError;

    fn from_str(s: &str) -> Result<Self> {
        DispatcherKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| GeneticError::Configuration(format!("Unknown dispatcher '{}'", s)))
    }
}

/// A backend chosen at runtime.
#[derive(Debug)]
pub enum Dispatcher {
    Sequential(SequentialExecutor),
    ForkJoin(ForkJoinExecutor),
    WorkerPool(WorkerPoolExecutor),
    Actor(ActorExecutor),
}

impl Dispatcher {
    /// Builds the backend of the given kind with `workers` workers.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if `workers` is zero or the worker
    /// threads cannot be started.
    pub fn new(kind: DispatcherKind, workers: usize) -> Result<Self> {
        Ok(match kind {
            DispatcherKind::Sequential => Dispatcher::Sequential(SequentialExecutor::new()),
            DispatcherKind::ForkJoin => Dispatcher::ForkJoin(ForkJoinExecutor::new(workers)?),
            DispatcherKind::WorkerPool => {
                Dispatcher::WorkerPool(WorkerPoolExecutor::new(workers)?)
            }
            DispatcherKind::Actor => Dispatcher::Actor(ActorExecutor::new(workers)?),
        })
    }
}

impl ChunkExecutor for Dispatcher {
    fn kind(&self) -> DispatcherKind {
        match self {
            Dispatcher::Sequential(executor) => executor.kind(),
            Dispatcher::ForkJoin(executor) => executor.kind(),
            Dispatcher::WorkerPool(executor) => executor.kind(),
            Dispatcher::Actor(executor) => executor.kind(),
        }
    }

    fn workers(&self) -> usize {
        match self {
            Dispatcher::Sequential(executor) => executor.workers(),
            Dispatcher::ForkJoin(executor) => executor.workers(),
            Dispatcher::WorkerPool(executor) => executor.workers(),
            Dispatcher::Actor(executor) => executor.workers(),
        }
    }

    fn execute<P, T, F>(&self, work: Vec<(Chunk, P)>, process: F) -> Vec<ChunkOutcome<T>>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: Fn(Chunk, P) -> Result<T> + Send + Sync + 'static,
    {
        match self {
            Dispatcher::Sequential(executor) => executor.execute(work, process),
            Dispatcher::ForkJoin(executor) => executor.execute(work, process),
            Dispatcher::WorkerPool(executor) => executor.execute(work, process),
            Dispatcher::Actor(executor) => executor.execute(work, process),
        }
    }
}

/// Type-erased unit of work run by a thread-backed executor.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Wraps one chunk into a job that reports `(index, result)` on `reply`.
///
/// The job releases its handle on `process` before replying, so once the
/// caller has heard from every job no worker holds the function any more.
pub(crate) fn job_for<P, T, F>(
    index: usize,
    chunk: Chunk,
    payload: P,
    process: Arc<F>,
    reply: Sender<(usize, Result<T>)>,
) -> Job
where
    P: Send + 'static,
    T: Send + 'static,
    F: Fn(Chunk, P) -> Result<T> + Send + Sync + 'static,
{
    Box::new(move || {
        let result = run_guarded(chunk, || process(chunk, payload));
        drop(process);
        // The caller only disappears if it panicked itself.
        let _ = reply.send((index, result));
    })
}

/// Runs a chunk function, turning both errors and panics into a
/// `Dispatch` error that names the chunk.
pub(crate) fn run_guarded<T, F>(chunk: Chunk, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(GeneticError::Dispatch { start, end, reason })) => {
            Err(GeneticError::Dispatch { start, end, reason })
        }
        Ok(Err(err)) => Err(dispatch_error(chunk, err.to_string())),
        Err(payload) => Err(dispatch_error(
            chunk,
            format!("chunk function panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

pub(crate) fn dispatch_error(chunk: Chunk, reason: impl Into<String>) -> GeneticError {
    GeneticError::Dispatch {
        start: chunk.start(),
        end: chunk.end(),
        reason: reason.into(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Places replies into their submission slot; chunks that never replied
/// become `Dispatch` errors.
pub(crate) struct OutcomeSlots<T> {
    chunks: Vec<Chunk>,
    results: Vec<Option<Result<T>>>,
}

impl<T> OutcomeSlots<T> {
    pub(crate) fn new(chunks: Vec<Chunk>) -> Self {
        let results = chunks.iter().map(|_| None).collect();
        Self { chunks, results }
    }

    pub(crate) fn fill(&mut self, index: usize, result: Result<T>) {
        if let Some(slot) = self.results.get_mut(index) {
            *slot = Some(result);
        }
    }

    pub(crate) fn finish(self) -> Vec<ChunkOutcome<T>> {
        self.chunks
            .into_iter()
            .zip(self.results)
            .map(|(chunk, result)| ChunkOutcome {
                chunk,
                result: result.unwrap_or_else(|| {
                    Err(dispatch_error(chunk, "worker exited before reporting"))
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::partition;

    #[test]
    fn test_run_guarded_wraps_errors() {
        let chunk = partition(10, 0, 5).unwrap()[1];

        let result: Result<()> = run_guarded(chunk, || Err(GeneticError::EmptyPopulation));
        match result {
            Err(GeneticError::Dispatch { start, end, reason }) => {
                assert_eq!((start, end), (5, 10));
                assert!(reason.contains("Empty population"));
            }
            other => panic!("Expected Dispatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_run_guarded_catches_panics() {
        let chunk = partition(4, 0, 4).unwrap()[0];

        let result: Result<()> = run_guarded(chunk, || panic!("boom"));
        match result {
            Err(GeneticError::Dispatch { reason, .. }) => assert!(reason.contains("boom")),
            other => panic!("Expected Dispatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_slots_report_missing_chunks() {
        let chunks = partition(9, 0, 3).unwrap();
        let mut slots = OutcomeSlots::new(chunks);
        slots.fill(2, Ok(2));
        slots.fill(0, Ok(0));

        let outcomes = slots.finish();
        assert_eq!(outcomes[0].result, Ok(0));
        assert!(matches!(
            outcomes[1].result,
            Err(GeneticError::Dispatch { start: 3, end: 6, .. })
        ));
        assert_eq!(outcomes[2].result, Ok(2));
    }

    #[test]
    fn test_collect_outcomes_returns_first_failure() {
        let chunks = partition(6, 0, 2).unwrap();
        let outcomes = vec![
            ChunkOutcome { chunk: chunks[0], result: Ok(1) },
            ChunkOutcome { chunk: chunks[1], result: Err(dispatch_error(chunks[1], "first")) },
            ChunkOutcome { chunk: chunks[2], result: Err(dispatch_error(chunks[2], "second")) },
        ];

        match collect_outcomes(outcomes) {
            Err(GeneticError::Dispatch { reason, .. }) => assert_eq!(reason, "first"),
            other => panic!("Expected Dispatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatcher_kind_round_trips_names() {
        for kind in DispatcherKind::ALL {
            assert_eq!(kind.to_string().parse::<DispatcherKind>().unwrap(), kind);
        }
        assert!("carrier-pigeon".parse::<DispatcherKind>().is_err());
    }

    #[test]
    fn test_dispatcher_rejects_zero_workers() {
        for kind in [DispatcherKind::ForkJoin, DispatcherKind::WorkerPool, DispatcherKind::Actor] {
            assert!(matches!(
                Dispatcher::new(kind, 0),
                Err(GeneticError::Configuration(_))
            ));
        }
    }
}
