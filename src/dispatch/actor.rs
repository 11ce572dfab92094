use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

use crate::chunk::Chunk;
use crate::error::{GeneticError, Result};

use super::{dispatch_error, job_for, ChunkExecutor, ChunkOutcome, DispatcherKind, Job};

/// A request addressed to one actor. The reply channel lives inside the job.
struct Request {
    job: Job,
}

/// One independently addressable worker with its own mailbox.
struct Actor {
    mailbox: Option<Sender<Request>>,
    handle: Option<JoinHandle<()>>,
    received: Arc<AtomicUsize>,
}

impl Actor {
    fn spawn(id: usize) -> Result<Self> {
        let (mailbox, inbox) = crossbeam_channel::unbounded::<Request>();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);

        let handle = thread::Builder::new()
            .name(format!("actor-{}", id))
            .spawn(move || receive_loop(id, inbox, counter))
            .map_err(|e| {
                GeneticError::Configuration(format!("Failed to spawn actor {}: {}", id, e))
            })?;

        Ok(Self {
            mailbox: Some(mailbox),
            handle: Some(handle),
            received,
        })
    }

    fn tell(&self, request: Request) {
        // A refused request drops its reply handle, which fails the future.
        if let Some(mailbox) = &self.mailbox {
            let _ = mailbox.send(request);
        }
    }
}

fn receive_loop(id: usize, inbox: Receiver<Request>, received: Arc<AtomicUsize>) {
    while let Ok(request) = inbox.recv() {
        received.fetch_add(1, Ordering::SeqCst);
        (request.job)();
    }
    trace!(actor = id, "actor mailbox closed");
}

impl Drop for Actor {
    fn drop(&mut self) {
        self.mailbox.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Request/response workers addressed round-robin.
///
/// Every chunk becomes a request to the next actor in turn, starting from
/// the first actor on each dispatch. Each request carries a one-shot reply
/// channel that acts as its future; the dispatch blocks on every future, in
/// submission order, before returning. Actors are spawned once and live as
/// long as the executor.
pub struct ActorExecutor {
    actors: Vec<Actor>,
}

impl ActorExecutor {
    /// # Errors
    ///
    /// Returns a `Configuration` error if `workers` is zero or an actor
    /// thread cannot be spawned.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(GeneticError::Configuration(
                "Worker count must be positive".to_string(),
            ));
        }

        let actors = (0..workers).map(Actor::spawn).collect::<Result<Vec<_>>>()?;

        debug!(workers, "actors started");
        Ok(Self { actors })
    }

    /// Number of requests each actor has taken from its mailbox so far.
    pub fn received(&self) -> Vec<usize> {
        self.actors
            .iter()
            .map(|actor| actor.received.load(Ordering::SeqCst))
            .collect()
    }
}

impl fmt::Debug for ActorExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorExecutor")
            .field("actors", &self.actors.len())
            .finish()
    }
}

impl ChunkExecutor for ActorExecutor {
    fn kind(&self) -> DispatcherKind {
        DispatcherKind::Actor
    }

    fn workers(&self) -> usize {
        self.actors.len()
    }

    fn execute<P, T, F>(&self, work: Vec<(Chunk, P)>, process: F) -> Vec<ChunkOutcome<T>>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: Fn(Chunk, P) -> Result<T> + Send + Sync + 'static,
    {
        let process = Arc::new(process);
        let mut futures = Vec::with_capacity(work.len());

        for (index, (chunk, payload)) in work.into_iter().enumerate() {
            let (reply, future) = crossbeam_channel::bounded(1);
            let job = job_for(index, chunk, payload, Arc::clone(&process), reply);
            let actor = &self.actors[index % self.actors.len()];
            actor.tell(Request { job });
            futures.push((chunk, future));
        }

        futures
            .into_iter()
            .map(|(chunk, future)| ChunkOutcome {
                chunk,
                result: match future.recv() {
                    Ok((_, result)) => result,
                    Err(_) => Err(dispatch_error(chunk, "actor stopped before replying")),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::partition;

    #[test]
    fn test_actor_round_robin_spreads_requests() {
        let executor = ActorExecutor::new(4).unwrap();
        let chunks = partition(20, 0, 5).unwrap();
        let work: Vec<(Chunk, ())> = chunks.iter().map(|&c| (c, ())).collect();

        let outcomes = executor.execute(work, |chunk, ()| Ok(chunk.len()));

        assert!(outcomes.iter().all(|o| o.result == Ok(5)));
        assert_eq!(executor.received(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_actor_round_robin_restarts_per_dispatch() {
        let executor = ActorExecutor::new(3).unwrap();

        for _ in 0..2 {
            let chunks = partition(4, 0, 1).unwrap();
            let work: Vec<(Chunk, ())> = chunks.iter().map(|&c| (c, ())).collect();
            let outcomes = executor.execute(work, |_, ()| Ok(()));
            assert_eq!(outcomes.len(), 4);
        }

        assert_eq!(executor.received(), vec![4, 2, 2]);
    }

    #[test]
    fn test_actor_reports_failed_chunk_and_keeps_serving() {
        let executor = ActorExecutor::new(2).unwrap();
        let chunks = partition(6, 0, 2).unwrap();
        let work: Vec<(Chunk, ())> = chunks.iter().map(|&c| (c, ())).collect();

        let outcomes = executor.execute(work, |chunk, ()| {
            if chunk.start() == 0 {
                panic!("actor exploded");
            }
            Ok(chunk.start())
        });

        assert!(matches!(
            outcomes[0].result,
            Err(GeneticError::Dispatch { start: 0, end: 2, .. })
        ));
        assert_eq!(outcomes[1].result, Ok(2));
        assert_eq!(outcomes[2].result, Ok(4));

        let retry = executor.execute(vec![(chunks[0], ())], |chunk, ()| Ok(chunk.end()));
        assert_eq!(retry[0].result, Ok(2));
    }
}
