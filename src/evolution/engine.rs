//! # Engine
//!
//! The generational loop. Each call to [`Engine::step`] runs one generation:
//!
//! 1. **Evaluate** every slot, one chunk per task, against the shared
//!    read-only population; the fitness values are written back slot by slot.
//! 2. **Select the elite**: the fittest individual, first one on ties.
//! 3. **Crossover** slots `[1, population_size)` from two tournament winners
//!    each, drawn from the frozen old population. Slot 0 of the new
//!    population is a copy of the elite.
//! 4. **Mutate** slots `[1, population_size)` of the new population.
//!
//! Every parallel phase goes through the engine's [`ChunkExecutor`]. A failed
//! chunk aborts the generation with its error and leaves the previous
//! population untouched.
//!
//! ## Example
//!
//! ```rust
//! use knapsack_ga::dispatch::DispatcherKind;
//! use knapsack_ga::evolution::{Engine, EngineOptions};
//! use knapsack_ga::problem::ProblemInstance;
//!
//! let problem = ProblemInstance::with_gene_size(1, 20, 100);
//! let options = EngineOptions::builder()
//!     .dispatcher(DispatcherKind::WorkerPool)
//!     .workers(2)
//!     .chunk_size(8)
//!     .population_size(32)
//!     .gene_size(20)
//!     .seed(3)
//!     .build();
//!
//! let mut engine = Engine::new(options, problem).unwrap();
//! let best = engine.run(5).unwrap();
//! assert_eq!(best.gene_size(), 20);
//! assert_eq!(engine.generation(), 5);
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::options::{EngineOptions, LogLevel};
use crate::chunk::{partition, Chunk};
use crate::dispatch::{collect_outcomes, ChunkExecutor, Dispatcher};
use crate::error::{GeneticError, Result};
use crate::individual::{Fitness, Individual};
use crate::population::Population;
use crate::problem::ProblemInstance;
use crate::rng::{ClockRngFactory, Phase, RngFactory, RngKey, SeededRngFactory};
use crate::selection::tournament;

/// Summary of one completed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Number of generations completed, this one included.
    pub generation: usize,
    /// Fitness of the elite carried into the new population.
    pub best_fitness: Fitness,
    /// The elite itself, now in slot 0.
    pub elite: Individual,
}

/// Runs the genetic algorithm over one problem instance.
///
/// The executor is built once and serves every phase of every generation.
pub struct Engine<E: ChunkExecutor = Dispatcher> {
    executor: E,
    options: EngineOptions,
    problem: Arc<ProblemInstance>,
    rng_factory: Arc<dyn RngFactory>,
    population: Population,
    generation: usize,
}

impl Engine<Dispatcher> {
    /// Validates `options`, starts the configured backend and draws the
    /// initial population.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for invalid options, for a gene size
    /// that does not match the problem, or if the workers cannot be started.
    pub fn new(options: EngineOptions, problem: impl Into<Arc<ProblemInstance>>) -> Result<Self> {
        options.validate()?;
        let executor = Dispatcher::new(options.get_dispatcher(), options.get_workers())?;
        Self::with_executor(executor, options, problem)
    }
}

impl<E: ChunkExecutor> Engine<E> {
    /// Builds an engine around an already constructed executor.
    ///
    /// The worker count of `options` is ignored; the executor decides.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for invalid options or a gene size
    /// that does not match the problem.
    pub fn with_executor(
        executor: E,
        options: EngineOptions,
        problem: impl Into<Arc<ProblemInstance>>,
    ) -> Result<Self> {
        options.validate()?;
        let problem = problem.into();

        if options.get_gene_size() != problem.gene_size() {
            return Err(GeneticError::Configuration(format!(
                "Gene size {} does not match the {} items of the problem",
                options.get_gene_size(),
                problem.gene_size()
            )));
        }

        let rng_factory: Arc<dyn RngFactory> = match options.get_seed() {
            Some(seed) => Arc::new(SeededRngFactory::new(seed)),
            None => Arc::new(ClockRngFactory),
        };

        let mut rng = rng_factory.rng_for(RngKey::new(Phase::Init, 0, 0));
        let population = Population::random(
            options.get_population_size(),
            options.get_gene_size(),
            &mut rng,
        );

        debug!(
            dispatcher = %executor.kind(),
            workers = executor.workers(),
            population_size = population.len(),
            gene_size = problem.gene_size(),
            "engine initialized"
        );

        Ok(Self {
            executor,
            options,
            problem,
            rng_factory,
            population,
            generation: 0,
        })
    }

    /// Replaces the random number source used by every later phase.
    pub fn with_rng_factory(mut self, rng_factory: Arc<dyn RngFactory>) -> Self {
        self.rng_factory = rng_factory;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn problem(&self) -> &ProblemInstance {
        &self.problem
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The current population. After at least one generation, slot 0 holds
    /// the most recent elite.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Number of completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Runs `generations` generations and returns the last elite.
    ///
    /// With zero generations the current population is evaluated and its
    /// best individual returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing generation. Generations that
    /// completed before it are kept.
    pub fn run(&mut self, generations: usize) -> Result<Individual> {
        if generations == 0 {
            self.evaluate()?;
            return self.population.best().cloned();
        }

        let mut last = None;
        for _ in 0..generations {
            last = Some(self.step()?);
        }

        last.map(|report| report.elite).ok_or_else(|| {
            GeneticError::Evolution("No generation was run".to_string())
        })
    }

    /// Runs the number of generations configured in the options.
    pub fn run_default(&mut self) -> Result<Individual> {
        self.run(self.options.get_num_generations())
    }

    /// Runs exactly one generation.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by a chunk, or an `Evolution` error
    /// if the new population does not have the configured size. The previous
    /// population stays in place on error.
    pub fn step(&mut self) -> Result<GenerationReport> {
        self.evaluate()?;

        let elite_slot = self.population.best_index()?;
        let elite = self.population[elite_slot].clone();
        let best_fitness = elite.fitness()?;
        self.trace_phase("select", 1);

        let mut next = Population::from_individuals(vec![elite.clone()]);
        next.restore_chunks(self.crossover()?)?;
        self.mutate(&mut next)?;

        if next.len() != self.options.get_population_size() {
            return Err(GeneticError::Evolution(format!(
                "Generation {} produced {} individuals instead of {}",
                self.generation,
                next.len(),
                self.options.get_population_size()
            )));
        }

        self.population = next;
        self.generation += 1;

        if self.options.get_log_level() != LogLevel::None {
            info!(generation = self.generation, best_fitness, "generation complete");
        }

        Ok(GenerationReport {
            generation: self.generation,
            best_fitness,
            elite,
        })
    }

    /// Measures every slot of the current population.
    fn evaluate(&mut self) -> Result<()> {
        let chunks = partition(self.population.len(), 0, self.options.get_chunk_size())?;
        let work: Vec<(Chunk, ())> = chunks.iter().map(|&chunk| (chunk, ())).collect();

        let shared = Arc::new(std::mem::take(&mut self.population));
        let population = Arc::clone(&shared);
        let problem = Arc::clone(&self.problem);

        let outcomes = self.executor.execute(work, move |chunk, ()| {
            Ok(population.individuals()[chunk.range()]
                .iter()
                .map(|individual| individual.evaluate(&problem))
                .collect::<Vec<Fitness>>())
        });

        // Every job has released its handle by now.
        self.population = Arc::unwrap_or_clone(shared);

        for (chunk, values) in collect_outcomes(outcomes)? {
            self.population.record_fitness(chunk, &values)?;
        }

        self.trace_phase("evaluate", chunks.len());
        Ok(())
    }

    /// Breeds the children for slots `[1, population_size)`, one vector per
    /// chunk, from the current population.
    fn crossover(&mut self) -> Result<Vec<(Chunk, Vec<Individual>)>> {
        let chunks = partition(self.population.len(), 1, self.options.get_chunk_size())?;
        let work: Vec<(Chunk, ())> = chunks.iter().map(|&chunk| (chunk, ())).collect();

        let shared = Arc::new(std::mem::take(&mut self.population));
        let parents = Arc::clone(&shared);
        let rng_factory = Arc::clone(&self.rng_factory);
        let generation = self.generation;
        let tournament_size = self.options.get_tournament_size();

        let outcomes = self.executor.execute(work, move |chunk, ()| {
            let key = RngKey::new(Phase::Crossover, generation, chunk.start());
            let mut rng = rng_factory.rng_for(key);
            let pool = parents.individuals();

            chunk
                .range()
                .map(|_| -> Result<Individual> {
                    let first = tournament(&mut rng, pool, tournament_size)?;
                    let second = tournament(&mut rng, pool, tournament_size)?;
                    Ok(first.crossover_with(second, &mut rng))
                })
                .collect::<Result<Vec<_>>>()
        });

        self.population = Arc::unwrap_or_clone(shared);

        let children = collect_outcomes(outcomes)?;
        self.trace_phase("crossover", chunks.len());
        Ok(children)
    }

    /// Mutates slots `[1, population_size)` of `next` in place.
    fn mutate(&self, next: &mut Population) -> Result<()> {
        let chunks = partition(next.len(), 1, self.options.get_chunk_size())?;
        let work = next.take_chunks(&chunks)?;

        let rng_factory = Arc::clone(&self.rng_factory);
        let generation = self.generation;
        let probability = self.options.get_mutation_probability();

        let outcomes = self.executor.execute(work, move |chunk, mut individuals: Vec<Individual>| {
            let key = RngKey::new(Phase::Mutate, generation, chunk.start());
            let mut rng = rng_factory.rng_for(key);
            for individual in individuals.iter_mut() {
                if rng.chance(probability) {
                    individual.mutate(&mut rng);
                }
            }
            Ok(individuals)
        });

        next.restore_chunks(collect_outcomes(outcomes)?)?;
        self.trace_phase("mutate", chunks.len());
        Ok(())
    }

    fn trace_phase(&self, phase: &'static str, chunks: usize) {
        if self.options.get_log_level() == LogLevel::Verbose {
            debug!(generation = self.generation, phase, chunks, "phase complete");
        }
    }
}

impl<E: ChunkExecutor> fmt::Debug for Engine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("executor", &self.executor)
            .field("generation", &self.generation)
            .field("population_size", &self.population.len())
            .field("gene_size", &self.problem.gene_size())
            .finish()
    }
}
