//! # EngineOptions
//!
//! The `EngineOptions` struct holds the configuration of an [`Engine`]: which
//! concurrency backend to use and how many workers it gets, how the
//! population is chunked, the genetic parameters and the logging level.
//!
//! [`Engine`]: crate::evolution::Engine
//!
//! ## Example
//!
//! ```rust
//! use knapsack_ga::dispatch::DispatcherKind;
//! use knapsack_ga::evolution::options::{EngineOptions, LogLevel};
//!
//! // Defaults reproduce the benchmark setup: 100 000 individuals of 1000 genes.
//! let default_options = EngineOptions::default();
//! assert_eq!(default_options.get_population_size(), 100_000);
//!
//! // A small configuration for experiments.
//! let options = EngineOptions::builder()
//!     .dispatcher(DispatcherKind::Actor)
//!     .workers(4)
//!     .chunk_size(50)
//!     .population_size(1000)
//!     .gene_size(100)
//!     .log_level(LogLevel::Minimal)
//!     .seed(42)
//!     .build();
//! assert!(options.validate().is_ok());
//! ```
//!
//! ## Log levels
//!
//! - `Verbose`: one line per generation plus one per phase.
//! - `Minimal`: one line per generation with the best fitness.
//! - `None`: the generational loop stays quiet.

use crate::dispatch::DispatcherKind;
use crate::error::{GeneticError, Result};
use crate::population::POP_SIZE;
use crate::problem::GENE_SIZE;
use crate::selection::TOURNAMENT_SIZE;

/// Number of generations run by [`Engine::run_default`](crate::evolution::Engine::run_default).
pub const N_GENERATIONS: usize = 500;

/// Probability that a non-elite individual receives one point mutation.
pub const PROB_MUTATION: f64 = 0.5;

pub const DEFAULT_WORKERS: usize = 16;

pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Minimal,
    None,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    dispatcher: DispatcherKind,
    workers: usize,
    chunk_size: usize,
    population_size: usize,
    gene_size: usize,
    num_generations: usize,
    mutation_probability: f64,
    tournament_size: usize,
    log_level: LogLevel,
    /// Base seed for every random stream. `None` seeds from the clock.
    seed: Option<u64>,
}

impl EngineOptions {
    /// Creates options for the given backend and chunking, keeping the
    /// default genetic parameters.
    pub fn new(dispatcher: DispatcherKind, workers: usize, chunk_size: usize) -> Self {
        Self {
            dispatcher,
            workers,
            chunk_size,
            ..Self::default()
        }
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error naming the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(GeneticError::Configuration(
                "Worker count must be positive".to_string(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(GeneticError::Configuration(
                "Chunk size must be positive".to_string(),
            ));
        }

        if self.population_size == 0 {
            return Err(GeneticError::Configuration(
                "Population size cannot be zero".to_string(),
            ));
        }

        if self.gene_size == 0 {
            return Err(GeneticError::Configuration(
                "Gene size cannot be zero".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(GeneticError::Configuration(format!(
                "Mutation probability must lie in [0, 1], got {}",
                self.mutation_probability
            )));
        }

        if self.tournament_size == 0 {
            return Err(GeneticError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn get_dispatcher(&self) -> DispatcherKind {
        self.dispatcher
    }

    pub fn get_workers(&self) -> usize {
        self.workers
    }

    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn get_population_size(&self) -> usize {
        self.population_size
    }

    pub fn get_gene_size(&self) -> usize {
        self.gene_size
    }

    pub fn get_num_generations(&self) -> usize {
        self.num_generations
    }

    pub fn get_mutation_probability(&self) -> f64 {
        self.mutation_probability
    }

    pub fn get_tournament_size(&self) -> usize {
        self.tournament_size
    }

    pub fn get_log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Sets the concurrency backend.
    pub fn set_dispatcher(&mut self, dispatcher: DispatcherKind) {
        self.dispatcher = dispatcher;
    }

    /// Sets the log level.
    pub fn set_log_level(&mut self, log_level: LogLevel) {
        self.log_level = log_level;
    }

    /// Sets the base seed. `None` switches back to clock seeding.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    /// Returns a builder for creating an `EngineOptions` instance.
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherKind::WorkerPool,
            workers: DEFAULT_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            population_size: POP_SIZE,
            gene_size: GENE_SIZE,
            num_generations: N_GENERATIONS,
            mutation_probability: PROB_MUTATION,
            tournament_size: TOURNAMENT_SIZE,
            log_level: LogLevel::None,
            seed: None,
        }
    }
}

/// Builder for `EngineOptions`.
///
/// Unset parameters fall back to the values of `EngineOptions::default()`.
#[derive(Debug, Clone, Default)]
pub struct EngineOptionsBuilder {
    dispatcher: Option<DispatcherKind>,
    workers: Option<usize>,
    chunk_size: Option<usize>,
    population_size: Option<usize>,
    gene_size: Option<usize>,
    num_generations: Option<usize>,
    mutation_probability: Option<f64>,
    tournament_size: Option<usize>,
    log_level: Option<LogLevel>,
    seed: Option<u64>,
}

impl EngineOptionsBuilder {
    pub fn dispatcher(mut self, value: DispatcherKind) -> Self {
        self.dispatcher = Some(value);
        self
    }

    pub fn workers(mut self, value: usize) -> Self {
        self.workers = Some(value);
        self
    }

    pub fn chunk_size(mut self, value: usize) -> Self {
        self.chunk_size = Some(value);
        self
    }

    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    pub fn gene_size(mut self, value: usize) -> Self {
        self.gene_size = Some(value);
        self
    }

    pub fn num_generations(mut self, value: usize) -> Self {
        self.num_generations = Some(value);
        self
    }

    pub fn mutation_probability(mut self, value: f64) -> Self {
        self.mutation_probability = Some(value);
        self
    }

    pub fn tournament_size(mut self, value: usize) -> Self {
        self.tournament_size = Some(value);
        self
    }

    pub fn log_level(mut self, value: LogLevel) -> Self {
        self.log_level = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    /// Builds the `EngineOptions` instance.
    pub fn build(self) -> EngineOptions {
        let defaults = EngineOptions::default();
        EngineOptions {
            dispatcher: self.dispatcher.unwrap_or(defaults.dispatcher),
            workers: self.workers.unwrap_or(defaults.workers),
            chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
            population_size: self.population_size.unwrap_or(defaults.population_size),
            gene_size: self.gene_size.unwrap_or(defaults.gene_size),
            num_generations: self.num_generations.unwrap_or(defaults.num_generations),
            mutation_probability: self
                .mutation_probability
                .unwrap_or(defaults.mutation_probability),
            tournament_size: self.tournament_size.unwrap_or(defaults.tournament_size),
            log_level: self.log_level.unwrap_or(defaults.log_level),
            seed: self.seed.or(defaults.seed),
        }
    }
}
