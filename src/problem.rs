//! # ProblemInstance
//!
//! The 0/1 knapsack instance the population is evolved against: one value and
//! one weight per item, plus the weight capacity of the knapsack.
//!
//! An instance is built once, before any engine runs, and is never mutated
//! afterwards. Engines and their workers share it through an `Arc`.
//!
//! ## Example
//!
//! ```rust
//! use knapsack_ga::problem::{ProblemInstance, CAPACITY, GENE_SIZE};
//!
//! let problem = ProblemInstance::generate(1);
//! assert_eq!(problem.gene_size(), GENE_SIZE);
//! assert_eq!(problem.capacity(), CAPACITY);
//! assert_eq!(problem, ProblemInstance::generate(1));
//! ```

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{GeneticError, Result};

/// Number of items, and therefore genes per individual.
pub const GENE_SIZE: usize = 1000;

/// Weight limit of the default instance.
pub const CAPACITY: u64 = 300;

/// Seed of the default instance.
pub const DEFAULT_SEED: u64 = 1;

/// Item values and weights are drawn from `0..ITEM_RANGE`.
pub const ITEM_RANGE: u64 = 100;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemInstance {
    values: Vec<u64>,
    weights: Vec<u64>,
    capacity: u64,
}

impl ProblemInstance {
    /// Builds the default-sized instance deterministically from `seed`.
    pub fn generate(seed: u64) -> Self {
        Self::with_gene_size(seed, GENE_SIZE, CAPACITY)
    }

    /// Builds an instance of `gene_size` items deterministically from `seed`.
    pub fn with_gene_size(seed: u64, gene_size: usize, capacity: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut values = Vec::with_capacity(gene_size);
        let mut weights = Vec::with_capacity(gene_size);

        for _ in 0..gene_size {
            values.push(rng.gen_range(0..ITEM_RANGE));
            weights.push(rng.gen_range(0..ITEM_RANGE));
        }

        Self {
            values,
            weights,
            capacity,
        }
    }

    /// Builds an instance from explicit tables.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the tables are empty or differ in length.
    pub fn new(values: Vec<u64>, weights: Vec<u64>, capacity: u64) -> Result<Self> {
        if values.is_empty() {
            return Err(GeneticError::Configuration(
                "Problem instance must contain at least one item".to_string(),
            ));
        }

        if values.len() != weights.len() {
            return Err(GeneticError::Configuration(format!(
                "Value table length ({}) doesn't match weight table length ({})",
                values.len(),
                weights.len()
            )));
        }

        Ok(Self {
            values,
            weights,
            capacity,
        })
    }

    pub fn gene_size(&self) -> usize {
        self.values.len()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn value(&self, item: usize) -> u64 {
        self.values[item]
    }

    pub fn weight(&self, item: usize) -> u64 {
        self.weights[item]
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn weights(&self) -> &[u64] {
        &self.weights
    }
}

impl Default for ProblemInstance {
    fn default() -> Self {
        Self::generate(DEFAULT_SEED)
    }
}
