//! # Individual
//!
//! An `Individual` is one candidate solution: a bitset with one gene per item
//! (`true` when the item is packed) and a cached fitness score.
//!
//! The cached fitness is only meaningful after an explicit call to
//! [`Individual::measure_fitness`]. Crossover produces children without a
//! fitness and mutation clears it, so stale scores can never be read by
//! mistake: [`Individual::fitness`] returns an error instead.
//!
//! ## Fitness
//!
//! A selection whose total weight fits the capacity scores its total value
//! (`>= 0`). An overweight selection scores `-(total_weight - capacity)`, a
//! penalty proportional to the excess, so every infeasible individual orders
//! below every feasible one.
//!
//! ## Example
//!
//! ```rust
//! use knapsack_ga::individual::Individual;
//! use knapsack_ga::problem::ProblemInstance;
//!
//! let problem = ProblemInstance::new(vec![10, 20, 30], vec![5, 5, 5], 10).unwrap();
//!
//! let mut light = Individual::from_genes(vec![true, true, false]);
//! light.measure_fitness(&problem);
//! assert_eq!(light.fitness().unwrap(), 30);
//!
//! let mut heavy = Individual::from_genes(vec![true, true, true]);
//! heavy.measure_fitness(&problem);
//! assert_eq!(heavy.fitness().unwrap(), -5);
//! ```

use crate::error::{GeneticError, Result};
use crate::problem::ProblemInstance;
use crate::rng::RandomNumberGenerator;

/// Score of an individual. Negative scores mark infeasible selections.
pub type Fitness = i64;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual {
    genes: Vec<bool>,
    fitness: Option<Fitness>,
}

impl Individual {
    /// Draws every gene independently with probability one half.
    pub fn random(gene_size: usize, rng: &mut RandomNumberGenerator) -> Self {
        Self {
            genes: (0..gene_size).map(|_| rng.coin_flip()).collect(),
            fitness: None,
        }
    }

    /// Wraps an explicit selection. The fitness starts unmeasured.
    pub fn from_genes(genes: Vec<bool>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    pub fn genes(&self) -> &[bool] {
        &self.genes
    }

    pub fn gene_size(&self) -> usize {
        self.genes.len()
    }

    pub fn is_selected(&self, item: usize) -> bool {
        self.genes[item]
    }

    pub fn selected_count(&self) -> usize {
        self.genes.iter().filter(|&&selected| selected).count()
    }

    /// Returns the cached fitness.
    ///
    /// # Errors
    ///
    /// Returns a `FitnessCalculation` error if the fitness has not been
    /// measured since the genes last changed.
    pub fn fitness(&self) -> Result<Fitness> {
        self.fitness.ok_or_else(|| {
            GeneticError::FitnessCalculation(
                "Fitness read before it was measured".to_string(),
            )
        })
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Total value and total weight of the selected items.
    pub fn totals(&self, problem: &ProblemInstance) -> (u64, u64) {
        self.genes
            .iter()
            .enumerate()
            .filter(|(_, &selected)| selected)
            .fold((0, 0), |(value, weight), (item, _)| {
                (value + problem.value(item), weight + problem.weight(item))
            })
    }

    pub fn is_feasible(&self, problem: &ProblemInstance) -> bool {
        self.totals(problem).1 <= problem.capacity()
    }

    /// Computes the fitness without caching it.
    pub fn evaluate(&self, problem: &ProblemInstance) -> Fitness {
        let (value, weight) = self.totals(problem);
        if weight > problem.capacity() {
            -((weight - problem.capacity()) as Fitness)
        } else {
            value as Fitness
        }
    }

    /// Computes the fitness and caches it on the individual.
    pub fn measure_fitness(&mut self, problem: &ProblemInstance) {
        self.fitness = Some(self.evaluate(problem));
    }

    /// Caches a fitness computed elsewhere for these exact genes.
    pub(crate) fn record_fitness(&mut self, fitness: Fitness) {
        self.fitness = Some(fitness);
    }

    /// Single-point crossover at a uniformly drawn point in `[0, gene_size)`.
    ///
    /// Neither parent is modified; the child has no fitness yet.
    pub fn crossover_with(&self, mate: &Individual, rng: &mut RandomNumberGenerator) -> Individual {
        let point = rng.gen_index(self.genes.len());
        self.crossover_at(mate, point)
    }

    /// Child taking genes `[0, point)` from `self` and the rest from `mate`.
    pub fn crossover_at(&self, mate: &Individual, point: usize) -> Individual {
        let point = point.min(self.genes.len());
        let mut genes = Vec::with_capacity(self.genes.len());
        genes.extend_from_slice(&self.genes[..point]);
        genes.extend_from_slice(&mate.genes[point..]);

        Individual {
            genes,
            fitness: None,
        }
    }

    /// Flips one uniformly chosen gene. The cached fitness is cleared.
    pub fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
        let point = rng.gen_index(self.genes.len());
        self.flip(point);
    }

    /// Flips the gene at `item`. The cached fitness is cleared.
    pub fn flip(&mut self, item: usize) {
        self.genes[item] = !self.genes[item];
        self.fitness = None;
    }

    /// Number of genes that differ from `other`.
    pub fn hamming_distance(&self, other: &Individual) -> usize {
        self.genes
            .iter()
            .zip(other.genes.iter())
            .filter(|(a, b)| a != b)
            .count()
    }
}
