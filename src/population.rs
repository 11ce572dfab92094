//! # Population
//!
//! A fixed-size, ordered collection of individuals. The order carries no
//! ranking, only slot identity: slot 0 holds the elite carried over from the
//! previous generation.
//!
//! For a parallel phase the population is split into owned per-chunk
//! vectors with [`Population::take_chunks`], the chunks are processed by the
//! workers, and the results are stitched back together in chunk order with
//! [`Population::restore_chunks`].

use crate::chunk::Chunk;
use crate::error::{GeneticError, OptionExt, Result};
use crate::individual::{Fitness, Individual};
use crate::problem::ProblemInstance;
use crate::rng::RandomNumberGenerator;

/// Number of individuals evolved by default.
pub const POP_SIZE: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Builds `size` random individuals of `gene_size` genes each.
    pub fn random(size: usize, gene_size: usize, rng: &mut RandomNumberGenerator) -> Self {
        Self {
            individuals: (0..size)
                .map(|_| Individual::random(gene_size, rng))
                .collect(),
        }
    }

    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Individual> {
        self.individuals.get(slot)
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    pub fn into_individuals(self) -> Vec<Individual> {
        self.individuals
    }

    /// Measures every individual on the calling thread.
    pub fn measure_all(&mut self, problem: &ProblemInstance) {
        self.individuals
            .iter_mut()
            .for_each(|individual| individual.measure_fitness(problem));
    }

    /// Writes fitness values computed for the slots of `chunk`, in slot order.
    ///
    /// # Errors
    ///
    /// Returns an `Evolution` error if the chunk lies outside the population
    /// or the number of values differs from the chunk length.
    pub fn record_fitness(&mut self, chunk: Chunk, values: &[Fitness]) -> Result<()> {
        if chunk.end() > self.individuals.len() || chunk.len() != values.len() {
            return Err(GeneticError::Evolution(format!(
                "Chunk {} returned {} fitness values for a population of {}",
                chunk,
                values.len(),
                self.individuals.len()
            )));
        }

        self.individuals[chunk.range()]
            .iter_mut()
            .zip(values)
            .for_each(|(individual, &fitness)| individual.record_fitness(fitness));
        Ok(())
    }

    /// Slot of the fittest individual. The first one seen wins ties.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPopulation` for an empty population and a
    /// `FitnessCalculation` error if any individual is unmeasured.
    pub fn best_index(&self) -> Result<usize> {
        let mut best: Option<(usize, Fitness)> = None;

        for (slot, individual) in self.individuals.iter().enumerate() {
            let fitness = individual.fitness()?;
            match best {
                Some((_, best_fitness)) if fitness <= best_fitness => {}
                _ => best = Some((slot, fitness)),
            }
        }

        best.map(|(slot, _)| slot)
            .ok_or_else_genetic(|| GeneticError::EmptyPopulation)
    }

    pub fn best(&self) -> Result<&Individual> {
        let slot = self.best_index()?;
        Ok(&self.individuals[slot])
    }

    /// Moves the individuals covered by `chunks` out of the population, one
    /// vector per chunk. Individuals before the first chunk stay in place.
    ///
    /// # Errors
    ///
    /// Returns an `Evolution` error unless the chunks are contiguous and end
    /// exactly at the end of the population.
    pub fn take_chunks(&mut self, chunks: &[Chunk]) -> Result<Vec<(Chunk, Vec<Individual>)>> {
        let Some(first) = chunks.first() else {
            return Ok(Vec::new());
        };

        let mut expected = first.start();
        for chunk in chunks {
            if chunk.start() != expected {
                return Err(GeneticError::Evolution(format!(
                    "Chunk {} does not continue at index {}",
                    chunk, expected
                )));
            }
            expected = chunk.end();
        }
        if expected != self.individuals.len() {
            return Err(GeneticError::Evolution(format!(
                "Chunks end at {} but the population holds {} individuals",
                expected,
                self.individuals.len()
            )));
        }

        let mut tail = self.individuals.split_off(first.start()).into_iter();
        Ok(chunks
            .iter()
            .map(|&chunk| (chunk, tail.by_ref().take(chunk.len()).collect()))
            .collect())
    }

    /// Appends processed chunks back in the order given.
    ///
    /// # Errors
    ///
    /// Returns an `Evolution` error if a chunk does not start at the current
    /// end of the population or carries the wrong number of individuals.
    pub fn restore_chunks<I>(&mut self, chunks: I) -> Result<()>
    where
        I: IntoIterator<Item = (Chunk, Vec<Individual>)>,
    {
        for (chunk, individuals) in chunks {
            if chunk.start() != self.individuals.len() || chunk.len() != individuals.len() {
                return Err(GeneticError::Evolution(format!(
                    "Chunk {} returned {} individuals at population length {}",
                    chunk,
                    individuals.len(),
                    self.individuals.len()
                )));
            }
            self.individuals.extend(individuals);
        }
        Ok(())
    }
}

impl std::ops::Index<usize> for Population {
    type Output = Individual;

    fn index(&self, slot: usize) -> &Individual {
        &self.individuals[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::partition;

    fn measured(genes: &[&[bool]], problem: &ProblemInstance) -> Population {
        let mut population = Population::from_individuals(
            genes
                .iter()
                .map(|g| Individual::from_genes(g.to_vec()))
                .collect(),
        );
        population.measure_all(problem);
        population
    }

    #[test]
    fn test_best_index_first_wins_ties() {
        let problem = ProblemInstance::new(vec![5, 5], vec![1, 1], 10).unwrap();
        let population = measured(
            &[&[false, false], &[true, false], &[false, true], &[false, false]],
            &problem,
        );

        assert_eq!(population.best_index().unwrap(), 1);
    }

    #[test]
    fn test_best_index_prefers_feasible() {
        let problem = ProblemInstance::new(vec![1, 100], vec![1, 50], 10).unwrap();
        let population = measured(&[&[true, true], &[true, false]], &problem);

        assert_eq!(population.best_index().unwrap(), 1);
    }

    #[test]
    fn test_best_index_errors() {
        assert_eq!(
            Population::default().best_index(),
            Err(GeneticError::EmptyPopulation)
        );

        let unmeasured = Population::from_individuals(vec![Individual::from_genes(vec![true])]);
        assert!(matches!(
            unmeasured.best_index(),
            Err(GeneticError::FitnessCalculation(_))
        ));
    }

    #[test]
    fn test_record_fitness_fills_chunk_slots() {
        let problem = ProblemInstance::new(vec![3, 4], vec![1, 1], 5).unwrap();
        let mut population = Population::from_individuals(vec![
            Individual::from_genes(vec![true, false]),
            Individual::from_genes(vec![false, true]),
            Individual::from_genes(vec![true, true]),
        ]);
        let chunk = partition(3, 1, 2).unwrap()[0];

        let values: Vec<Fitness> = population.individuals()[chunk.range()]
            .iter()
            .map(|individual| individual.evaluate(&problem))
            .collect();
        population.record_fitness(chunk, &values).unwrap();

        assert!(!population[0].is_evaluated());
        assert_eq!(population[1].fitness().unwrap(), 4);
        assert_eq!(population[2].fitness().unwrap(), 7);
        assert!(population.record_fitness(chunk, &values[..1]).is_err());
    }

    #[test]
    fn test_take_and_restore_chunks_preserve_order() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut population = Population::random(23, 6, &mut rng);
        let original = population.clone();

        let chunks = partition(23, 1, 5).unwrap();
        let taken = population.take_chunks(&chunks).unwrap();

        assert_eq!(population.len(), 1);
        assert_eq!(taken.len(), 5);
        assert_eq!(taken[4].1.len(), 2);

        population.restore_chunks(taken).unwrap();
        assert_eq!(population, original);
    }

    #[test]
    fn test_take_chunks_rejects_short_cover() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut population = Population::random(10, 3, &mut rng);
        let chunks = partition(8, 0, 4).unwrap();

        assert!(matches!(
            population.take_chunks(&chunks),
            Err(GeneticError::Evolution(_))
        ));
        assert_eq!(population.len(), 10);
    }

    #[test]
    fn test_restore_chunks_rejects_gaps() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut population = Population::random(10, 3, &mut rng);
        let chunks = partition(10, 0, 5).unwrap();
        let mut taken = population.take_chunks(&chunks).unwrap();
        taken.swap(0, 1);

        assert!(population.restore_chunks(taken).is_err());
    }
}
