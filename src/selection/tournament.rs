use crate::error::{GeneticError, Result};
use crate::individual::Individual;
use crate::rng::RandomNumberGenerator;

/// Number of contestants drawn per tournament by default.
pub const TOURNAMENT_SIZE: usize = 3;

/// A selection strategy that picks a parent through tournament selection.
///
/// Each tournament draws `tournament_size` indices uniformly and with
/// replacement, so an individual may face itself. The contestant with the
/// highest fitness wins; on equal fitness the one drawn first is kept.
///
/// # Examples
///
/// ```
/// use knapsack_ga::individual::Individual;
/// use knapsack_ga::problem::ProblemInstance;
/// use knapsack_ga::rng::RandomNumberGenerator;
/// use knapsack_ga::selection::TournamentSelection;
///
/// let problem = ProblemInstance::new(vec![1, 2, 3], vec![1, 1, 1], 10).unwrap();
/// let mut population: Vec<Individual> = (0..3)
///     .map(|item| {
///         let mut genes = vec![false; 3];
///         genes[item] = true;
///         Individual::from_genes(genes)
///     })
///     .collect();
/// population.iter_mut().for_each(|i| i.measure_fitness(&problem));
///
/// let mut rng = RandomNumberGenerator::from_seed(7);
/// let winner = TournamentSelection::default().select(&population, &mut rng).unwrap();
/// assert!(winner.fitness().unwrap() >= 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSelection {
    tournament_size: usize,
}

impl TournamentSelection {
    /// Creates a new TournamentSelection strategy with the specified tournament size.
    ///
    /// # Errors
    ///
    /// Returns an error if `tournament_size` is 0.
    pub fn new(tournament_size: usize) -> Result<Self> {
        if tournament_size < 1 {
            return Err(GeneticError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }

        Ok(Self { tournament_size })
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }

    /// Runs a single tournament over `population`.
    pub fn select<'a>(
        &self,
        population: &'a [Individual],
        rng: &mut RandomNumberGenerator,
    ) -> Result<&'a Individual> {
        tournament(rng, population, self.tournament_size)
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self {
            tournament_size: TOURNAMENT_SIZE,
        }
    }
}

/// Draws `tournament_size` contestants and returns the fittest.
///
/// # Errors
///
/// Returns `EmptyPopulation` for an empty slice, a `Configuration` error for a
/// zero tournament size and a `FitnessCalculation` error if a drawn contestant
/// has not been measured.
pub fn tournament<'a>(
    rng: &mut RandomNumberGenerator,
    population: &'a [Individual],
    tournament_size: usize,
) -> Result<&'a Individual> {
    if population.is_empty() {
        return Err(GeneticError::EmptyPopulation);
    }
    if tournament_size == 0 {
        return Err(GeneticError::Configuration(
            "Tournament size must be at least 1".to_string(),
        ));
    }

    let mut best = &population[rng.gen_index(population.len())];
    let mut best_fitness = best.fitness()?;

    for _ in 1..tournament_size {
        let other = &population[rng.gen_index(population.len())];
        let other_fitness = other.fitness()?;
        if other_fitness > best_fitness {
            best = other;
            best_fitness = other_fitness;
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ProblemInstance;

    fn ladder(size: usize) -> Vec<Individual> {
        let problem = ProblemInstance::new(
            (1..=size as u64).collect(),
            vec![0; size],
            1,
        )
        .unwrap();

        (0..size)
            .map(|item| {
                let mut genes = vec![false; size];
                genes[item] = true;
                let mut individual = Individual::from_genes(genes);
                individual.measure_fitness(&problem);
                individual
            })
            .collect()
    }

    #[test]
    fn test_tournament_returns_best_of_draws() {
        let population = ladder(10);
        let mut rng = RandomNumberGenerator::from_seed(42);
        let mut replay = RandomNumberGenerator::from_seed(42);

        for _ in 0..100 {
            let winner = tournament(&mut rng, &population, 3).unwrap();
            let draws: Vec<usize> = (0..3).map(|_| replay.gen_index(10)).collect();
            let best_drawn = draws.iter().map(|&d| population[d].fitness().unwrap()).max();

            assert_eq!(Some(winner.fitness().unwrap()), best_drawn);
        }
    }

    #[test]
    fn test_tournament_first_drawn_wins_ties() {
        let problem = ProblemInstance::new(vec![0, 0], vec![0, 0], 1).unwrap();
        let mut population = vec![
            Individual::from_genes(vec![true, false]),
            Individual::from_genes(vec![false, true]),
        ];
        population.iter_mut().for_each(|i| i.measure_fitness(&problem));

        let mut rng = RandomNumberGenerator::from_seed(9);
        let mut replay = RandomNumberGenerator::from_seed(9);

        for _ in 0..50 {
            let winner = tournament(&mut rng, &population, 3).unwrap();
            let first = replay.gen_index(2);
            replay.gen_index(2);
            replay.gen_index(2);

            assert_eq!(winner, &population[first]);
        }
    }

    #[test]
    fn test_tournament_size_one_is_random_pick() {
        let population = ladder(5);
        let mut rng = RandomNumberGenerator::from_seed(1);
        let winner = tournament(&mut rng, &population, 1).unwrap();

        assert!(population.contains(winner));
    }

    #[test]
    fn test_tournament_errors() {
        let mut rng = RandomNumberGenerator::from_seed(1);

        assert_eq!(
            tournament(&mut rng, &[], 3),
            Err(GeneticError::EmptyPopulation)
        );
        assert!(matches!(
            tournament(&mut rng, &ladder(2), 0),
            Err(GeneticError::Configuration(_))
        ));

        let unmeasured = vec![Individual::from_genes(vec![true])];
        assert!(matches!(
            tournament(&mut rng, &unmeasured, 3),
            Err(GeneticError::FitnessCalculation(_))
        ));
    }

    #[test]
    fn test_tournament_selection_invalid_size() {
        assert!(TournamentSelection::new(0).is_err());
        assert_eq!(TournamentSelection::default().tournament_size(), 3);
    }
}
