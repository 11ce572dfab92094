use std::sync::Arc;

use knapsack_ga::{
    chunk::{partition, Chunk},
    dispatch::{collect_outcomes, ChunkExecutor, Dispatcher, DispatcherKind},
    error::GeneticError,
    individual::Individual,
    population::Population,
    problem::ProblemInstance,
    rng::RandomNumberGenerator,
};

const POP_SIZE: usize = 20;
const WORKERS: usize = 4;
const CHUNK_SIZE: usize = 5;

fn evaluate_with(dispatcher: &Dispatcher, population: &mut Population, problem: &Arc<ProblemInstance>) {
    let chunks = partition(population.len(), 0, CHUNK_SIZE).unwrap();
    let work = population.take_chunks(&chunks).unwrap();
    let problem = Arc::clone(problem);

    let outcomes = dispatcher.execute(work, move |_, mut individuals: Vec<Individual>| {
        individuals
            .iter_mut()
            .for_each(|individual| individual.measure_fitness(&problem));
        Ok(individuals)
    });

    population.restore_chunks(collect_outcomes(outcomes).unwrap()).unwrap();
}

#[test]
fn test_every_dispatcher_matches_sequential_evaluation() {
    let problem = Arc::new(ProblemInstance::with_gene_size(1, 30, 400));
    let mut rng = RandomNumberGenerator::from_seed(12);
    let original = Population::random(POP_SIZE, 30, &mut rng);

    let mut expected = original.clone();
    expected.measure_all(&problem);

    for kind in DispatcherKind::ALL {
        let dispatcher = Dispatcher::new(kind, WORKERS).unwrap();
        let mut population = original.clone();

        evaluate_with(&dispatcher, &mut population, &problem);

        assert_eq!(population, expected, "dispatcher {}", kind);
        assert_eq!(dispatcher.kind(), kind);
    }
}

#[test]
fn test_dispatchers_are_reusable_across_phases() {
    let problem = Arc::new(ProblemInstance::with_gene_size(2, 30, 400));
    let mut rng = RandomNumberGenerator::from_seed(3);

    for kind in DispatcherKind::ALL {
        let dispatcher = Dispatcher::new(kind, WORKERS).unwrap();

        for _ in 0..10 {
            let mut population = Population::random(POP_SIZE, 30, &mut rng);
            evaluate_with(&dispatcher, &mut population, &problem);
            assert!(population.iter().all(Individual::is_evaluated));
        }
    }
}

#[test]
fn test_failing_chunk_is_reported_with_its_range() {
    for kind in DispatcherKind::ALL {
        let dispatcher = Dispatcher::new(kind, WORKERS).unwrap();
        let chunks = partition(POP_SIZE, 0, CHUNK_SIZE).unwrap();
        let work: Vec<(Chunk, ())> = chunks.iter().map(|&chunk| (chunk, ())).collect();

        let outcomes = dispatcher.execute(work, |chunk, ()| {
            if chunk.start() == 10 {
                return Err(GeneticError::FitnessCalculation("bad slot".to_string()));
            }
            Ok(chunk.len())
        });

        assert_eq!(outcomes.len(), 4);
        for outcome in &outcomes {
            if outcome.chunk.start() == 10 {
                match &outcome.result {
                    Err(GeneticError::Dispatch { start, end, reason }) => {
                        assert_eq!((*start, *end), (10, 15));
                        assert!(reason.contains("bad slot"), "dispatcher {}", kind);
                    }
                    other => panic!("Expected Dispatch error from {}, got {:?}", kind, other),
                }
            } else {
                assert_eq!(outcome.result, Ok(5));
            }
        }

        assert!(matches!(
            collect_outcomes(outcomes),
            Err(GeneticError::Dispatch { start: 10, end: 15, .. })
        ));
    }
}

#[test]
fn test_panicking_chunk_is_reported_and_dispatcher_survives() {
    for kind in DispatcherKind::ALL {
        let dispatcher = Dispatcher::new(kind, WORKERS).unwrap();
        let chunks = partition(POP_SIZE, 0, CHUNK_SIZE).unwrap();
        let work: Vec<(Chunk, ())> = chunks.iter().map(|&chunk| (chunk, ())).collect();

        let outcomes = dispatcher.execute(work, |chunk, ()| {
            if chunk.start() == 5 {
                panic!("slot 5 exploded");
            }
            Ok(chunk.start())
        });

        match collect_outcomes(outcomes) {
            Err(GeneticError::Dispatch { start, end, reason }) => {
                assert_eq!((start, end), (5, 10));
                assert!(reason.contains("slot 5 exploded"), "dispatcher {}", kind);
            }
            other => panic!("Expected Dispatch error from {}, got {:?}", kind, other),
        }

        let work: Vec<(Chunk, ())> = chunks.iter().map(|&chunk| (chunk, ())).collect();
        let retry = collect_outcomes(dispatcher.execute(work, |chunk, ()| Ok(chunk.end()))).unwrap();
        let ends: Vec<usize> = retry.into_iter().map(|(_, end)| end).collect();
        assert_eq!(ends, vec![5, 10, 15, 20]);
    }
}
