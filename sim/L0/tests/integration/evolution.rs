//! Integration tests for differential evolution over real simulation runs.

use worm_core::batch::BatchEvaluator;
use worm_core::evaluate;
use worm_evolve::{DifferentialEvolution, EvolutionConfig};
use worm_tests::short_config;
use worm_types::Parameters;

/// A tiny search completes, stays in bounds and reports a reproducible best.
#[test]
fn search_over_short_runs() {
    let config = short_config(0.02);
    let evaluator = BatchEvaluator::new(config.clone()).unwrap();
    let fitness = |p: &Parameters| evaluator.evaluate(p);

    let settings = EvolutionConfig::default().size(4, 2).seed(11);
    let report = DifferentialEvolution::new(settings).unwrap().run(&fitness);

    assert_eq!(report.generations.len(), 2);
    assert_eq!(report.evaluations, 4 + 2 * 4);
    assert!(settings.bounds.contains(&report.best));
    assert!(report.best_fitness >= 0.0);

    // Failed runs score 0, successful ones reproduce exactly
    match evaluate(&config, &report.best) {
        Ok(f) => assert_eq!(f, report.best_fitness),
        Err(_) => assert_eq!(report.best_fitness, 0.0),
    }

    let again = DifferentialEvolution::new(settings).unwrap().run(&fitness);
    assert_eq!(again, report);
}

/// Parallel batch evaluation agrees with one-at-a-time runs.
#[test]
fn batch_matches_sequential_runs() {
    let config = short_config(0.02);
    let evaluator = BatchEvaluator::new(config.clone()).unwrap();
    let candidates = [
        Parameters::default(),
        Parameters::new(3.0, -1.0, 2.0, 0.5, 1.5),
        Parameters::new(-2.0, 4.0, 0.1, 7.0, -3.0),
        Parameters::zero(),
    ];

    let batch = evaluator.evaluate_all(&candidates);
    for (params, result) in candidates.iter().zip(batch) {
        match (result, evaluate(&config, params)) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            (a, b) => panic!("batch {a:?} but sequential {b:?}"),
        }
    }
}
