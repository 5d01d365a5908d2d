//! Independent runs sharing one network across worker threads.

use std::sync::Arc;

use outbreak_core::{BatchConfig, BatchRunner, SimulationConfig, derive_seeds};

use crate::support::{ring, run};

#[tokio::test]
async fn test_batch_outcomes_match_single_runs() {
    let network = Arc::new(ring(20));
    let config = SimulationConfig::new(2, 1.0, 0.7, 0.5, 6.0);
    let seeds = derive_seeds(0.25, 6);

    let runner = BatchRunner::new(&BatchConfig {
        max_concurrent_runs: 3,
    });
    let outcomes = runner.run(Arc::clone(&network), &config, &seeds).await;

    assert_eq!(outcomes.len(), seeds.len());
    for (outcome, &seed) in outcomes.iter().zip(&seeds) {
        let outcome = outcome.as_ref().unwrap();
        assert_eq!(outcome.seed, seed);
        assert_eq!(outcome.summary.seed, seed);

        let single = run(ring(20), config.clone().with_seed(seed));
        assert_eq!(&outcome.results, single.results().unwrap());
    }
}

#[tokio::test]
async fn test_batch_is_reproducible() {
    let network = Arc::new(ring(12));
    let config = SimulationConfig::new(1, 1.5, 1.0, 0.5, 4.0);
    let seeds = derive_seeds(0.5, 4);
    let runner = BatchRunner::default();

    let first = runner.run(Arc::clone(&network), &config, &seeds).await;
    let second = runner.run(network, &config, &seeds).await;

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.as_ref().unwrap().results, b.as_ref().unwrap().results);
    }
}

#[tokio::test]
async fn test_empty_batch() {
    let outcomes = BatchRunner::default()
        .run(
            Arc::new(ring(5)),
            &SimulationConfig::new(1, 1.0, 1.0, 0.5, 2.0),
            &[],
        )
        .await;
    assert!(outcomes.is_empty());
}
