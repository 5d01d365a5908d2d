//! Independent repetitions of a simulation on a worker pool.
//!
//! Each run owns its own seeded random source and state; only the network
//! is shared, read-only, behind an `Arc`.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::{BatchConfig, SimulationConfig};
use crate::error::{Result, SimulationError};
use crate::network::ContactNetwork;
use crate::resample::SimulationResults;
use crate::rng::{RandomSource, SeededRng};
use crate::simulation::{RunSummary, Simulation};

/// Output of one run in a batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Seed the run was started with
    pub seed: f64,
    /// Completion signal of the run
    pub summary: RunSummary,
    /// Raw and interpolated series of the run
    pub results: SimulationResults,
}

/// Runs many seeds of the same configuration concurrently.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    max_concurrent_runs: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(&BatchConfig::default())
    }
}

impl BatchRunner {
    /// Creates a runner bounded by `config.max_concurrent_runs`, at least one.
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            max_concurrent_runs: config.max_concurrent_runs.max(1),
        }
    }

    /// Runs one simulation per seed and returns outcomes in seed order.
    ///
    /// Runs execute on the blocking thread pool, at most
    /// `max_concurrent_runs` at a time. The seed in `config` is ignored.
    /// A failing run does not stop the others.
    pub async fn run(
        &self,
        network: Arc<ContactNetwork>,
        config: &SimulationConfig,
        seeds: &[f64],
    ) -> Vec<Result<BatchOutcome>> {
        info!(
            "Starting batch of {} runs ({} concurrent)",
            seeds.len(),
            self.max_concurrent_runs
        );
        let permits = Arc::new(Semaphore::new(self.max_concurrent_runs));

        let handles: Vec<_> = seeds
            .iter()
            .map(|&seed| {
                let network = Arc::clone(&network);
                let config = config.clone().with_seed(seed);
                let permits = Arc::clone(&permits);
                tokio::spawn(run_with_permit(permits, network, config, seed))
            })
            .collect();

        futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(SimulationError::TaskFailed {
                        reason: e.to_string(),
                    })
                })
            })
            .collect()
    }
}

async fn run_with_permit(
    permits: Arc<Semaphore>,
    network: Arc<ContactNetwork>,
    config: SimulationConfig,
    seed: f64,
) -> Result<BatchOutcome> {
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|e| SimulationError::TaskFailed {
            reason: e.to_string(),
        })?;

    tokio::task::spawn_blocking(move || run_single(network, config, seed))
        .await
        .map_err(|e| SimulationError::TaskFailed {
            reason: e.to_string(),
        })?
}

fn run_single(
    network: Arc<ContactNetwork>,
    config: SimulationConfig,
    seed: f64,
) -> Result<BatchOutcome> {
    let mut simulation = Simulation::new(network, config)?;
    let summary = simulation.run_to_completion()?;
    debug!("Batch run with seed {} finished: {}", seed, summary.termination);
    Ok(BatchOutcome {
        seed,
        summary,
        results: simulation.into_results()?,
    })
}

/// Derives `count` reproducible run seeds from one master seed.
pub fn derive_seeds(master_seed: f64, count: usize) -> Vec<f64> {
    let mut rng = SeededRng::from_seed(master_seed);
    (0..count).map(|_| rng.uniform()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutbreakConfig;

    fn ring(n: usize) -> Arc<ContactNetwork> {
        let edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        Arc::new(ContactNetwork::from_edges(n, &edges).unwrap())
    }

    #[test]
    fn test_derive_seeds_reproducible() {
        let seeds1 = derive_seeds(0.9, 5);
        let seeds2 = derive_seeds(0.9, 5);

        assert_eq!(seeds1, seeds2);
        assert_eq!(seeds1.len(), 5);
        assert!(seeds1.iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[tokio::test]
    async fn test_batch_matches_sequential_runs() {
        let network = ring(8);
        let OutbreakConfig {
            simulation: config,
            batch,
        } = OutbreakConfig::for_testing();
        let seeds = derive_seeds(0.3, 4);

        let runner = BatchRunner::new(&batch);
        let outcomes = runner.run(Arc::clone(&network), &config, &seeds).await;
        assert_eq!(outcomes.len(), 4);

        for (outcome, &seed) in outcomes.into_iter().zip(&seeds) {
            let outcome = outcome.unwrap();
            assert_eq!(outcome.seed, seed);

            let mut sequential =
                Simulation::new(Arc::clone(&network), config.clone().with_seed(seed)).unwrap();
            sequential.simulate().await.unwrap();
            assert_eq!(&outcome.results, sequential.results().unwrap());
        }
    }

    #[tokio::test]
    async fn test_batch_reports_invalid_config_per_run() {
        let config = SimulationConfig::new(10, 1.0, 1.0, 0.5, 2.0);
        let outcomes = BatchRunner::default()
            .run(ring(4), &config, &[0.1, 0.2])
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|outcome| matches!(
            outcome,
            Err(SimulationError::InvalidParameter { .. })
        )));
    }
}
