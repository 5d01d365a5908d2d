//! Gillespie event loop over the contact network.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::invariants::{
    Invariant, InvariantViolation, NoReinfection, PopulationConservation, StrictlyIncreasingTime,
};
use crate::network::ContactNetwork;
use crate::resample::SimulationResults;
use crate::rng::{RandomSource, SeededRng};
use crate::state::{NodeStatus, SimulationState, Transition};
use crate::trajectory::{Counts, Trajectory};

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Simulated time passed the horizon plus the tail increment
    HorizonReached,
    /// Total rate fell below the extinction threshold
    Extinct,
    /// Positive total rate, but rounding left the weighted scan without a node
    NoEventSelected,
}

impl Termination {
    /// Returns true for every early stop; the trajectory then gets a flat tail.
    pub fn is_extinction(self) -> bool {
        matches!(self, Termination::Extinct | Termination::NoEventSelected)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::HorizonReached => write!(f, "horizon reached"),
            Termination::Extinct => write!(f, "extinct"),
            Termination::NoEventSelected => write!(f, "no event selected"),
        }
    }
}

/// Completion signal of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Seed used for reproduction
    pub seed: f64,
    /// Wall-clock time spent in the event loop and resampling
    pub elapsed: Duration,
    /// Why the event loop stopped
    pub termination: Termination,
    /// Number of events applied
    pub events: usize,
    /// Susceptible → Infected events
    pub infections: usize,
    /// Infected → Recovered events
    pub recoveries: usize,
    /// Counts at the last recorded step
    pub final_counts: Counts,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Simulation completed in {:.3} ms with seed {}",
            self.elapsed.as_secs_f64() * 1000.0,
            self.seed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    Ready,
    Completed,
    Failed,
}

/// One stochastic SIR run on a fixed network.
///
/// State, rates and step-0 histories are built at construction; the event
/// loop runs once through [`simulate`](Self::simulate), after which the
/// object is read-only and the results are cached.
pub struct Simulation<R: RandomSource = SeededRng> {
    network: Arc<ContactNetwork>,
    config: SimulationConfig,
    rng: R,
    state: SimulationState,
    trajectory: Trajectory,
    /// Selected node per step; `None` marks a scan that selected nothing
    event_history: Vec<Option<usize>>,
    rate_history: Vec<Vec<f64>>,
    status_history: Vec<Vec<NodeStatus>>,
    invariants: Vec<Arc<dyn Invariant>>,
    phase: RunPhase,
    summary: Option<RunSummary>,
    results: Option<SimulationResults>,
}

impl Simulation<SeededRng> {
    /// Creates a simulation seeded from `config.seed`, or from a fresh seed when absent.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidParameter` - Configuration does not fit the network
    pub fn new(
        network: impl Into<Arc<ContactNetwork>>,
        config: SimulationConfig,
    ) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(SeededRng::fresh_seed);
        Self::with_source(network, config, SeededRng::from_seed(seed))
    }

    /// Validates an adjacency matrix and creates a simulation over it.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidParameter` - Malformed matrix or invalid configuration
    pub fn from_adjacency(matrix: &[Vec<u8>], config: SimulationConfig) -> Result<Self> {
        Self::new(ContactNetwork::from_adjacency(matrix)?, config)
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Creates a simulation drawing all randomness from `rng`.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidParameter` - Configuration does not fit the network
    pub fn with_source(
        network: impl Into<Arc<ContactNetwork>>,
        config: SimulationConfig,
        mut rng: R,
    ) -> Result<Self> {
        let network = network.into();
        config.validate(network.len())?;

        let state = SimulationState::initialize(
            &network,
            config.initial_infected,
            config.infection_rate,
            config.recovery_rate,
            &mut rng,
        );
        let trajectory = Trajectory::starting_at(state.counts());

        let mut simulation = Self {
            network,
            config,
            rng,
            state,
            trajectory,
            event_history: Vec::new(),
            rate_history: Vec::new(),
            status_history: Vec::new(),
            invariants: vec![
                Arc::new(PopulationConservation),
                Arc::new(NoReinfection),
                Arc::new(StrictlyIncreasingTime),
            ],
            phase: RunPhase::Ready,
            summary: None,
            results: None,
        };
        simulation.record_snapshot();
        Ok(simulation)
    }

    /// Adds an invariant checked after every event.
    pub fn add_invariant(&mut self, invariant: Arc<dyn Invariant>) {
        self.invariants.push(invariant);
    }

    /// Runs the event loop to completion.
    ///
    /// The body is synchronous; the async signature only lets callers await
    /// the run alongside other work. A simulation runs at most once.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidState` - Simulation was already run
    /// - `SimulationError::InvariantViolated` - Internal invariant broke; the run is abandoned
    pub async fn simulate(&mut self) -> Result<RunSummary> {
        self.run_to_completion()
    }

    /// Synchronous body of [`simulate`](Self::simulate).
    ///
    /// # Errors
    ///
    /// Same as [`simulate`](Self::simulate).
    pub fn run_to_completion(&mut self) -> Result<RunSummary> {
        if self.phase != RunPhase::Ready {
            return Err(SimulationError::invalid_state(
                "simulation has already been run and cannot be restarted",
            ));
        }

        let started = Instant::now();
        info!(
            "Starting simulation: seed={}, nodes={}, initial_infected={}, horizon={}",
            self.seed(),
            self.network.len(),
            self.config.initial_infected,
            self.config.horizon
        );

        let outcome = self.execute_events();
        let (termination, infections, recoveries) = match outcome {
            Ok(outcome) => outcome,
            Err(violation) => {
                warn!("Simulation aborted: {}", violation);
                self.phase = RunPhase::Failed;
                return Err(violation.into());
            }
        };

        if termination.is_extinction() {
            let appended = self
                .trajectory
                .extend_tail(self.config.time_limit(), self.config.tail_increment);
            debug!("Epidemic ended early ({}), appended {} tail rows", termination, appended);
        }

        self.results = Some(SimulationResults::from_trajectory(
            &self.trajectory,
            self.config.step_size,
            self.config.grid_intervals(),
        ));

        let summary = RunSummary {
            seed: self.seed(),
            elapsed: started.elapsed(),
            termination,
            events: infections + recoveries,
            infections,
            recoveries,
            final_counts: self.state.counts(),
        };
        info!("{} ({}, {} events)", summary, termination, summary.events);

        self.phase = RunPhase::Completed;
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Gillespie loop: draws waiting times and events until the horizon or extinction.
    fn execute_events(
        &mut self,
    ) -> std::result::Result<(Termination, usize, usize), InvariantViolation> {
        let limit = self.config.time_limit();
        let mut time = 0.0;
        let mut infections = 0;
        let mut recoveries = 0;

        let termination = loop {
            if time > limit {
                break Termination::HorizonReached;
            }

            let total_rate = self.state.total_rate();
            if total_rate < self.config.extinction_threshold {
                debug!("Total rate {} below threshold at time {}", total_rate, time);
                break Termination::Extinct;
            }

            let event_time = time + self.rng.exponential(total_rate);
            let threshold = self.rng.uniform() * total_rate;

            let Some(node) = self.state.select_node(threshold) else {
                debug!(
                    "Weighted scan selected no node (threshold {}, total rate {})",
                    threshold, total_rate
                );
                self.event_history.push(None);
                break Termination::NoEventSelected;
            };
            self.event_history.push(Some(node));

            match self.state.apply_event(node, &self.network) {
                Some(Transition::Infection { .. }) => infections += 1,
                Some(Transition::Recovery { .. }) => recoveries += 1,
                None => {
                    return Err(InvariantViolation {
                        invariant: "RecoveredNeverSelected".to_string(),
                        description: format!("recovered node {node} was selected for an event"),
                        step: self.trajectory.len(),
                    });
                }
            }
            trace!("t={:.6}: event at node {}", event_time, node);

            self.trajectory.push(event_time, self.state.counts());
            self.record_snapshot();
            self.check_invariants()?;

            time = event_time;
        };

        Ok((termination, infections, recoveries))
    }

    fn record_snapshot(&mut self) {
        if self.config.record_snapshots {
            self.rate_history.push(self.state.rates().to_vec());
            self.status_history.push(self.state.statuses().to_vec());
        }
    }

    fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        let population = self.network.len();
        for invariant in &self.invariants {
            invariant.check(&self.trajectory, population)?;
        }
        Ok(())
    }

    /// Returns both result views.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidState` - Run has not completed yet
    pub fn results(&self) -> Result<&SimulationResults> {
        self.results.as_ref().ok_or_else(|| {
            SimulationError::invalid_state(
                "simulation has not completed; await simulate() before reading results",
            )
        })
    }

    /// Consumes the simulation and returns its results.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidState` - Run has not completed yet
    pub fn into_results(self) -> Result<SimulationResults> {
        self.results.ok_or_else(|| {
            SimulationError::invalid_state(
                "simulation has not completed; await simulate() before reading results",
            )
        })
    }

    /// Returns the seed used for this simulation.
    pub fn seed(&self) -> f64 {
        self.rng.seed()
    }

    /// Configuration the run was built with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Shared contact network.
    pub fn network(&self) -> &Arc<ContactNetwork> {
        &self.network
    }

    /// Returns true once the run finished successfully.
    pub fn is_complete(&self) -> bool {
        self.phase == RunPhase::Completed
    }

    /// Summary of the completed run.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Why the run stopped, once it has completed.
    pub fn termination(&self) -> Option<Termination> {
        self.summary.as_ref().map(|summary| summary.termination)
    }

    /// Per-step S/I/R/T trajectory, including any flat tail.
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Node selected at each event step.
    pub fn event_history(&self) -> &[Option<usize>] {
        &self.event_history
    }

    /// Rate vector after each event, starting with the initial one.
    ///
    /// Empty when snapshots are disabled.
    pub fn rate_history(&self) -> &[Vec<f64>] {
        &self.rate_history
    }

    /// Node statuses after each event, starting with the initial ones.
    ///
    /// Empty when snapshots are disabled.
    pub fn status_history(&self) -> &[Vec<NodeStatus>] {
        &self.status_history
    }

    /// Current node statuses.
    pub fn statuses(&self) -> &[NodeStatus] {
        self.state.statuses()
    }

    /// Current rate vector.
    pub fn rates(&self) -> &[f64] {
        self.state.rates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays fixed uniform draws; exponential draws are a constant wait.
    struct ScriptedSource {
        uniforms: Vec<f64>,
        next: usize,
        wait: f64,
    }

    impl ScriptedSource {
        fn new(uniforms: Vec<f64>, wait: f64) -> Self {
            Self {
                uniforms,
                next: 0,
                wait,
            }
        }
    }

    impl RandomSource for ScriptedSource {
        fn seed(&self) -> f64 {
            0.0
        }

        fn uniform(&mut self) -> f64 {
            let value = self.uniforms[self.next % self.uniforms.len()];
            self.next += 1;
            value
        }

        fn exponential(&mut self, _rate: f64) -> f64 {
            self.wait
        }

        fn shuffle<T>(&mut self, _items: &mut [T]) {}
    }

    fn path(n: usize) -> ContactNetwork {
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        ContactNetwork::from_edges(n, &edges).unwrap()
    }

    #[test]
    fn test_simulation_initialization() {
        let config = SimulationConfig::deterministic_testing();
        let sim = Simulation::new(path(4), config).unwrap();

        assert_eq!(sim.seed(), 0.42);
        assert!(!sim.is_complete());
        assert_eq!(sim.trajectory().len(), 1);
        assert_eq!(sim.rate_history().len(), 1);
        assert_eq!(sim.status_history().len(), 1);
        assert!(sim.event_history().is_empty());
    }

    #[tokio::test]
    async fn test_results_before_run_fail() {
        let sim = Simulation::new(path(4), SimulationConfig::deterministic_testing()).unwrap();

        assert!(matches!(
            sim.results(),
            Err(SimulationError::InvalidState { .. })
        ));
        assert!(sim.termination().is_none());
    }

    #[test]
    fn test_simulation_cannot_restart() {
        let mut sim = Simulation::new(path(4), SimulationConfig::deterministic_testing()).unwrap();

        tokio_test::block_on(sim.simulate()).unwrap();
        assert!(sim.is_complete());
        assert!(matches!(
            tokio_test::block_on(sim.simulate()),
            Err(SimulationError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_scripted_run_follows_weighted_choice() {
        // Path 0-1-2 with node 0 infected (no shuffle), τ=1, γ=1.
        // Rates [1, 1, 0]: u=0.75 -> threshold 1.5 -> node 1 infected.
        // Rates [1, 1, 1]: u=0.0 -> node 0 recovers.
        // Rates [0, 1, 1]: u=0.9 -> threshold 1.8 -> node 2 infected.
        let source = ScriptedSource::new(vec![0.75, 0.0, 0.9, 0.0, 0.0], 0.1);
        let config = SimulationConfig {
            initial_infected: 1,
            infection_rate: 1.0,
            recovery_rate: 1.0,
            step_size: 0.5,
            horizon: 1.0,
            ..Default::default()
        };
        let mut sim = Simulation::with_source(path(3), config, source).unwrap();
        let summary = sim.run_to_completion().unwrap();

        assert_eq!(
            &sim.event_history()[..3],
            &[Some(1), Some(0), Some(2)]
        );
        assert_eq!(sim.rate_history()[1], vec![1.0, 1.0, 1.0]);
        assert_eq!(sim.rate_history()[2], vec![0.0, 1.0, 1.0]);
        // Then node 1 and node 2 recover (u=0.0 picks the first positive rate).
        assert_eq!(summary.final_counts.recovered, 3);
        assert_eq!(summary.termination, Termination::Extinct);
        assert_eq!(summary.infections, 2);
        assert_eq!(summary.recoveries, 3);
    }

    #[test]
    fn test_degenerate_scan_ends_like_extinction() {
        // Draws are in [0, 1), and the scan sums rates in the same order as the
        // total, so no legal draw reaches this branch. A draw of exactly 1.0
        // stands in for rounding that leaves the threshold at the total rate.
        let source = ScriptedSource::new(vec![1.0], 0.1);
        let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 2.0);
        let mut sim = Simulation::with_source(path(3), config, source).unwrap();

        let summary = sim.run_to_completion().unwrap();

        assert_eq!(summary.termination, Termination::NoEventSelected);
        assert!(summary.termination.is_extinction());
        assert_eq!(sim.event_history(), &[None]);
        assert_eq!(summary.events, 0);

        // Flat tail from time zero past horizon + increment.
        let trajectory = sim.trajectory();
        assert!(trajectory.last_time().unwrap() > 2.5);
        assert!(trajectory.infected().iter().all(|&i| i == 1));
        assert_eq!(sim.results().unwrap().interpolated.len(), 5);
    }

    #[test]
    fn test_zero_extinction_threshold_is_rejected() {
        // With a zero threshold a burnt-out run would reach the scan with no
        // positive rate and stop as NoEventSelected instead of Extinct.
        let config = SimulationConfig {
            extinction_threshold: 0.0,
            ..SimulationConfig::new(1, 0.0, 1.0, 0.5, 2.0).with_seed(0.42)
        };
        assert!(matches!(
            Simulation::new(path(3), config.clone()),
            Err(SimulationError::InvalidParameter { .. })
        ));

        let config = SimulationConfig {
            extinction_threshold: 1e-12,
            ..config
        };
        let mut sim = Simulation::new(path(3), config).unwrap();
        let summary = sim.run_to_completion().unwrap();
        assert_eq!(summary.termination, Termination::Extinct);
        assert_eq!(sim.event_history().len(), 1);
        assert!(sim.event_history()[0].is_some());
    }

    #[test]
    fn test_horizon_reached_keeps_last_event_past_limit() {
        let source = ScriptedSource::new(vec![0.0], 0.4);
        let config = SimulationConfig {
            initial_infected: 4,
            horizon: 1.0,
            ..Default::default()
        };
        // Four isolated infected nodes recovering at t = 0.4, 0.8, 1.2, 1.6.
        let network = ContactNetwork::from_edges(4, &[]).unwrap();
        let mut sim = Simulation::with_source(network, config, source).unwrap();

        let summary = sim.run_to_completion().unwrap();

        assert_eq!(summary.termination, Termination::HorizonReached);
        assert_eq!(summary.recoveries, 4);
        assert!(sim.trajectory().last_time().unwrap() > 1.5);
    }

    #[test]
    fn test_snapshots_can_be_disabled() {
        let config = SimulationConfig {
            record_snapshots: false,
            ..SimulationConfig::deterministic_testing()
        };
        let mut sim = Simulation::new(path(5), config).unwrap();
        sim.run_to_completion().unwrap();

        assert!(sim.rate_history().is_empty());
        assert!(sim.status_history().is_empty());
        assert!(!sim.event_history().is_empty());
    }

    #[test]
    fn test_custom_invariant_aborts_run() {
        struct NeverInfected;

        impl Invariant for NeverInfected {
            fn check(
                &self,
                trajectory: &Trajectory,
                _population: usize,
            ) -> std::result::Result<(), InvariantViolation> {
                match trajectory.last_counts() {
                    Some(counts) if counts.infected > 1 => Err(self.violation(
                        trajectory.len() - 1,
                        "second infection".to_string(),
                    )),
                    _ => Ok(()),
                }
            }

            fn name(&self) -> &str {
                "NeverInfected"
            }
        }

        // u=0.0 always picks node 0 first, which is susceptible with rate 1.
        let source = ScriptedSource::new(vec![0.0], 0.1);
        let mut sim = Simulation::with_source(
            ContactNetwork::from_edges(2, &[(0, 1)]).unwrap(),
            SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0),
            ScriptedStart::infect_last(source),
        )
        .unwrap();
        sim.add_invariant(Arc::new(NeverInfected));

        let result = sim.run_to_completion();
        assert!(matches!(result, Err(SimulationError::InvariantViolated(_))));
        assert!(!sim.is_complete());
        assert!(sim.results().is_err());
        assert!(sim.run_to_completion().is_err());
    }

    /// Wraps a scripted source and reverses the initial status vector.
    struct ScriptedStart {
        inner: ScriptedSource,
    }

    impl ScriptedStart {
        fn infect_last(inner: ScriptedSource) -> Self {
            Self { inner }
        }
    }

    impl RandomSource for ScriptedStart {
        fn seed(&self) -> f64 {
            self.inner.seed()
        }

        fn uniform(&mut self) -> f64 {
            self.inner.uniform()
        }

        fn exponential(&mut self, rate: f64) -> f64 {
            self.inner.exponential(rate)
        }

        fn shuffle<T>(&mut self, items: &mut [T]) {
            items.reverse();
        }
    }
}
