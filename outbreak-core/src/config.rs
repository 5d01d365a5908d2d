//! Centralized configuration for outbreak simulations.
//!
//! Model parameters, run-control constants and batch settings live here
//! instead of being scattered through the engine.

use crate::error::{Result, SimulationError};

/// Default time increment used for the loop margin and the flat tail.
pub const DEFAULT_TAIL_INCREMENT: f64 = 0.5;

/// Total rate below which the epidemic counts as extinct.
pub const DEFAULT_EXTINCTION_THRESHOLD: f64 = 1e-6;

/// Upper bound on `horizon / step_size`, the length of the resampled grid.
pub const MAX_GRID_INTERVALS: f64 = 10_000_000.0;

/// Upper bound on `time_limit / tail_increment`, the longest possible flat tail.
pub const MAX_TAIL_ROWS: f64 = 10_000_000.0;

/// Central configuration for all outbreak components.
#[derive(Debug, Clone, Default)]
pub struct OutbreakConfig {
    /// Defaults for single runs
    pub simulation: SimulationConfig,
    /// Concurrency of batch runs
    pub batch: BatchConfig,
}

/// Parameters of a single SIR run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of nodes infected at time zero
    pub initial_infected: usize,
    /// Infection rate τ contributed by each infected neighbor
    pub infection_rate: f64,
    /// Recovery rate γ of an infected node
    pub recovery_rate: f64,
    /// Spacing of the resampled time grid
    pub step_size: f64,
    /// Time horizon Tend
    pub horizon: f64,
    /// Seed in [0, 1); a fresh one is drawn when absent
    pub seed: Option<f64>,
    /// Loop margin past the horizon and spacing of the flat tail
    pub tail_increment: f64,
    /// Total rate below which the run stops as extinct
    pub extinction_threshold: f64,
    /// Whether per-step rate and status snapshots are kept
    pub record_snapshots: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_infected: 1,
            infection_rate: 1.0,
            recovery_rate: 1.0,
            step_size: 0.5,
            horizon: 10.0,
            seed: None,
            tail_increment: DEFAULT_TAIL_INCREMENT,
            extinction_threshold: DEFAULT_EXTINCTION_THRESHOLD,
            record_snapshots: true,
        }
    }
}

impl SimulationConfig {
    /// Creates a configuration with the given model parameters and default run control.
    pub fn new(
        initial_infected: usize,
        infection_rate: f64,
        recovery_rate: f64,
        step_size: f64,
        horizon: f64,
    ) -> Self {
        Self {
            initial_infected,
            infection_rate,
            recovery_rate,
            step_size,
            horizon,
            ..Default::default()
        }
    }

    /// Creates a configuration for deterministic testing.
    pub fn deterministic_testing() -> Self {
        Self {
            seed: Some(0.42), // Fixed seed for reproducible tests
            horizon: 5.0,
            ..Default::default()
        }
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: f64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the parameters against a network of `population` nodes.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidParameter` - Initial infected count outside `1..=population`,
    ///   negative or non-finite τ, non-positive γ/dt/Tend/tail increment/extinction threshold,
    ///   a grid longer than [`MAX_GRID_INTERVALS`], a tail longer than [`MAX_TAIL_ROWS`],
    ///   or a seed outside `[0, 1)`
    pub fn validate(&self, population: usize) -> Result<()> {
        if self.initial_infected == 0 || self.initial_infected > population {
            return Err(SimulationError::invalid_parameter(format!(
                "initial infected count {} must be in 1..={population}",
                self.initial_infected
            )));
        }

        if !self.infection_rate.is_finite() || self.infection_rate < 0.0 {
            return Err(SimulationError::invalid_parameter(format!(
                "infection rate must be finite and non-negative, got {}",
                self.infection_rate
            )));
        }

        let positive = [
            ("recovery rate", self.recovery_rate),
            ("step size", self.step_size),
            ("horizon", self.horizon),
            ("tail increment", self.tail_increment),
            ("extinction threshold", self.extinction_threshold),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimulationError::invalid_parameter(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }

        let grid = self.horizon / self.step_size;
        if grid > MAX_GRID_INTERVALS {
            return Err(SimulationError::invalid_parameter(format!(
                "step size {} yields {grid:e} grid intervals over horizon {}, limit is {MAX_GRID_INTERVALS:e}",
                self.step_size, self.horizon
            )));
        }

        // Also rules out increments too small to advance the clock past the limit
        let tail_rows = self.time_limit() / self.tail_increment;
        if !tail_rows.is_finite() || tail_rows > MAX_TAIL_ROWS {
            return Err(SimulationError::invalid_parameter(format!(
                "tail increment {} is too small for time limit {}, at most {MAX_TAIL_ROWS:e} tail rows allowed",
                self.tail_increment,
                self.time_limit()
            )));
        }

        if let Some(seed) = self.seed {
            if !(0.0..1.0).contains(&seed) {
                return Err(SimulationError::invalid_parameter(format!(
                    "seed must be in [0, 1), got {seed}"
                )));
            }
        }

        Ok(())
    }

    /// Number of intervals on the resampled grid, `floor(horizon / step_size)`.
    pub fn grid_intervals(&self) -> usize {
        (self.horizon / self.step_size).floor() as usize
    }

    /// Simulated time the event loop must cover.
    pub fn time_limit(&self) -> f64 {
        self.horizon + self.tail_increment
    }
}

/// Settings for running many independent simulations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum runs executing at the same time
    pub max_concurrent_runs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: num_cpus::get().max(1),
        }
    }
}

impl OutbreakConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(seed) = std::env::var("OUTBREAK_SEED") {
            if let Ok(seed_value) = seed.parse::<f64>() {
                config.simulation.seed = Some(seed_value);
            }
        }

        if let Ok(increment) = std::env::var("OUTBREAK_TAIL_INCREMENT") {
            if let Ok(value) = increment.parse::<f64>() {
                config.simulation.tail_increment = value;
            }
        }

        if let Ok(snapshots) = std::env::var("OUTBREAK_RECORD_SNAPSHOTS") {
            config.simulation.record_snapshots = snapshots.parse().unwrap_or(true);
        }

        if let Ok(max_runs) = std::env::var("OUTBREAK_MAX_CONCURRENT_RUNS") {
            if let Ok(count) = max_runs.parse::<usize>() {
                config.batch.max_concurrent_runs = count.max(1);
            }
        }

        config
    }

    /// Creates a configuration with a fixed seed and two concurrent runs.
    pub fn for_testing() -> Self {
        Self {
            simulation: SimulationConfig::deterministic_testing(),
            batch: BatchConfig {
                max_concurrent_runs: 2,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = OutbreakConfig::default();

        assert_eq!(config.simulation.tail_increment, 0.5);
        assert_eq!(config.simulation.extinction_threshold, 1e-6);
        assert!(config.simulation.record_snapshots);
        assert_eq!(config.simulation.seed, None);
        assert!(config.batch.max_concurrent_runs >= 1);
    }

    #[test]
    fn test_validate_accepts_defaults_and_zero_tau() {
        let mut config = SimulationConfig::deterministic_testing();
        assert!(config.validate(4).is_ok());

        config.infection_rate = 0.0;
        assert!(config.validate(4).is_ok());
    }

    #[test]
    fn test_validate_initial_infected_range() {
        let config = SimulationConfig::new(0, 1.0, 1.0, 0.5, 5.0);
        assert!(config.validate(4).is_err());

        let config = SimulationConfig::new(5, 1.0, 1.0, 0.5, 5.0);
        assert!(config.validate(4).is_err());

        let config = SimulationConfig::new(4, 1.0, 1.0, 0.5, 5.0);
        assert!(config.validate(4).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_rates() {
        let base = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0);

        let cases = [
            SimulationConfig {
                infection_rate: -1.0,
                ..base.clone()
            },
            SimulationConfig {
                recovery_rate: 0.0,
                ..base.clone()
            },
            SimulationConfig {
                step_size: -0.5,
                ..base.clone()
            },
            SimulationConfig {
                horizon: f64::NAN,
                ..base.clone()
            },
            SimulationConfig {
                tail_increment: 0.0,
                ..base.clone()
            },
            SimulationConfig {
                extinction_threshold: 0.0,
                ..base.clone()
            },
            SimulationConfig {
                seed: Some(1.0),
                ..base.clone()
            },
        ];

        for config in cases {
            assert!(
                matches!(
                    config.validate(4),
                    Err(SimulationError::InvalidParameter { .. })
                ),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_tail_increment_absorbed_by_horizon() {
        let config = SimulationConfig {
            tail_increment: 1e-16,
            ..SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0)
        };
        assert_eq!(config.time_limit() + config.tail_increment, config.time_limit());
        assert!(matches!(
            config.validate(4),
            Err(SimulationError::InvalidParameter { .. })
        ));

        let config = SimulationConfig {
            tail_increment: 0.5,
            ..SimulationConfig::new(1, 1.0, 1.0, 1e299, 1e300)
        };
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_grid() {
        let config = SimulationConfig::new(1, 1.0, 1.0, 1e-300, 5.0);
        assert!(matches!(
            config.validate(4),
            Err(SimulationError::InvalidParameter { .. })
        ));

        let config = SimulationConfig::new(1, 1.0, 1.0, 1e-6, 5.0);
        assert!(config.validate(4).is_ok());
    }

    #[test]
    fn test_for_testing_preset_is_valid() {
        let config = OutbreakConfig::for_testing();
        assert_eq!(config.simulation.seed, Some(0.42));
        assert_eq!(config.batch.max_concurrent_runs, 2);
        assert!(config.simulation.validate(4).is_ok());
    }

    #[test]
    fn test_grid_intervals() {
        let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0);
        assert_eq!(config.grid_intervals(), 10);
        assert_eq!(config.time_limit(), 5.5);

        let config = SimulationConfig::new(1, 1.0, 1.0, 2.0, 5.0);
        assert_eq!(config.grid_intervals(), 2);
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("OUTBREAK_SEED", "0.25");
            std::env::set_var("OUTBREAK_TAIL_INCREMENT", "0.1");
            std::env::set_var("OUTBREAK_RECORD_SNAPSHOTS", "false");
            std::env::set_var("OUTBREAK_MAX_CONCURRENT_RUNS", "3");
        }

        let config = OutbreakConfig::from_env();

        assert_eq!(config.simulation.seed, Some(0.25));
        assert_eq!(config.simulation.tail_increment, 0.1);
        assert!(!config.simulation.record_snapshots);
        assert_eq!(config.batch.max_concurrent_runs, 3);

        // Cleanup
        unsafe {
            std::env::remove_var("OUTBREAK_SEED");
            std::env::remove_var("OUTBREAK_TAIL_INCREMENT");
            std::env::remove_var("OUTBREAK_RECORD_SNAPSHOTS");
            std::env::remove_var("OUTBREAK_MAX_CONCURRENT_RUNS");
        }
    }
}
