//! Outbreak Core - Stochastic SIR epidemics on contact networks.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Simulates infection spread over a fixed network as a continuous-time
//! Markov chain using Gillespie's stochastic simulation algorithm, then
//! resamples the event trajectory onto a uniform time grid.
//!
//! # Features
//!
//! - **Exact event timing**: exponential waiting times from the total rate
//! - **Deterministic Execution**: same seed always produces identical results
//! - **Invariant Checking**: population and monotonicity checked every event
//! - **Batch Runs**: independent seeds on a bounded worker pool
//!
//! # Example
//!
//! ```rust,no_run
//! use outbreak_core::{Simulation, SimulationConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adjacency = vec![
//!     vec![0, 1, 0, 0],
//!     vec![1, 0, 1, 0],
//!     vec![0, 1, 0, 1],
//!     vec![0, 0, 1, 0],
//! ];
//! let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0).with_seed(0.42);
//!
//! let mut sim = Simulation::from_adjacency(&adjacency, config)?;
//! let summary = sim.simulate().await?;
//! println!("{summary}");
//!
//! for row in &sim.results()?.interpolated {
//!     println!("{:.1} S={} I={} R={}", row.time, row.susceptible, row.infected, row.recovered);
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod invariants;
pub mod network;
pub mod resample;
pub mod rng;
pub mod simulation;
pub mod state;
pub mod tracing_setup;
pub mod trajectory;

pub use batch::{BatchOutcome, BatchRunner, derive_seeds};
pub use config::{BatchConfig, OutbreakConfig, SimulationConfig};
pub use error::{Result, SimulationError};
pub use invariants::{
    Invariant, InvariantViolation, NoReinfection, PopulationConservation, StrictlyIncreasingTime,
};
pub use network::ContactNetwork;
pub use resample::{InterpolatedResultRow, RawResultRow, SimulationResults};
pub use rng::{RandomSource, SeededRng};
pub use simulation::{RunSummary, Simulation, Termination};
pub use state::{NodeStatus, SimulationState, Transition};
pub use trajectory::{Counts, Trajectory};
