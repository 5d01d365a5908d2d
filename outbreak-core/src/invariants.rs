//! Invariant checking framework for trajectory validation.

use std::fmt;

use crate::trajectory::Trajectory;

/// Violation of a trajectory invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: String,
    /// Detailed description of the violation
    pub description: String,
    /// Step at which the violation was detected
    pub step: usize,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invariant '{}' violated at step {}: {}",
            self.invariant, self.step, self.description
        )
    }
}

/// Trait for checking invariants on the newest step of a trajectory.
pub trait Invariant: Send + Sync {
    /// Checks if invariant holds for the last recorded step.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the invariant condition is not met.
    fn check(&self, trajectory: &Trajectory, population: usize)
    -> Result<(), InvariantViolation>;

    /// Returns name of this invariant.
    fn name(&self) -> &str;

    /// Builds a violation report for `step`.
    fn violation(&self, step: usize, description: String) -> InvariantViolation {
        InvariantViolation {
            invariant: self.name().to_string(),
            description,
            step,
        }
    }
}

/// Ensures S + I + R equals the population at every step.
pub struct PopulationConservation;

impl Invariant for PopulationConservation {
    fn check(
        &self,
        trajectory: &Trajectory,
        population: usize,
    ) -> Result<(), InvariantViolation> {
        let Some(counts) = trajectory.last_counts() else {
            return Ok(());
        };
        if counts.total() != population {
            return Err(self.violation(
                trajectory.len() - 1,
                format!(
                    "S+I+R = {} but population is {population}",
                    counts.total()
                ),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "PopulationConservation"
    }
}

/// Ensures each event moves exactly one node forward: S never grows, R never shrinks.
pub struct NoReinfection;

impl Invariant for NoReinfection {
    fn check(&self, trajectory: &Trajectory, _population: usize) -> Result<(), InvariantViolation> {
        let step = trajectory.len().saturating_sub(1);
        let (Some(previous), Some(current)) = (
            step.checked_sub(1).and_then(|prev| trajectory.counts(prev)),
            trajectory.counts(step),
        ) else {
            return Ok(());
        };

        if current.susceptible > previous.susceptible {
            return Err(self.violation(
                step,
                format!(
                    "susceptible grew from {} to {}",
                    previous.susceptible, current.susceptible
                ),
            ));
        }
        if current.recovered < previous.recovered {
            return Err(self.violation(
                step,
                format!(
                    "recovered shrank from {} to {}",
                    previous.recovered, current.recovered
                ),
            ));
        }

        let moved = (previous.susceptible - current.susceptible)
            + (current.recovered - previous.recovered);
        if moved > 1 {
            return Err(self.violation(
                step,
                format!("{moved} transitions recorded in a single step"),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "NoReinfection"
    }
}

/// Ensures event times strictly increase.
pub struct StrictlyIncreasingTime;

impl Invariant for StrictlyIncreasingTime {
    fn check(&self, trajectory: &Trajectory, _population: usize) -> Result<(), InvariantViolation> {
        let times = trajectory.times();
        if let [.., previous, current] = times {
            if current <= previous {
                return Err(self.violation(
                    times.len() - 1,
                    format!("time {current} does not exceed previous time {previous}"),
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "StrictlyIncreasingTime"
    }
}
