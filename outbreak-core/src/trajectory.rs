//! Per-step S/I/R counts and event times, including the flat tail.

use serde::{Deserialize, Serialize};

/// Compartment sizes at one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Nodes in S
    pub susceptible: usize,
    /// Nodes in I
    pub infected: usize,
    /// Nodes in R
    pub recovered: usize,
}

impl Counts {
    /// Total population across the three compartments.
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered
    }
}

/// Parallel S/I/R/T sequences indexed by simulation step.
///
/// Step 0 is the initial state at time zero. Each later step is either one
/// event or one row of the flat tail appended after extinction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    susceptible: Vec<usize>,
    infected: Vec<usize>,
    recovered: Vec<usize>,
}

impl Trajectory {
    /// Creates a trajectory holding only the initial state at time zero.
    pub fn starting_at(initial: Counts) -> Self {
        let mut trajectory = Self::default();
        trajectory.push(0.0, initial);
        trajectory
    }

    /// Appends one step.
    pub fn push(&mut self, time: f64, counts: Counts) {
        self.times.push(time);
        self.susceptible.push(counts.susceptible);
        self.infected.push(counts.infected);
        self.recovered.push(counts.recovered);
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Event times, one per step.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Susceptible counts, one per step.
    pub fn susceptible(&self) -> &[usize] {
        &self.susceptible
    }

    /// Infected counts, one per step.
    pub fn infected(&self) -> &[usize] {
        &self.infected
    }

    /// Recovered counts, one per step.
    pub fn recovered(&self) -> &[usize] {
        &self.recovered
    }

    /// Counts at `step`, if recorded.
    pub fn counts(&self, step: usize) -> Option<Counts> {
        Some(Counts {
            susceptible: *self.susceptible.get(step)?,
            infected: *self.infected.get(step)?,
            recovered: *self.recovered.get(step)?,
        })
    }

    /// Time of the last recorded step.
    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Counts at the last recorded step.
    pub fn last_counts(&self) -> Option<Counts> {
        self.len().checked_sub(1).and_then(|step| self.counts(step))
    }

    /// Extends the trajectory flat until its last time exceeds `limit`.
    ///
    /// Rows repeat the last counts at times spaced by `increment`. Returns the
    /// number of rows appended; nothing is appended to an empty trajectory or
    /// one that already reaches past `limit`.
    pub fn extend_tail(&mut self, limit: f64, increment: f64) -> usize {
        let (Some(mut time), Some(counts)) = (self.last_time(), self.last_counts()) else {
            return 0;
        };

        let mut appended = 0;
        while time <= limit {
            time += increment;
            self.push(time, counts);
            appended += 1;
        }
        appended
    }
}
