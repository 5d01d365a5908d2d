//! Conversion of the per-step trajectory into the two result series.
//!
//! The raw series keeps one row per step. The interpolated series samples a
//! uniform grid by carrying forward the last observation at or before each
//! grid time; it is a step function, not a linear interpolation.

use serde::{Deserialize, Serialize};

use crate::trajectory::Trajectory;

/// One row per simulation step, irregularly spaced in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawResultRow {
    /// Step index, 0 for the initial state
    pub step: usize,
    /// Event time, or tail time after extinction
    pub time: f64,
    /// Susceptible count after the step
    pub susceptible: usize,
    /// Infected count after the step
    pub infected: usize,
    /// Recovered count after the step
    pub recovered: usize,
}

/// One row per point of the uniform time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedResultRow {
    /// Grid time `k * step_size`
    pub time: f64,
    /// Susceptible count carried forward to the grid time
    pub susceptible: usize,
    /// Infected count carried forward to the grid time
    pub infected: usize,
    /// Recovered count carried forward to the grid time
    pub recovered: usize,
}

/// Both result views of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    /// One row per step
    pub raw: Vec<RawResultRow>,
    /// One row per grid point
    pub interpolated: Vec<InterpolatedResultRow>,
}

impl SimulationResults {
    /// Derives both views from a finished trajectory.
    pub fn from_trajectory(trajectory: &Trajectory, step_size: f64, intervals: usize) -> Self {
        Self {
            raw: raw_rows(trajectory),
            interpolated: resample(trajectory, step_size, intervals),
        }
    }
}

/// Maps every trajectory step to a raw row.
pub fn raw_rows(trajectory: &Trajectory) -> Vec<RawResultRow> {
    trajectory
        .times()
        .iter()
        .enumerate()
        .map(|(step, &time)| RawResultRow {
            step,
            time,
            susceptible: trajectory.susceptible()[step],
            infected: trajectory.infected()[step],
            recovered: trajectory.recovered()[step],
        })
        .collect()
}

/// Samples the trajectory at `k * step_size` for `k = 0..=intervals`.
///
/// Each grid point takes the counts of the last step whose time is at or
/// before it. Grid points past the final step reuse the final step.
pub fn resample(
    trajectory: &Trajectory,
    step_size: f64,
    intervals: usize,
) -> Vec<InterpolatedResultRow> {
    let times = trajectory.times();
    if times.is_empty() {
        return Vec::new();
    }

    (0..=intervals)
        .map(|point| {
            let time = point as f64 * step_size;
            let step = last_step_at_or_before(times, time);
            InterpolatedResultRow {
                time,
                susceptible: trajectory.susceptible()[step],
                infected: trajectory.infected()[step],
                recovered: trajectory.recovered()[step],
            }
        })
        .collect()
}

/// Index just before the first time exceeding `time`, clamped to the valid range.
fn last_step_at_or_before(times: &[f64], time: f64) -> usize {
    times
        .partition_point(|&t| t <= time)
        .saturating_sub(1)
        .min(times.len() - 1)
}
