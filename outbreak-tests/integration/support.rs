//! Shared network builders and trajectory checks.

use outbreak_core::{ContactNetwork, Simulation, SimulationConfig};

pub fn path(n: usize) -> ContactNetwork {
    let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
    ContactNetwork::from_edges(n, &edges).unwrap()
}

pub fn ring(n: usize) -> ContactNetwork {
    let edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    ContactNetwork::from_edges(n, &edges).unwrap()
}

pub fn complete(n: usize) -> ContactNetwork {
    let edges: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect();
    ContactNetwork::from_edges(n, &edges).unwrap()
}

pub fn path_matrix_4() -> Vec<Vec<u8>> {
    vec![
        vec![0, 1, 0, 0],
        vec![1, 0, 1, 0],
        vec![0, 1, 0, 1],
        vec![0, 0, 1, 0],
    ]
}

/// Runs to completion synchronously; safe to call inside async tests.
pub fn run(network: ContactNetwork, config: SimulationConfig) -> Simulation {
    let mut sim = Simulation::new(network, config).unwrap();
    sim.run_to_completion().unwrap();
    sim
}

/// Asserts the per-step properties every completed run must satisfy.
pub fn assert_trajectory_properties(sim: &Simulation) {
    let n = sim.network().len();
    let trajectory = sim.trajectory();
    let times = trajectory.times();

    for step in 0..trajectory.len() {
        let counts = trajectory.counts(step).unwrap();
        assert_eq!(counts.total(), n, "S+I+R at step {step}");
    }

    for step in 1..trajectory.len() {
        assert!(times[step] > times[step - 1], "time not increasing at step {step}");
        assert!(trajectory.susceptible()[step] <= trajectory.susceptible()[step - 1]);
        assert!(trajectory.recovered()[step] >= trajectory.recovered()[step - 1]);
    }

    let limit = sim.config().horizon + sim.config().tail_increment;
    assert!(
        trajectory.last_time().unwrap() > limit,
        "trajectory must reach past horizon + increment"
    );
}
