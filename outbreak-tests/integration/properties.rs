//! Trajectory and resampling properties over many seeds and random graphs.

use outbreak_core::{ContactNetwork, Simulation, SimulationConfig};
use proptest::prelude::*;

use crate::support::{assert_trajectory_properties, complete, path, ring, run};

#[test]
fn test_properties_across_seeds() {
    for k in 0..20 {
        let seed = k as f64 / 20.0;
        let config = SimulationConfig::new(2, 1.5, 1.0, 0.2, 6.0).with_seed(seed);
        let sim = run(ring(25), config);
        assert_trajectory_properties(&sim);
    }
}

#[test]
fn test_interpolated_grid_shape() {
    let cases = [(5.0, 0.5, 11), (1.0, 0.3, 4), (10.0, 1.0, 11), (2.0, 3.0, 1)];

    for (horizon, dt, expected_rows) in cases {
        let config = SimulationConfig::new(1, 1.0, 1.0, dt, horizon).with_seed(0.6);
        let sim = run(path(6), config.clone());
        let interpolated = &sim.results().unwrap().interpolated;

        assert_eq!(interpolated.len(), expected_rows, "horizon {horizon}, dt {dt}");
        assert_eq!(interpolated.len(), (horizon / dt).floor() as usize + 1);
        for (k, row) in interpolated.iter().enumerate() {
            assert_eq!(row.time, k as f64 * dt);
        }
    }
}

#[test]
fn test_interpolated_rows_match_last_preceding_step() {
    let config = SimulationConfig::new(2, 2.0, 1.0, 0.1, 4.0).with_seed(0.31);
    let sim = run(complete(12), config);
    let trajectory = sim.trajectory();
    let times = trajectory.times();

    for row in &sim.results().unwrap().interpolated {
        let step = times.iter().rposition(|&t| t <= row.time).unwrap();
        assert_eq!(row.susceptible, trajectory.susceptible()[step]);
        assert_eq!(row.infected, trajectory.infected()[step]);
        assert_eq!(row.recovered, trajectory.recovered()[step]);
    }
}

#[test]
fn test_raw_rows_mirror_trajectory() {
    let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0).with_seed(0.8);
    let sim = run(ring(8), config);
    let raw = &sim.results().unwrap().raw;

    assert_eq!(raw.len(), sim.trajectory().len());
    for (step, row) in raw.iter().enumerate() {
        assert_eq!(row.step, step);
        assert_eq!(row.time, sim.trajectory().times()[step]);
    }
}

#[test]
fn test_rate_vector_matches_statuses_after_each_event() {
    let config = SimulationConfig::new(2, 0.7, 1.3, 0.5, 6.0).with_seed(0.05);
    let network = ring(15);
    let sim = run(network.clone(), config);

    for (rates, statuses) in sim.rate_history().iter().zip(sim.status_history()) {
        for node in 0..network.len() {
            let expected = if statuses[node].is_infected() {
                1.3
            } else if statuses[node].is_recovered() {
                0.0
            } else {
                let infected_neighbors = network
                    .neighbors(node)
                    .iter()
                    .filter(|&&j| statuses[j].is_infected())
                    .count();
                0.7 * infected_neighbors as f64
            };
            assert_eq!(rates[node], expected);
        }
    }
}

#[test]
fn test_event_history_matches_transitions() {
    let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0).with_seed(0.42);
    let sim = run(path(10), config);
    let summary = sim.summary().unwrap();

    let selected: Vec<usize> = sim.event_history().iter().flatten().copied().collect();
    assert_eq!(selected.len(), summary.events);
    assert_eq!(summary.infections + summary.recoveries, summary.events);

    // Every event changed exactly the selected node's status.
    for (step, &node) in selected.iter().enumerate() {
        let before = &sim.status_history()[step];
        let after = &sim.status_history()[step + 1];
        for other in 0..before.len() {
            if other == node {
                assert_ne!(before[other], after[other]);
            } else {
                assert_eq!(before[other], after[other]);
            }
        }
    }
}

fn arb_network() -> impl Strategy<Value = ContactNetwork> {
    (2usize..12).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n), 0..(n * 2)).prop_map(move |pairs| {
            let edges: Vec<(usize, usize)> = pairs.into_iter().filter(|(a, b)| a != b).collect();
            ContactNetwork::from_edges(n, &edges).unwrap()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_trajectory_invariants_hold(
        network in arb_network(),
        infected_fraction in 0.0f64..1.0,
        tau in 0.0f64..3.0,
        gamma in 0.1f64..3.0,
        seed in 0.0f64..1.0,
    ) {
        let n = network.len();
        let initial_infected = ((infected_fraction * n as f64) as usize).clamp(1, n);
        let config = SimulationConfig::new(initial_infected, tau, gamma, 0.25, 3.0).with_seed(seed);

        let mut sim = Simulation::new(network, config).unwrap();
        let summary = sim.run_to_completion().unwrap();
        assert_trajectory_properties(&sim);

        let interpolated = &sim.results().unwrap().interpolated;
        prop_assert_eq!(interpolated.len(), 13);
        prop_assert_eq!(summary.final_counts.total(), n);
        prop_assert_eq!(summary.recoveries, summary.final_counts.recovered);
        prop_assert_eq!(summary.infections + initial_infected, n - summary.final_counts.susceptible);
    }
}
