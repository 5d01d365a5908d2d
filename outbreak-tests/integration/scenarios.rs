//! Concrete end-to-end scenarios.

use outbreak_core::{Simulation, SimulationConfig, SimulationError, Termination};

use crate::support::{assert_trajectory_properties, complete, path, path_matrix_4, run};

#[tokio::test]
async fn test_path_graph_scenario() {
    let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0).with_seed(0.42);
    let mut sim = Simulation::from_adjacency(&path_matrix_4(), config).unwrap();

    let initially_infected = sim.statuses().iter().filter(|s| s.is_infected()).count();
    assert_eq!(initially_infected, 1);

    sim.simulate().await.unwrap();
    assert_trajectory_properties(&sim);

    let results = sim.results().unwrap();
    assert_eq!(results.interpolated.len(), 11);
    assert_eq!(results.interpolated.last().unwrap().time, 5.0);

    let last = results.raw.last().unwrap();
    assert_eq!(last.susceptible + last.infected + last.recovered, 4);
}

#[test]
fn test_path_graph_burns_out_with_long_horizon() {
    let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 1000.0).with_seed(0.42);
    let mut sim = Simulation::new(path(4), config).unwrap();
    tokio_test::block_on(sim.simulate()).unwrap();

    assert!(sim.termination().unwrap().is_extinction());
    let counts = sim.trajectory().last_counts().unwrap();
    assert_eq!(counts.infected, 0);
    assert!(counts.recovered >= 1);
    assert_eq!(counts.susceptible + counts.recovered, 4);
}

#[test]
fn test_all_infected_all_recover() {
    let config = SimulationConfig::new(5, 1.0, 1.0, 0.5, 50.0).with_seed(0.9);
    let sim = run(complete(5), config);
    let results = sim.results().unwrap();

    let last_raw = results.raw.last().unwrap();
    assert_eq!((last_raw.infected, last_raw.recovered), (0, 5));

    let last_interpolated = results.interpolated.last().unwrap();
    assert_eq!(
        (last_interpolated.infected, last_interpolated.recovered),
        (0, 5)
    );
    assert_eq!(sim.summary().unwrap().infections, 0);
}

#[test]
fn test_no_transmission_only_recoveries() {
    let config = SimulationConfig::new(3, 0.0, 0.5, 0.5, 10.0).with_seed(0.15);
    let sim = run(complete(10), config);

    assert!(sim.trajectory().infected().iter().all(|&i| i <= 3));
    assert!(sim.trajectory().susceptible().iter().all(|&s| s == 7));
    assert_eq!(sim.summary().unwrap().infections, 0);
}

#[test]
fn test_early_extinction_gets_flat_tail() {
    let config = SimulationConfig::new(1, 0.0, 50.0, 0.5, 5.0).with_seed(0.42);
    let sim = run(path(4), config);

    assert_eq!(sim.termination(), Some(Termination::Extinct));
    assert_eq!(sim.summary().unwrap().events, 1);

    let trajectory = sim.trajectory();
    let times = trajectory.times();
    // Step 0 initial, step 1 the single recovery, then the tail.
    assert!(trajectory.len() > 5);
    for step in 2..trajectory.len() {
        let counts = trajectory.counts(step).unwrap();
        assert_eq!(
            (counts.susceptible, counts.infected, counts.recovered),
            (3, 0, 1)
        );
        assert!((times[step] - times[step - 1] - 0.5).abs() < 1e-9);
    }
    assert!(trajectory.last_time().unwrap() > 5.0 + 0.5);

    let interpolated = &sim.results().unwrap().interpolated;
    assert!(interpolated[1..].iter().all(|row| row.recovered == 1));
}

#[test]
fn test_results_unavailable_before_run() {
    let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0).with_seed(0.42);
    let sim = Simulation::new(path(4), config).unwrap();

    let err = sim.results().unwrap_err();
    assert!(matches!(err, SimulationError::InvalidState { .. }));
    assert!(err.is_user_error());
}

#[test]
fn test_invalid_parameters_fail_fast() {
    let valid = SimulationConfig::new(1, 1.0, 1.0, 0.5, 5.0);

    let too_many = SimulationConfig {
        initial_infected: 5,
        ..valid.clone()
    };
    assert!(matches!(
        Simulation::new(path(4), too_many),
        Err(SimulationError::InvalidParameter { .. })
    ));

    let no_recovery = SimulationConfig {
        recovery_rate: 0.0,
        ..valid.clone()
    };
    assert!(Simulation::new(path(4), no_recovery).is_err());

    let asymmetric = vec![vec![0, 1], vec![0, 0]];
    assert!(Simulation::from_adjacency(&asymmetric, valid.clone()).is_err());

    let ragged = vec![vec![0, 1, 0], vec![1, 0]];
    assert!(Simulation::from_adjacency(&ragged, valid).is_err());
}
