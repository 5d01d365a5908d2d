//! JSON shape of the result rows handed to plotting consumers.

use outbreak_core::{InterpolatedResultRow, SimulationConfig, SimulationResults, Termination};

use crate::support::{path, run};

#[test]
fn test_result_rows_serialize_with_field_names() {
    let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 2.0).with_seed(0.42);
    let sim = run(path(4), config);
    let json = serde_json::to_value(sim.results().unwrap()).unwrap();

    let raw0 = &json["raw"][0];
    assert_eq!(raw0["step"], 0);
    assert_eq!(raw0["time"], 0.0);
    assert_eq!(raw0["susceptible"], 3);
    assert_eq!(raw0["infected"], 1);
    assert_eq!(raw0["recovered"], 0);

    let interpolated = json["interpolated"].as_array().unwrap();
    assert_eq!(interpolated.len(), 5);
    assert!(interpolated[0].get("step").is_none());
}

#[test]
fn test_results_deserialize_back() {
    let config = SimulationConfig::new(1, 1.0, 1.0, 0.5, 2.0).with_seed(0.42);
    let sim = run(path(4), config);

    let text = serde_json::to_string(sim.results().unwrap()).unwrap();
    let parsed: SimulationResults = serde_json::from_str(&text).unwrap();
    let original = sim.results().unwrap();
    assert_eq!(parsed.raw.len(), original.raw.len());
    for (a, b) in parsed.interpolated.iter().zip(&original.interpolated) {
        assert_eq!(
            (a.susceptible, a.infected, a.recovered),
            (b.susceptible, b.infected, b.recovered)
        );
    }

    let row: InterpolatedResultRow = serde_json::from_str(
        r#"{"time": 1.5, "susceptible": 2, "infected": 1, "recovered": 1}"#,
    )
    .unwrap();
    assert_eq!(row.time, 1.5);
}

#[test]
fn test_termination_serializes_as_variant_name() {
    let json = serde_json::to_string(&Termination::NoEventSelected).unwrap();
    assert_eq!(json, "\"NoEventSelected\"");
}
