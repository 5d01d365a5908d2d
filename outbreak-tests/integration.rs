//! Integration tests for outbreak
//!
//! These tests drive complete simulations through the public API and check
//! the trajectory properties every run must satisfy, independent of seed.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/batch_runs.rs"]
mod batch_runs;
#[path = "integration/determinism.rs"]
mod determinism;
#[path = "integration/properties.rs"]
mod properties;
#[path = "integration/result_shapes.rs"]
mod result_shapes;
#[path = "integration/scenarios.rs"]
mod scenarios;
