//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Subcommand, ValueEnum};
use outbreak_core::{
    BatchRunner, ContactNetwork, InterpolatedResultRow, OutbreakConfig, RunSummary, Simulation,
    SimulationConfig, SimulationResults, derive_seeds,
};
use serde::Serialize;
use tracing::{info, warn};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a single simulation
    Run {
        #[command(flatten)]
        model: ModelArgs,
        /// Seed in [0, 1); drawn at random when omitted
        #[arg(long)]
        seed: Option<f64>,
        /// Write results JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run independent repetitions with derived seeds
    Batch {
        #[command(flatten)]
        model: ModelArgs,
        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,
        /// Master seed the run seeds are derived from
        #[arg(long, default_value = "0.5")]
        master_seed: f64,
        /// Maximum runs executing at once
        #[arg(long)]
        concurrency: Option<usize>,
        /// Write every run's interpolated series as JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an adjacency matrix for a standard network shape
    Generate {
        /// Network shape
        #[arg(value_enum)]
        shape: Shape,
        /// Number of nodes
        #[arg(short, long)]
        nodes: usize,
        /// Write the matrix here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Model parameters shared by `run` and `batch`
#[derive(Args)]
pub struct ModelArgs {
    /// JSON file holding an N×N 0/1 adjacency matrix
    #[arg(short, long)]
    adjacency: PathBuf,
    /// Initially infected node count
    #[arg(short = 'i', long, default_value = "1")]
    initial_infected: usize,
    /// Infection rate per infected neighbor
    #[arg(long, default_value = "1.0")]
    tau: f64,
    /// Recovery rate
    #[arg(long, default_value = "1.0")]
    gamma: f64,
    /// Step of the resampled time grid
    #[arg(long, default_value = "0.5")]
    dt: f64,
    /// Time horizon
    #[arg(long, default_value = "10.0")]
    t_end: f64,
    /// Skip per-step rate and status snapshots
    #[arg(long)]
    no_snapshots: bool,
}

impl ModelArgs {
    fn to_config(&self, base: &SimulationConfig) -> SimulationConfig {
        SimulationConfig {
            initial_infected: self.initial_infected,
            infection_rate: self.tau,
            recovery_rate: self.gamma,
            step_size: self.dt,
            horizon: self.t_end,
            record_snapshots: base.record_snapshots && !self.no_snapshots,
            ..base.clone()
        }
    }
}

/// Standard network shapes for `generate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    /// 0-1-2-...-(n-1)
    Path,
    /// Path with the ends joined
    Ring,
    /// Every pair connected
    Complete,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a RunSummary,
    #[serde(flatten)]
    results: &'a SimulationResults,
}

#[derive(Serialize)]
struct BatchRunOutput {
    seed: f64,
    summary: RunSummary,
    interpolated: Vec<InterpolatedResultRow>,
}

/// Handle the CLI command
///
/// # Errors
/// Returns the error of the command that failed
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let env_config = OutbreakConfig::from_env();
    match command {
        Commands::Run {
            model,
            seed,
            output,
        } => run_simulation(&env_config, model, seed, output).await,
        Commands::Batch {
            model,
            runs,
            master_seed,
            concurrency,
            output,
        } => {
            let mut batch_config = env_config.batch.clone();
            if let Some(limit) = concurrency {
                batch_config.max_concurrent_runs = limit.max(1);
            }
            let runner = BatchRunner::new(&batch_config);
            run_batch(&env_config, &runner, model, runs, master_seed, output).await
        }
        Commands::Generate {
            shape,
            nodes,
            output,
        } => generate_network(shape, nodes, output),
    }
}

async fn run_simulation(
    env_config: &OutbreakConfig,
    model: ModelArgs,
    seed: Option<f64>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let network = load_network(&model.adjacency)?;
    let mut config = model.to_config(&env_config.simulation);
    if seed.is_some() {
        config.seed = seed;
    }

    let mut simulation = Simulation::new(network, config)?;
    let summary = simulation.simulate().await?;
    info!("{} ({})", summary, summary.termination);

    let document = RunOutput {
        summary: &summary,
        results: simulation.results()?,
    };
    write_json(&document, output.as_deref())
}

async fn run_batch(
    env_config: &OutbreakConfig,
    runner: &BatchRunner,
    model: ModelArgs,
    runs: usize,
    master_seed: f64,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !(0.0..1.0).contains(&master_seed) {
        bail!("master seed must be in [0, 1), got {master_seed}");
    }

    let network = Arc::new(load_network(&model.adjacency)?);
    let config = model.to_config(&env_config.simulation);
    let seeds = derive_seeds(master_seed, runs);

    let outcomes = runner.run(network, &config, &seeds).await;

    let mut documents = Vec::with_capacity(outcomes.len());
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(outcome) => {
                let counts = outcome.summary.final_counts;
                println!(
                    "run {index:>3}  seed {:.6}  {:<17}  S={} I={} R={}",
                    outcome.seed,
                    outcome.summary.termination.to_string(),
                    counts.susceptible,
                    counts.infected,
                    counts.recovered
                );
                documents.push(BatchRunOutput {
                    seed: outcome.seed,
                    summary: outcome.summary,
                    interpolated: outcome.results.interpolated,
                });
            }
            Err(e) => warn!("Run {} failed: {}", index, e),
        }
    }

    if documents.len() < runs {
        bail!("{} of {runs} runs failed", runs - documents.len());
    }

    if let Some(path) = output {
        write_json(&documents, Some(path.as_path()))?;
    }
    Ok(())
}

fn generate_network(shape: Shape, nodes: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    let edges: Vec<(usize, usize)> = match shape {
        Shape::Path => (1..nodes).map(|i| (i - 1, i)).collect(),
        Shape::Ring if nodes > 2 => (0..nodes).map(|i| (i, (i + 1) % nodes)).collect(),
        Shape::Ring => (1..nodes).map(|i| (i - 1, i)).collect(),
        Shape::Complete => (0..nodes)
            .flat_map(|i| (i + 1..nodes).map(move |j| (i, j)))
            .collect(),
    };
    let network = ContactNetwork::from_edges(nodes, &edges)?;
    write_json(&network.to_adjacency(), output.as_deref())
}

fn load_network(path: &Path) -> anyhow::Result<ContactNetwork> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read adjacency matrix {}", path.display()))?;
    let matrix: Vec<Vec<u8>> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON matrix of 0/1 entries", path.display()))?;
    Ok(ContactNetwork::from_adjacency(&matrix)?)
}

fn write_json<T: Serialize + ?Sized>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_network_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path.json");
        std::fs::write(&path, "[[0,1,0],[1,0,1],[0,1,0]]").unwrap();

        let network = load_network(&path).unwrap();
        assert_eq!(network.len(), 3);
        assert_eq!(network.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_load_network_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");

        std::fs::write(&path, "[[0,1],[0,0]]").unwrap();
        assert!(load_network(&path).is_err());

        std::fs::write(&path, "[[0,-1],[-1,0]]").unwrap();
        assert!(load_network(&path).is_err());

        assert!(load_network(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_generate_ring_roundtrips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring.json");

        generate_network(Shape::Ring, 5, Some(path.clone())).unwrap();
        let network = load_network(&path).unwrap();

        assert_eq!(network.edge_count(), 5);
        assert!((0..5).all(|node| network.degree(node) == 2));
    }

    #[test]
    fn test_generate_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("complete.json");

        generate_network(Shape::Complete, 4, Some(path.clone())).unwrap();
        assert_eq!(load_network(&path).unwrap().edge_count(), 6);
    }

    #[tokio::test]
    async fn test_run_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let adjacency = dir.path().join("path.json");
        let output = dir.path().join("out.json");
        generate_network(Shape::Path, 4, Some(adjacency.clone())).unwrap();

        let model = ModelArgs {
            adjacency,
            initial_infected: 1,
            tau: 1.0,
            gamma: 1.0,
            dt: 0.5,
            t_end: 5.0,
            no_snapshots: true,
        };
        run_simulation(&OutbreakConfig::default(), model, Some(0.42), Some(output.clone()))
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(json["summary"]["seed"], 0.42);
        assert_eq!(json["interpolated"].as_array().unwrap().len(), 11);
        assert!(!json["raw"].as_array().unwrap().is_empty());
    }
}
