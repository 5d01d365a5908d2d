//! Outbreak CLI - Command-line interface
//!
//! Loads contact networks from JSON and runs epidemic simulations on them.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use outbreak_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "outbreak")]
#[command(about = "Stochastic SIR epidemic simulation on contact networks")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: CliLogLevel,
    /// Directory for the full trace log
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    commands::handle_command(cli.command).await
}
