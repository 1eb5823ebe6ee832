//! Scenario simulator CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use simulator::{cli, logging};

#[derive(Parser)]
#[command(name = "simulator", version, about = "Scenario simulation for rule modules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scenario against a module.
    Run {
        module_dir: PathBuf,
        scenario: PathBuf,
    },
    /// Publish the module-wide result for a module.
    RunAll { module_dir: PathBuf },
    /// Validate a scenario file without running it.
    Validate { scenario: PathBuf },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            module_dir,
            scenario,
        } => cli::run_scenario(&module_dir, &scenario),
        Command::RunAll { module_dir } => cli::run_all(&module_dir),
        Command::Validate { scenario } => cli::validate_scenario(&scenario),
    }
}
