//! The command-line front end of the vfab simulator.
//!
//! Provides `vfab run` to simulate a scenario end to end, `vfab schedule` to
//! run only the region scheduler over the scenario's request batches, and
//! `vfab check` to validate a scenario file.

#![warn(missing_docs)]

mod check;
mod render;
mod run;
mod scenario;
mod schedule;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// vfab, an FPGA-as-a-service datacenter simulator.
#[derive(Parser, Debug)]
#[command(name = "vfab", version, about = "vfab FPGA-as-a-service simulator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the scenario file (default: `vfab.toml`).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate the scenario and print the execution report.
    Run(RunArgs),
    /// Schedule the scenario's request batches without simulating them.
    Schedule(ScheduleArgs),
    /// Validate the scenario file.
    Check,
}

/// Arguments for the `vfab run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Output format for the report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Scheduler RNG seed, overriding the scenario's.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulated time limit in seconds, overriding the scenario's.
    #[arg(long)]
    pub time_limit: Option<f64>,
}

/// Arguments for the `vfab schedule` subcommand.
#[derive(Parser, Debug)]
pub struct ScheduleArgs {
    /// Output format for the schedules.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Scheduler RNG seed, overriding the scenario's.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable tables.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom scenario file.
    pub config: Option<String>,
}

/// Default log filter for the given flags. `RUST_LOG` takes precedence.
fn log_filter(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.quiet, cli.verbose)),
    )
    .init();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::Schedule(ref args) => schedule::run(args, &global),
        Command::Check => check::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
