//! dcsim CLI
//!
//! Command-line entry point for running a datacenter simulation.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use dcsim_core::Algorithm;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Tick budget for one run. A server with performance 0 or a power cap of 0
/// can keep work pending forever.
const DEFAULT_MAX_TICKS: u64 = 100_000;

/// dcsim - discrete-time datacenter scheduling simulator
#[derive(Parser, Debug)]
#[command(name = "dcsim")]
#[command(version, about, long_about = None)]
#[command(after_help = "Example: dcsim fifo inputs/test1.txt")]
struct Cli {
    /// Dispatch policy: fifo, first_fit, edf, round_robin, wavefront, cpm
    algorithm: Algorithm,

    /// Key/value input file naming the job, server and dependency files
    input: PathBuf,

    /// Suppress per-tick narration
    #[arg(long)]
    silent: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Directory receiving results.txt, powers.txt and sumup.txt
    #[arg(long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Also write a JSON report to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Abort when work remains after this many ticks
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,

    /// Plot script run with python3 on the results file
    #[arg(long, default_value = "src/plotter/plotter.py")]
    plotter: PathBuf,

    /// Skip the plot step
    #[arg(long)]
    no_plot: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors, --help and --version all exit cleanly
            let _ = e.print();
            std::process::exit(0);
        }
    };

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let options = commands::RunOptions {
        algorithm: cli.algorithm,
        input: cli.input,
        silent: cli.silent,
        output_dir: cli.output_dir,
        json: cli.json,
        max_ticks: Some(cli.max_ticks),
        plotter: (!cli.no_plot).then_some(cli.plotter),
    };

    if let Err(e) = commands::run(&options) {
        eprintln!("Error: {:#}", e);
        eprintln!("Run 'dcsim --help' for usage");
        std::process::exit(1);
    }

    Ok(())
}
