//! CLI commands implementation

use anyhow::{Context, Result};
use dcsim_core::{
    dispatch_records, expand_periodic, parse_dependencies, parse_jobs, parse_servers,
    power_series, results_table, Algorithm, DispatchRecord, InputConfig, Summary,
};
use dcsim_scheduler::Datacenter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Settings for one simulation run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub algorithm: Algorithm,
    pub input: PathBuf,
    pub silent: bool,
    pub output_dir: PathBuf,
    pub json: Option<PathBuf>,
    pub max_ticks: Option<u64>,
    /// Plot script, `None` to skip plotting
    pub plotter: Option<PathBuf>,
}

/// Machine-readable run report
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    algorithm: Algorithm,
    summary: &'a Summary,
    power_used: &'a [f64],
    records: Vec<DispatchRecord>,
}

/// Load the inputs, simulate, write the reports and plot
pub fn run(options: &RunOptions) -> Result<()> {
    if !options.silent {
        println!("Use --silent to run it silently");
        println!("Use --help to display the help");
        println!("The output is silenced when the system is empty");
    }

    let mut datacenter = load(options)?;
    datacenter
        .run()
        .with_context(|| format!("Simulation with {} did not finish", options.algorithm))?;

    let summary = datacenter.summary();
    let results = write_outputs(&options.output_dir, &datacenter, &summary)?;

    if let Some(path) = &options.json {
        let report = JsonReport {
            algorithm: options.algorithm,
            summary: &summary,
            power_used: datacenter.power_used(),
            records: dispatch_records(datacenter.servers()),
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write JSON report {}", path.display()))?;
    }

    if !options.silent {
        print!("{}", summary);
    }

    if let Some(plotter) = &options.plotter {
        plot(plotter, &results);
    }

    Ok(())
}

/// Build the datacenter described by the input file
fn load(options: &RunOptions) -> Result<Datacenter> {
    let input = InputConfig::from_file(&options.input)?;

    let servers = parse_servers(&input.server_file)?;
    let jobs = expand_periodic(parse_jobs(&input.job_file)?);
    let dependencies = match &input.dependency_file {
        Some(path) => parse_dependencies(path)?,
        None => Vec::new(),
    };

    info!(
        input = %options.input.display(),
        servers = servers.len(),
        jobs = jobs.len(),
        dependencies = dependencies.len(),
        "Inputs loaded"
    );

    let mut config = input.sim_config(options.silent);
    config.max_ticks = options.max_ticks;

    Ok(Datacenter::new(
        servers,
        jobs,
        &dependencies,
        options.algorithm,
        config,
    ))
}

/// Write results.txt, powers.txt and sumup.txt, returning the results path
fn write_outputs(dir: &Path, datacenter: &Datacenter, summary: &Summary) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let results = dir.join("results.txt");
    let files = [
        (results.clone(), results_table(datacenter.servers())),
        (dir.join("powers.txt"), power_series(datacenter.power_used())),
        (dir.join("sumup.txt"), summary.to_string()),
    ];
    for (path, content) in files {
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(dir = %dir.display(), "Reports written");
    Ok(results)
}

/// Run the plot script on the results file. Failures are only reported.
fn plot(plotter: &Path, results: &Path) {
    match Command::new("python3").arg(plotter).arg(results).status() {
        Ok(status) if status.success() => info!(plotter = %plotter.display(), "Plot generated"),
        Ok(status) => warn!(
            plotter = %plotter.display(),
            status = %status,
            "An error occurred while executing the plotter"
        ),
        Err(e) => warn!(
            plotter = %plotter.display(),
            error = %e,
            "An error occurred while executing the plotter"
        ),
    }
}
