//! Configuration types for dcsim

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DcsimError, DcsimResult};

/// Dispatch policy, selected once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// First in, first out on the first idle server
    Fifo,
    /// Smallest job first on the most powerful idle server
    FirstFit,
    /// Earliest deadline first, preempting the latest deadline
    Edf,
    /// One-tick quantum, preempted jobs go to the back of the queue
    RoundRobin,
    /// Placement by position within a dependency wave
    Wavefront,
    /// Placement by dependency branch (critical path method)
    Cpm,
}

impl Algorithm {
    /// All policies, in the order they are documented
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Fifo,
        Algorithm::FirstFit,
        Algorithm::Edf,
        Algorithm::RoundRobin,
        Algorithm::Wavefront,
        Algorithm::Cpm,
    ];

    /// Name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Fifo => "fifo",
            Algorithm::FirstFit => "first_fit",
            Algorithm::Edf => "edf",
            Algorithm::RoundRobin => "round_robin",
            Algorithm::Wavefront => "wavefront",
            Algorithm::Cpm => "cpm",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = DcsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| DcsimError::UnknownAlgorithm(s.to_string()))
    }
}

/// Contents of the key/value input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Aggregate power at or above which dispatch is skipped
    pub power_cap: f64,
    /// Energy budget, reported but not enforced
    pub energy_cap: f64,
    /// Configured repeat count, reported only
    pub repeat: u32,
    /// Job file, resolved against the input file's directory
    pub job_file: PathBuf,
    /// Server file, resolved against the input file's directory
    pub server_file: PathBuf,
    /// Dependency file, if any
    pub dependency_file: Option<PathBuf>,
}

impl InputConfig {
    /// Load the input file at `path`
    pub fn from_file(path: &Path) -> DcsimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DcsimError::Config(format!("Failed to read input file {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&content, base_dir)
    }

    /// Parse key/value pairs, resolving file names against `base_dir`.
    ///
    /// Only lines containing `=` are considered; quotes are stripped from
    /// values and unknown keys are ignored.
    pub fn parse(content: &str, base_dir: &Path) -> DcsimResult<Self> {
        let values: HashMap<&str, String> = content
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim().replace('"', "")))
            .collect();

        let number = |key: &str| -> DcsimResult<Option<f64>> {
            values
                .get(key)
                .map(|v| {
                    v.parse::<f64>().map_err(|_| {
                        DcsimError::Config(format!("{} must be a number, got '{}'", key, v))
                    })
                })
                .transpose()
        };
        let file = |key: &str| values.get(key).map(|v| base_dir.join(v));

        let power_cap =
            number("power_cap")?.ok_or_else(|| DcsimError::Config("missing power_cap".into()))?;
        let energy_cap = number("energy_cap")?.unwrap_or(0.0);
        let repeat = values
            .get("repeat")
            .map(|v| {
                v.parse::<u32>().map_err(|_| {
                    DcsimError::Config(format!("repeat must be a non-negative integer, got '{}'", v))
                })
            })
            .transpose()?
            .unwrap_or(0);

        Ok(Self {
            power_cap,
            energy_cap,
            repeat,
            job_file: file("job_file")
                .ok_or_else(|| DcsimError::Config("missing job_file".into()))?,
            server_file: file("server_file")
                .ok_or_else(|| DcsimError::Config("missing server_file".into()))?,
            dependency_file: file("dependency_file"),
        })
    }

    /// Engine settings derived from this file
    pub fn sim_config(&self, silent: bool) -> SimConfig {
        SimConfig {
            power_cap: self.power_cap,
            energy_cap: self.energy_cap,
            repeat: self.repeat,
            silent,
            max_ticks: None,
        }
    }
}

/// Settings handed to the simulation engine at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Aggregate power at or above which dispatch is skipped
    pub power_cap: f64,
    /// Energy budget, reported but not enforced
    pub energy_cap: f64,
    /// Configured repeat count, reported only
    pub repeat: u32,
    /// Suppress per-tick narration on stdout
    pub silent: bool,
    /// Give up once the clock reaches this tick with work remaining
    pub max_ticks: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            power_cap: 1000.0,
            energy_cap: 10000.0,
            repeat: 0,
            silent: false,
            max_ticks: None,
        }
    }
}
