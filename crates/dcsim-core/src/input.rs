//! Readers for the job, server and dependency files

use std::path::Path;

use crate::error::{DcsimError, DcsimResult};
use crate::job::{Job, JobId};
use crate::server::Server;

/// Precedence pair: the second job depends on the first
pub type Dependency = (JobId, JobId);

/// Read the job file at `path`
pub fn parse_jobs(path: &Path) -> DcsimResult<Vec<Job>> {
    parse_jobs_str(&read(path)?, path)
}

/// Parse job lines: `id arrival duration deadline periodicity`
pub fn parse_jobs_str(content: &str, path: &Path) -> DcsimResult<Vec<Job>> {
    let mut jobs = Vec::new();

    for (line_no, line) in records(content) {
        let fields = line
            .split_whitespace()
            .map(|field| field.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DcsimError::parse(path, line_no, format!("invalid integer: {}", e)))?;

        match fields[..] {
            [id, arrival, duration, deadline, periodicity] => {
                jobs.push(Job::new(id, arrival, duration, deadline, periodicity));
            }
            _ => {
                return Err(DcsimError::parse(
                    path,
                    line_no,
                    format!("expected 5 fields, found {}", fields.len()),
                ))
            }
        }
    }

    Ok(jobs)
}

/// Read the server file at `path`
pub fn parse_servers(path: &Path) -> DcsimResult<Vec<Server>> {
    parse_servers_str(&read(path)?, path)
}

/// Parse server lines: `id performance (f1 f2 ... fn)`
pub fn parse_servers_str(content: &str, path: &Path) -> DcsimResult<Vec<Server>> {
    let mut servers = Vec::new();

    for (line_no, line) in records(content) {
        let err = |reason: &str| DcsimError::parse(path, line_no, reason);

        let (head, rest) = line
            .split_once('(')
            .ok_or_else(|| err("missing frequency list"))?;
        let (list, _) = rest
            .split_once(')')
            .ok_or_else(|| err("unterminated frequency list"))?;

        let mut head = head.split_whitespace();
        let id = head
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| err("invalid server id"))?;
        let performance = head
            .next()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|p| *p >= 0.0)
            .ok_or_else(|| err("invalid performance"))?;

        let frequencies = list
            .split_whitespace()
            .map(|f| f.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| err("invalid frequency"))?;
        if frequencies.is_empty() {
            return Err(err("empty frequency list"));
        }

        servers.push(Server::new(id, performance, frequencies));
    }

    Ok(servers)
}

/// Read the dependency file at `path`
pub fn parse_dependencies(path: &Path) -> DcsimResult<Vec<Dependency>> {
    parse_dependencies_str(&read(path)?, path)
}

/// Parse dependency lines: `a - b`. Lines without `" - "` are skipped.
pub fn parse_dependencies_str(content: &str, path: &Path) -> DcsimResult<Vec<Dependency>> {
    let mut dependencies = Vec::new();

    for (line_no, line) in records(content) {
        let Some((from, to)) = line.split_once(" - ") else {
            continue;
        };
        let id = |v: &str| {
            v.trim()
                .parse::<JobId>()
                .map_err(|e| DcsimError::parse(path, line_no, format!("invalid job id: {}", e)))
        };
        dependencies.push((id(from)?, id(to)?));
    }

    Ok(dependencies)
}

fn read(path: &Path) -> DcsimResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| DcsimError::Config(format!("Failed to read {}: {}", path.display(), e)))
}

/// Non-comment, non-blank lines with their 1-based line numbers
fn records(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.starts_with('#') && !line.trim().is_empty())
}
