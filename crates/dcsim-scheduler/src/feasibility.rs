//! EDF feasibility analysis
//!
//! Reported at the start of an `edf` run. The analysis never changes how jobs
//! are scheduled: servers always run at their maximum frequency.

use std::fmt;

use dcsim_core::{Job, Server};

/// System utilization: sum of `duration / periodicity` over periodic jobs,
/// divided by the total server performance
pub fn utilization(jobs: &[Job], servers: &[Server]) -> f64 {
    let load: f64 = jobs
        .iter()
        .filter(|job| job.periodicity > 0)
        .map(|job| job.duration as f64 / job.periodicity as f64)
        .sum();
    let processors = processors(servers);

    if processors > 0.0 {
        load / processors
    } else {
        f64::INFINITY
    }
}

/// System density: sum of `duration / min(period, deadline)`, where a
/// one-shot job's period counts as `deadline + 1`
pub fn density(jobs: &[Job]) -> f64 {
    jobs.iter()
        .map(|job| {
            let period = if job.periodicity == 0 {
                job.deadline + 1
            } else {
                job.periodicity
            };
            job.duration as f64 / period.min(job.deadline) as f64
        })
        .sum()
}

/// Necessary condition for an EDF schedule: `U <= sum(performance)`
pub fn edf_feasible(jobs: &[Job], servers: &[Server]) -> bool {
    utilization(jobs, servers) <= processors(servers)
}

fn processors(servers: &[Server]) -> f64 {
    servers.iter().map(|server| server.performance).sum()
}

/// Feasibility figures for one job set on one server set
#[derive(Debug, Clone, PartialEq)]
pub struct Feasibility {
    pub utilization: f64,
    pub density: f64,
    pub processors: f64,
    pub feasible: bool,
}

impl Feasibility {
    pub fn analyse(jobs: &[Job], servers: &[Server]) -> Self {
        Self {
            utilization: utilization(jobs, servers),
            density: density(jobs),
            processors: processors(servers),
            feasible: edf_feasible(jobs, servers),
        }
    }
}

impl fmt::Display for Feasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Necessary condition of the solution's feasibility: U <= processors being {:.3} <= {}",
            self.utilization, self.processors
        )?;
        writeln!(
            f,
            "(where {} corresponds to the sum of the server's performance (~ processors))",
            self.processors
        )?;
        writeln!(f, "System density: {:.3}", self.density)?;
        if self.feasible {
            write!(f, "Solution is feasible")
        } else {
            write!(f, "Solution is not feasible (Missed deadlines predicted)")
        }
    }
}
