//! Text reports: dispatch table, power series and run summary

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::{JobEnd, JobId, Tick};
use crate::server::{Server, ServerId};

/// Header line of the results table
pub const RESULTS_HEADER: &str = "#jobid serverid start end";

/// Records ending at or after this tick are commented out of the table
pub const PLOT_HORIZON: f64 = 20.0;

/// One job instance as it ran on one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub job_id: JobId,
    pub server_id: ServerId,
    pub start: Option<Tick>,
    pub end: Option<JobEnd>,
}

impl fmt::Display for DispatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.job_id, self.server_id)?;
        match self.start {
            Some(start) => write!(f, "{} ", start)?,
            None => write!(f, "-1 ")?,
        }
        match self.end {
            Some(end) => write!(f, "{}", end),
            None => write!(f, "-1"),
        }
    }
}

/// Every dispatch of every server, sorted by job id.
///
/// Records sharing a job id keep server order, then dispatch order.
pub fn dispatch_records(servers: &[Server]) -> Vec<DispatchRecord> {
    let mut records: Vec<DispatchRecord> = servers
        .iter()
        .flat_map(|server| {
            server.history().iter().map(move |job| DispatchRecord {
                job_id: job.id,
                server_id: server.id,
                start: job.start,
                end: job.end,
            })
        })
        .collect();
    records.sort_by_key(|record| record.job_id);
    records
}

/// Render the results table consumed by the plotter
pub fn results_table(servers: &[Server]) -> String {
    let mut out = String::from(RESULTS_HEADER);
    out.push('\n');

    for record in dispatch_records(servers) {
        let past_horizon = record
            .end
            .map_or(false, |end| end.as_f64() >= PLOT_HORIZON);
        if past_horizon {
            out.push_str("#arrival > 20, exclude from graph plot\n#");
        }
        out.push_str(&record.to_string());
        out.push('\n');
    }

    out
}

/// Render per-tick power samples as one comma-separated line
pub fn power_series(power_used: &[f64]) -> String {
    power_used
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// End-of-run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Ids of the expanded job set, in arrival order
    pub job_ids: Vec<JobId>,
    pub power_cap: f64,
    /// Sum of all power samples
    pub energy_used: f64,
    pub energy_cap: f64,
    pub makespan: Tick,
    pub deadline_missed: u64,
    pub repeat: u32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(44);
        writeln!(f)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "        *** Sum up of the datacenter ***")?;
        writeln!(f, "- Job's id arrival:")?;
        writeln!(f, "{:?}", self.job_ids)?;
        writeln!(f, "- Power capacity: {}", self.power_cap)?;
        writeln!(
            f,
            "- Total power used: {} / {} available",
            self.energy_used, self.energy_cap
        )?;
        writeln!(f, "- Makespan: {} unit of time", self.makespan)?;
        writeln!(f, "- Deadline missed: {}", self.deadline_missed)?;
        writeln!(f, "- Repeat: {} times", self.repeat)?;
        writeln!(f, "{}", rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;

    fn finished_server(id: ServerId, capacity: f64, jobs: Vec<(Job, Tick)>) -> Server {
        let mut server = Server::new(id, capacity, [1]);
        for (job, at) in jobs {
            server.call(at, job);
            while server.advance().is_none() {}
        }
        server
    }

    #[test]
    fn test_results_table_sorted_by_job_id() {
        let servers = vec![
            finished_server(0, 2.0, vec![(Job::new(2, 0, 4, 9, 0), 0)]),
            finished_server(1, 4.0, vec![(Job::new(0, 0, 4, 9, 0), 0), (Job::new(1, 0, 4, 9, 0), 1)]),
        ];

        let table = results_table(&servers);
        assert_eq!(
            table,
            "#jobid serverid start end\n0 1 0 1.0\n1 1 1 2.0\n2 0 0 2.0\n"
        );
    }

    #[test]
    fn test_results_table_comments_late_records() {
        let servers = vec![finished_server(0, 1.0, vec![(Job::new(4, 0, 3, 9, 0), 18)])];

        let table = results_table(&servers);
        assert_eq!(
            table,
            "#jobid serverid start end\n#arrival > 20, exclude from graph plot\n#4 0 18 21.0\n"
        );
    }

    #[test]
    fn test_preempted_record_prints_integer_end() {
        let mut server = Server::new(1, 1.0, [2]);
        server.call(0, Job::new(3, 0, 10, 13, 0));
        server.advance();
        server.preempt(1);

        let records = dispatch_records(std::slice::from_ref(&server));
        assert_eq!(records[0].to_string(), "3 1 0 1");
    }

    #[test]
    fn test_power_series() {
        assert_eq!(power_series(&[0.0, 800.0, 600.0]), "0, 800, 600");
        assert_eq!(power_series(&[]), "");
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary {
            job_ids: vec![0, 1, 0],
            power_cap: 1000.0,
            energy_used: 4200.0,
            energy_cap: 10000.0,
            makespan: 9,
            deadline_missed: 2,
            repeat: 0,
        };

        let text = summary.to_string();
        assert!(text.contains("[0, 1, 0]\n"));
        assert!(text.contains("- Power capacity: 1000\n"));
        assert!(text.contains("- Total power used: 4200 / 10000 available\n"));
        assert!(text.contains("- Makespan: 9 unit of time\n"));
        assert!(text.contains("- Deadline missed: 2\n"));
    }
}
