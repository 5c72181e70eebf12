//! Compute servers: performance, frequency levels and power model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::job::{Job, JobEnd, JobId, Tick};

/// Server identifier as read from the server file
pub type ServerId = u64;

/// Power drawn by a busy server running at its maximum frequency
pub const POWER_MAX: f64 = 200.0;

/// A compute server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Identifier from the server file
    pub id: ServerId,
    /// Work multiplier
    pub performance: f64,
    /// Selectable frequency levels
    pub frequencies: BTreeSet<u32>,
    /// Job currently executing
    job: Option<Job>,
    /// Selected frequency divided by the maximum frequency
    slowdown: f64,
    /// Current power draw, 0 while idle
    power: f64,
    /// Every job instance that ran here, in dispatch order
    queue: Vec<Job>,
}

impl Server {
    /// Create an idle server
    pub fn new(id: ServerId, performance: f64, frequencies: impl IntoIterator<Item = u32>) -> Self {
        Self {
            id,
            performance,
            frequencies: frequencies.into_iter().collect(),
            job: None,
            slowdown: 1.0,
            power: 0.0,
            queue: Vec::new(),
        }
    }

    /// Highest selectable frequency, 0 when none are configured
    pub fn max_frequency(&self) -> u32 {
        self.frequencies.last().copied().unwrap_or(0)
    }

    /// Work done per tick at full speed
    pub fn capacity(&self) -> f64 {
        self.performance * f64::from(self.max_frequency())
    }

    /// Check if the server has no job
    pub fn is_idle(&self) -> bool {
        self.job.is_none()
    }

    /// Job currently executing
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Current power draw
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Current slowdown ratio
    pub fn slowdown(&self) -> f64 {
        self.slowdown
    }

    /// Job instances that have left this server, in dispatch order
    pub fn history(&self) -> &[Job] {
        &self.queue
    }

    /// Start `job` on this idle server at `timestep`.
    ///
    /// The server always selects its maximum frequency. The job's end is
    /// projected from its remaining work, rounded to a tenth of a tick.
    pub fn call(&mut self, timestep: Tick, mut job: Job) {
        debug_assert!(self.job.is_none(), "Server {} already running a job", self.id);

        let frequency = self.max_frequency();
        let job_cost = round_tenth(job.relative_duration / self.performance / f64::from(frequency));
        self.set_slowdown(frequency);
        self.power = POWER_MAX * self.slowdown.powi(2);

        job.start = Some(timestep);
        job.end = Some(JobEnd::Projected(timestep as f64 + job_cost));
        self.job = Some(job);
    }

    /// Run the current job for one tick.
    ///
    /// Returns the id of the job if it completed, in which case the server is
    /// shut down.
    pub fn advance(&mut self) -> Option<JobId> {
        let capacity = self.capacity();
        let job = self.job.as_mut()?;
        job.relative_duration -= capacity;
        job.quantum += 1;

        if job.is_finished() {
            let id = job.id;
            self.shutdown();
            return Some(id);
        }
        None
    }

    /// Stop the current job at `timestep` and return a fresh duplicate of it
    /// carrying the remaining work.
    pub fn preempt(&mut self, timestep: Tick) -> Option<Job> {
        let job = self.job.as_mut()?;
        job.end = Some(JobEnd::Preempted(timestep));
        job.quantum = 0;
        let duplicate = job.duplicate();
        self.shutdown();
        Some(duplicate)
    }

    /// Remove the job and power the server off
    fn shutdown(&mut self) {
        if let Some(job) = self.job.take() {
            self.queue.push(job);
        }
        self.power = 0.0;
    }

    fn set_slowdown(&mut self, frequency: u32) {
        let max = self.max_frequency();
        self.slowdown = if max == 0 {
            1.0
        } else {
            f64::from(frequency) / f64::from(max)
        };
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
