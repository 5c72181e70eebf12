//! Job type definitions and periodic expansion

use serde::{Deserialize, Serialize};
use std::fmt;

/// Job identifier as read from the job file.
///
/// Not unique across instances: periodic and preemption duplicates reuse the
/// identifier of the job they were copied from.
pub type JobId = u64;

/// One discrete unit of simulated time
pub type Tick = u64;

/// How a job instance stopped running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobEnd {
    /// Completion time projected when the job was dispatched
    Projected(f64),
    /// Tick at which the job was preempted
    Preempted(Tick),
}

impl JobEnd {
    /// The end time as a plain number
    pub fn as_f64(&self) -> f64 {
        match self {
            JobEnd::Projected(at) => *at,
            JobEnd::Preempted(tick) => *tick as f64,
        }
    }
}

impl fmt::Display for JobEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the fractional part on whole numbers ("5.0")
            JobEnd::Projected(at) => write!(f, "{:?}", at),
            JobEnd::Preempted(tick) => write!(f, "{}", tick),
        }
    }
}

/// A schedulable unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier from the job file
    pub id: JobId,
    /// Tick at which the job becomes eligible to run
    pub arrival: Tick,
    /// Nominal amount of work
    pub duration: u64,
    /// Work left to do; the job is complete once this drops to zero or below
    pub relative_duration: f64,
    /// Deadline offset, shifted by the admission tick when the job arrives
    pub deadline: u64,
    /// `arrival + deadline`, fixed when the job is first created
    pub relative_deadline: u64,
    /// Recurrence interval, 0 for one-shot jobs
    pub periodicity: u64,
    /// Ticks spent running since the last dispatch
    pub quantum: u32,
    /// Tick at which this instance was dispatched
    pub start: Option<Tick>,
    /// Projected completion or preemption tick
    pub end: Option<JobEnd>,
}

impl Job {
    /// Create a job that has never run
    pub fn new(id: JobId, arrival: Tick, duration: u64, deadline: u64, periodicity: u64) -> Self {
        Self {
            id,
            arrival,
            duration,
            relative_duration: duration as f64,
            deadline,
            relative_deadline: arrival + deadline,
            periodicity,
            quantum: 0,
            start: None,
            end: None,
        }
    }

    /// Copy this instance into a fresh one that has not been dispatched.
    ///
    /// Remaining work and deadlines carry over; `quantum`, `start` and `end`
    /// are reset.
    pub fn duplicate(&self) -> Self {
        Self {
            quantum: 0,
            start: None,
            end: None,
            ..self.clone()
        }
    }

    /// The next occurrence of a periodic job, `None` for one-shot jobs.
    ///
    /// The occurrence arrives `periodicity` ticks later with its full duration
    /// and keeps this job's `relative_deadline`.
    pub fn next_period(&self) -> Option<Self> {
        if self.periodicity == 0 {
            return None;
        }

        let mut next = self.duplicate();
        next.arrival = self.arrival + self.periodicity;
        next.relative_duration = self.duration as f64;
        Some(next)
    }

    /// Whether all the work of this instance has been done
    pub fn is_finished(&self) -> bool {
        self.relative_duration <= 0.0
    }
}

/// Add one extra occurrence for every periodic job.
///
/// Jobs are visited in list order; a job is only repeated when its id occurs
/// exactly once in the list, so each id gets at most one duplicate. The
/// duplicate is inserted after the last job arriving no later than it.
pub fn expand_periodic(mut jobs: Vec<Job>) -> Vec<Job> {
    let mut i = 0;
    while i < jobs.len() {
        let id = jobs[i].id;
        let occurrences = jobs.iter().filter(|j| j.id == id).count();

        if occurrences == 1 {
            if let Some(next) = jobs[i].next_period() {
                let at = jobs
                    .iter()
                    .rposition(|j| j.arrival <= next.arrival)
                    .map_or(0, |pos| pos + 1);
                jobs.insert(at, next);
                if at <= i {
                    i += 1;
                }
            }
        }

        i += 1;
    }

    jobs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_new() {
        let job = Job::new(3, 2, 10, 5, 0);
        assert_eq!(job.relative_duration, 10.0);
        assert_eq!(job.relative_deadline, 7);
        assert_eq!(job.quantum, 0);
        assert!(job.start.is_none());
        assert!(job.end.is_none());
    }

    #[test]
    fn test_duplicate_resets_run_state() {
        let mut job = Job::new(1, 0, 10, 5, 0);
        job.relative_duration = 4.0;
        job.quantum = 1;
        job.start = Some(2);
        job.end = Some(JobEnd::Preempted(3));

        let dup = job.duplicate();
        assert_eq!(dup.id, 1);
        assert_eq!(dup.relative_duration, 4.0);
        assert_eq!(dup.quantum, 0);
        assert!(dup.start.is_none());
        assert!(dup.end.is_none());
    }

    #[test]
    fn test_next_period() {
        let job = Job::new(1, 2, 10, 5, 8);
        let next = job.next_period().unwrap();
        assert_eq!(next.arrival, 10);
        assert_eq!(next.relative_deadline, job.relative_deadline);
        assert_eq!(next.deadline, 5);

        assert!(Job::new(2, 0, 10, 5, 0).next_period().is_none());
    }

    #[test]
    fn test_expand_periodic_inserts_in_arrival_order() {
        let jobs = vec![
            Job::new(0, 0, 4, 10, 3),
            Job::new(1, 1, 4, 10, 0),
            Job::new(2, 5, 4, 10, 0),
        ];

        let expanded = expand_periodic(jobs);
        let order: Vec<(JobId, Tick)> = expanded.iter().map(|j| (j.id, j.arrival)).collect();
        assert_eq!(order, vec![(0, 0), (1, 1), (0, 3), (2, 5)]);
    }

    #[test]
    fn test_expand_periodic_keeps_duplicate_on_arrival_tie() {
        let jobs = vec![Job::new(0, 0, 4, 10, 3), Job::new(1, 3, 4, 10, 0)];

        let expanded = expand_periodic(jobs);
        let order: Vec<(JobId, Tick)> = expanded.iter().map(|j| (j.id, j.arrival)).collect();
        assert_eq!(order, vec![(0, 0), (1, 3), (0, 3)]);
    }

    #[test]
    fn test_expand_periodic_single_extra_occurrence() {
        let jobs = vec![Job::new(0, 0, 4, 10, 2), Job::new(1, 0, 4, 10, 2)];

        let expanded = expand_periodic(jobs);
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded.iter().filter(|j| j.id == 0).count(), 2);
        assert_eq!(expanded.iter().filter(|j| j.id == 1).count(), 2);
    }

    #[test]
    fn test_expand_periodic_skips_repeated_ids() {
        let jobs = vec![Job::new(7, 0, 4, 10, 2), Job::new(7, 1, 4, 10, 2)];

        let expanded = expand_periodic(jobs);
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn test_job_end_display() {
        assert_eq!(JobEnd::Projected(5.0).to_string(), "5.0");
        assert_eq!(JobEnd::Projected(3.3).to_string(), "3.3");
        assert_eq!(JobEnd::Preempted(1).to_string(), "1");
    }
}
