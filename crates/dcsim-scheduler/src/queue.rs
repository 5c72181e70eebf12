//! Waiting queue of jobs not yet placed on a server

use dcsim_core::{Job, Tick};

/// Jobs awaiting placement, in insertion order
#[derive(Debug, Clone, Default)]
pub struct WaitingQueue {
    jobs: Vec<Job>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job at the back
    pub fn push(&mut self, job: Job) {
        self.jobs.push(job);
    }

    /// Oldest job in the queue
    pub fn head(&self) -> Option<&Job> {
        self.jobs.first()
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    /// Take the job at `index` out of the queue
    pub fn take(&mut self, index: usize) -> Option<Job> {
        (index < self.jobs.len()).then(|| self.jobs.remove(index))
    }

    /// Index of the first job with the smallest key
    pub fn position_min_by_key<K: Ord>(&self, key: impl Fn(&Job) -> K) -> Option<usize> {
        self.jobs
            .iter()
            .enumerate()
            .min_by_key(|&(_, job)| key(job))
            .map(|(index, _)| index)
    }

    /// Jobs whose deadline is at or before `timestep`
    pub fn overdue(&self, timestep: Tick) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(move |job| job.deadline <= timestep)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
