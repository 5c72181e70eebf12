//! Dispatch policies
//!
//! Each call places at most one waiting job. The engine calls the selected
//! policy once per job that was waiting when dispatch started.

use dcsim_core::{Algorithm, JobId, Server, Tick};
use tracing::debug;

use crate::election::{ElectionStrategy, FirstAvailable, MostPowerfulAvailable};
use crate::layering::Layering;
use crate::queue::WaitingQueue;

/// What a single dispatch call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Job placed on an idle server
    Placed { job: JobId, server: usize },
    /// Job placed after preempting the server's previous job
    Preempted {
        job: JobId,
        server: usize,
        victim: JobId,
    },
    /// Nothing could be placed
    Skipped,
}

/// Mutable view of the engine state a policy works on
pub struct DispatchContext<'a> {
    pub servers: &'a mut [Server],
    pub queue: &'a mut WaitingQueue,
    pub layering: &'a Layering,
    pub timestep: Tick,
}

impl DispatchContext<'_> {
    /// Move the job at `index` in the queue onto server `server`
    fn place(&mut self, index: usize, server: usize) -> DispatchOutcome {
        let Some(job) = self.queue.take(index) else {
            return DispatchOutcome::Skipped;
        };
        let id = job.id;
        self.servers[server].call(self.timestep, job);
        debug!(job = id, server = server, timestep = self.timestep, "Job dispatched");
        DispatchOutcome::Placed { job: id, server }
    }

    /// Stop the job on `server` and requeue its duplicate at the back
    fn preempt(&mut self, server: usize) -> Option<JobId> {
        let duplicate = self.servers[server].preempt(self.timestep)?;
        let id = duplicate.id;
        debug!(job = id, server = server, timestep = self.timestep, "Job preempted");
        self.queue.push(duplicate);
        Some(id)
    }

    /// Place the job at `index` on the server elected by `strategy`
    fn elect_and_place(&mut self, index: usize, strategy: &dyn ElectionStrategy) -> DispatchOutcome {
        match strategy.elect(self.servers) {
            Some(server) => self.place(index, server),
            None => DispatchOutcome::Skipped,
        }
    }

    /// Place the job at `index` on `server`, preempting any occupant
    fn force_place(&mut self, index: usize, server: usize) -> DispatchOutcome {
        let victim = self.preempt(server);
        match (self.place(index, server), victim) {
            (DispatchOutcome::Placed { job, server }, Some(victim)) => {
                DispatchOutcome::Preempted { job, server, victim }
            }
            (outcome, _) => outcome,
        }
    }
}

/// Run one dispatch call of `algorithm`
pub fn dispatch(algorithm: Algorithm, ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    if ctx.queue.is_empty() {
        return DispatchOutcome::Skipped;
    }

    match algorithm {
        Algorithm::Fifo => ctx.elect_and_place(0, &FirstAvailable),
        Algorithm::FirstFit => first_fit(ctx),
        Algorithm::Edf => edf(ctx),
        Algorithm::RoundRobin => round_robin(ctx),
        Algorithm::Wavefront => {
            let slot = ctx
                .queue
                .head()
                .and_then(|job| ctx.layering.wave_position(job.id));
            layered(ctx, slot)
        }
        Algorithm::Cpm => {
            let slot = ctx
                .queue
                .head()
                .and_then(|job| ctx.layering.branch_of(job.id));
            layered(ctx, slot)
        }
    }
}

/// Smallest duration first, on the most powerful idle server
fn first_fit(ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    match ctx.queue.position_min_by_key(|job| job.duration) {
        Some(index) => ctx.elect_and_place(index, &MostPowerfulAvailable),
        None => DispatchOutcome::Skipped,
    }
}

/// Earliest deadline first.
///
/// With every server busy, the job running with the latest deadline is
/// preempted when the candidate's absolute deadline is strictly earlier.
fn edf(ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    let Some(index) = ctx.queue.position_min_by_key(|job| job.deadline) else {
        return DispatchOutcome::Skipped;
    };

    if ctx.servers.iter().any(Server::is_idle) {
        return ctx.elect_and_place(index, &MostPowerfulAvailable);
    }

    // Last server wins on equal deadlines
    let victim = ctx
        .servers
        .iter()
        .enumerate()
        .filter_map(|(server, s)| s.job().map(|job| (server, job)))
        .max_by_key(|(_, job)| job.deadline)
        .map(|(server, job)| (server, job.relative_deadline));
    let Some((server, running_deadline)) = victim else {
        return DispatchOutcome::Skipped;
    };

    let candidate_deadline = ctx.queue.get(index).map(|job| job.relative_deadline);
    match candidate_deadline {
        Some(deadline) if deadline < running_deadline => ctx.force_place(index, server),
        _ => DispatchOutcome::Skipped,
    }
}

/// Requeue every job that used up its one-tick quantum, then dispatch the
/// queue head on the most powerful idle server.
///
/// Ticks skipped by the power cap let a quantum run past one tick; such jobs
/// are requeued at the next dispatch.
fn round_robin(ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    for server in 0..ctx.servers.len() {
        let expired = ctx.servers[server]
            .job()
            .map_or(false, |job| job.quantum >= 1);
        if expired {
            ctx.preempt(server);
        }
    }

    ctx.elect_and_place(0, &MostPowerfulAvailable)
}

/// Place the queue head on server `slot % servers`, preempting the occupant.
/// Falls back to the most powerful idle server when the head has no slot.
fn layered(ctx: &mut DispatchContext<'_>, slot: Option<usize>) -> DispatchOutcome {
    match slot {
        Some(slot) if !ctx.servers.is_empty() => {
            let server = slot % ctx.servers.len();
            ctx.force_place(0, server)
        }
        _ => ctx.elect_and_place(0, &MostPowerfulAvailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcsim_core::{Job, JobEnd};

    fn servers() -> Vec<Server> {
        vec![
            Server::new(0, 1.0, [1, 2, 3]),
            Server::new(1, 1.0, [1, 2]),
            Server::new(2, 2.0, [1, 2, 3]),
            Server::new(3, 2.0, [1, 2]),
        ]
    }

    fn queue(jobs: Vec<Job>) -> WaitingQueue {
        let mut queue = WaitingQueue::new();
        for job in jobs {
            queue.push(job);
        }
        queue
    }

    fn run(
        algorithm: Algorithm,
        servers: &mut [Server],
        queue: &mut WaitingQueue,
        layering: &Layering,
        timestep: Tick,
    ) -> DispatchOutcome {
        let mut ctx = DispatchContext {
            servers,
            queue,
            layering,
            timestep,
        };
        dispatch(algorithm, &mut ctx)
    }

    #[test]
    fn test_fifo_places_head_on_first_idle() {
        let mut servers = servers();
        let mut queue = queue(vec![Job::new(5, 0, 10, 10, 0), Job::new(6, 0, 1, 10, 0)]);
        let layering = Layering::default();

        let outcome = run(Algorithm::Fifo, &mut servers, &mut queue, &layering, 0);
        assert_eq!(outcome, DispatchOutcome::Placed { job: 5, server: 0 });
        assert_eq!(queue.head().map(|j| j.id), Some(6));
    }

    #[test]
    fn test_first_fit_picks_smallest_duration() {
        let mut servers = servers();
        let mut queue = queue(vec![Job::new(5, 0, 10, 10, 0), Job::new(6, 0, 1, 10, 0)]);
        let layering = Layering::default();

        let outcome = run(Algorithm::FirstFit, &mut servers, &mut queue, &layering, 0);
        assert_eq!(outcome, DispatchOutcome::Placed { job: 6, server: 2 });
    }

    #[test]
    fn test_empty_queue_is_skipped() {
        let mut servers = servers();
        let mut queue = WaitingQueue::new();
        let layering = Layering::default();

        for algorithm in Algorithm::ALL {
            let outcome = run(algorithm, &mut servers, &mut queue, &layering, 0);
            assert_eq!(outcome, DispatchOutcome::Skipped);
        }
    }

    #[test]
    fn test_edf_preempts_latest_deadline() {
        let mut servers = servers();
        for (i, deadline) in [10, 13, 11, 12].into_iter().enumerate() {
            servers[i].call(0, Job::new(i as u64, 0, 10, deadline, 0));
        }
        let mut queue = queue(vec![Job::new(4, 1, 4, 2, 0)]);
        let layering = Layering::default();

        let outcome = run(Algorithm::Edf, &mut servers, &mut queue, &layering, 1);
        assert_eq!(
            outcome,
            DispatchOutcome::Preempted {
                job: 4,
                server: 1,
                victim: 1
            }
        );
        assert_eq!(servers[1].job().map(|j| j.id), Some(4));
        assert_eq!(servers[1].history()[0].end, Some(JobEnd::Preempted(1)));

        let requeued = queue.head().unwrap();
        assert_eq!(requeued.id, 1);
        assert!(requeued.start.is_none());
    }

    #[test]
    fn test_edf_keeps_running_jobs_with_earlier_deadlines() {
        let mut servers = servers();
        for i in 0..4 {
            servers[i].call(0, Job::new(i as u64, 0, 10, 5, 0));
        }
        let mut queue = queue(vec![Job::new(4, 0, 4, 9, 0)]);
        let layering = Layering::default();

        let outcome = run(Algorithm::Edf, &mut servers, &mut queue, &layering, 1);
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_edf_ties_preempt_last_server() {
        let mut servers = servers();
        for i in 0..4 {
            servers[i].call(0, Job::new(i as u64, 0, 10, 9, 0));
        }
        let mut queue = queue(vec![Job::new(4, 0, 4, 2, 0)]);
        let layering = Layering::default();

        let outcome = run(Algorithm::Edf, &mut servers, &mut queue, &layering, 1);
        assert!(matches!(outcome, DispatchOutcome::Preempted { server: 3, .. }));
    }

    #[test]
    fn test_round_robin_requeues_expired_quantum() {
        let mut servers = servers();
        servers[2].call(0, Job::new(0, 0, 20, 30, 0));
        servers[2].advance();
        let mut queue = queue(vec![Job::new(1, 1, 4, 30, 0)]);
        let layering = Layering::default();

        let outcome = run(Algorithm::RoundRobin, &mut servers, &mut queue, &layering, 1);
        assert_eq!(outcome, DispatchOutcome::Placed { job: 1, server: 2 });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head().map(|j| (j.id, j.quantum)), Some((0, 0)));
        assert_eq!(servers[2].history()[0].end, Some(JobEnd::Preempted(1)));
    }

    #[test]
    fn test_round_robin_requeues_overrun_quantum() {
        let mut servers = servers();
        servers[2].call(0, Job::new(0, 0, 30, 40, 0));
        servers[2].advance();
        servers[2].advance();
        assert_eq!(servers[2].job().map(|j| j.quantum), Some(2));

        let mut queue = queue(vec![Job::new(1, 1, 4, 40, 0)]);
        let layering = Layering::default();

        let outcome = run(Algorithm::RoundRobin, &mut servers, &mut queue, &layering, 2);
        assert_eq!(outcome, DispatchOutcome::Placed { job: 1, server: 2 });
        assert_eq!(queue.head().map(|j| j.id), Some(0));
        assert_eq!(servers[2].history()[0].end, Some(JobEnd::Preempted(2)));
    }

    #[test]
    fn test_wavefront_places_by_wave_position() {
        let mut servers = servers();
        servers[1].call(0, Job::new(7, 0, 20, 30, 0));
        let mut queue = queue(vec![Job::new(3, 0, 4, 30, 0)]);
        let layering = Layering::new(&[(0, 1), (1, 2), (1, 3)]);

        let outcome = run(Algorithm::Wavefront, &mut servers, &mut queue, &layering, 2);
        assert_eq!(
            outcome,
            DispatchOutcome::Preempted {
                job: 3,
                server: 1,
                victim: 7
            }
        );
        assert_eq!(queue.head().map(|j| j.id), Some(7));
    }

    #[test]
    fn test_wavefront_falls_back_to_most_powerful() {
        let mut servers = servers();
        let mut queue = queue(vec![Job::new(9, 0, 4, 30, 0)]);
        let layering = Layering::new(&[(0, 1)]);

        let outcome = run(Algorithm::Wavefront, &mut servers, &mut queue, &layering, 0);
        assert_eq!(outcome, DispatchOutcome::Placed { job: 9, server: 2 });
    }

    #[test]
    fn test_cpm_places_by_branch() {
        let mut servers = servers();
        let mut queue = queue(vec![Job::new(3, 0, 4, 30, 0), Job::new(8, 0, 4, 30, 0)]);
        let layering = Layering::new(&[(0, 1), (1, 2), (1, 3)]);

        let outcome = run(Algorithm::Cpm, &mut servers, &mut queue, &layering, 0);
        assert_eq!(outcome, DispatchOutcome::Placed { job: 3, server: 1 });

        let outcome = run(Algorithm::Cpm, &mut servers, &mut queue, &layering, 0);
        assert_eq!(outcome, DispatchOutcome::Placed { job: 8, server: 2 });
    }
}
