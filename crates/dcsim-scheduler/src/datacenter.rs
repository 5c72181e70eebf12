//! Discrete-time simulation engine

use dcsim_core::{
    Algorithm, DcsimError, DcsimResult, Dependency, Job, JobId, Server, SimConfig, Summary, Tick,
};
use tracing::{debug, info};

use crate::feasibility::Feasibility;
use crate::layering::Layering;
use crate::policies::{dispatch, DispatchContext, DispatchOutcome};
use crate::queue::WaitingQueue;

/// A datacenter replaying a fixed job set under one dispatch policy
pub struct Datacenter {
    servers: Vec<Server>,
    /// Jobs that have not arrived yet, in list order
    pending: Vec<Job>,
    queue: WaitingQueue,
    layering: Layering,
    algorithm: Algorithm,
    config: SimConfig,
    job_ids: Vec<JobId>,
    feasibility: Option<Feasibility>,
    timestep: Tick,
    power_used: Vec<f64>,
    deadline_missed: u64,
}

impl Datacenter {
    /// Create a datacenter with every server idle and the clock at 0.
    ///
    /// `jobs` is the full job set, periodic occurrences included.
    pub fn new(
        servers: Vec<Server>,
        jobs: Vec<Job>,
        dependencies: &[Dependency],
        algorithm: Algorithm,
        config: SimConfig,
    ) -> Self {
        let layering = Layering::new(dependencies);
        let feasibility =
            (algorithm == Algorithm::Edf).then(|| Feasibility::analyse(&jobs, &servers));

        info!(
            algorithm = %algorithm,
            servers = servers.len(),
            jobs = jobs.len(),
            power_cap = config.power_cap,
            "Datacenter initialized"
        );

        Self {
            job_ids: jobs.iter().map(|job| job.id).collect(),
            servers,
            pending: jobs,
            queue: WaitingQueue::new(),
            layering,
            algorithm,
            config,
            feasibility,
            timestep: 0,
            power_used: Vec::new(),
            deadline_missed: 0,
        }
    }

    /// Run ticks until no job is left waiting or running
    pub fn run(&mut self) -> DcsimResult<()> {
        self.announce();

        while self.is_running() {
            if let Some(limit) = self.config.max_ticks {
                if self.timestep >= limit {
                    return Err(DcsimError::TickLimit(limit));
                }
            }
            self.step();
        }

        info!(
            makespan = self.makespan(),
            energy = self.energy_used(),
            deadline_missed = self.deadline_missed,
            "Simulation complete"
        );
        Ok(())
    }

    /// Whether any job is still to arrive, waiting or running
    pub fn is_running(&self) -> bool {
        !self.pending.is_empty()
            || !self.queue.is_empty()
            || self.servers.iter().any(|server| !server.is_idle())
    }

    /// Simulate one tick
    pub fn step(&mut self) {
        let arrivals = self.admit();

        let power: f64 = self.servers.iter().map(Server::power).sum();
        self.power_used.push(power);

        let running = self.progress();

        let overdue: Vec<JobId> = self.queue.overdue(self.timestep).map(|job| job.id).collect();
        self.deadline_missed += overdue.len() as u64;
        if !overdue.is_empty() {
            debug!(timestep = self.timestep, jobs = ?overdue, "Deadlines missed");
        }

        if !self.config.silent && !(arrivals.is_empty() && power == 0.0) {
            self.narrate_tick(&arrivals, running, power, &overdue);
        }

        if power >= self.config.power_cap {
            debug!(timestep = self.timestep, power = power, "Power cap reached");
            if !self.config.silent {
                println!(
                    "Power capacity is reached ({}/{}), cannot schedule more tasks!",
                    power, self.config.power_cap
                );
            }
        } else {
            self.dispatch_waiting();
        }

        self.check_invariants();
        self.timestep += 1;
    }

    /// Move jobs arriving now into the waiting queue, shifting their deadline
    /// by the current tick
    fn admit(&mut self) -> Vec<(JobId, u64)> {
        let now = self.timestep;
        let (arrived, pending): (Vec<Job>, Vec<Job>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|job| job.arrival == now);
        self.pending = pending;

        arrived
            .into_iter()
            .map(|mut job| {
                job.deadline += now;
                let arrival = (job.id, job.deadline);
                self.queue.push(job);
                arrival
            })
            .collect()
    }

    /// Advance every running job by one tick, returning how many ran
    fn progress(&mut self) -> usize {
        let mut running = 0;
        for server in &mut self.servers {
            if server.is_idle() {
                continue;
            }
            running += 1;
            if let Some(job) = server.advance() {
                debug!(job = job, server = server.id, timestep = self.timestep, "Job completed");
            }
        }
        running
    }

    /// Call the policy once per job waiting when dispatch starts
    fn dispatch_waiting(&mut self) {
        let calls = self.queue.len();
        for _ in 0..calls {
            let mut ctx = DispatchContext {
                servers: &mut self.servers,
                queue: &mut self.queue,
                layering: &self.layering,
                timestep: self.timestep,
            };
            let outcome = dispatch(self.algorithm, &mut ctx);
            self.narrate_dispatch(outcome);
        }
    }

    fn narrate_tick(&self, arrivals: &[(JobId, u64)], running: usize, power: f64, overdue: &[JobId]) {
        println!("\n        *** Time {} ***", self.timestep);
        for (id, deadline) in arrivals {
            println!("Job {} arrives, its deadline is {}", id, deadline);
        }
        println!("Job Running | Waiting | Power consumption");
        println!("     {}      |    {}    |      {}", running, self.queue.len(), power);
        for id in overdue {
            println!("Warning! The job {} missed its deadline!", id);
        }
    }

    fn narrate_dispatch(&self, outcome: DispatchOutcome) {
        if self.config.silent {
            return;
        }
        let server = match outcome {
            DispatchOutcome::Placed { server, .. } | DispatchOutcome::Preempted { server, .. } => {
                &self.servers[server]
            }
            DispatchOutcome::Skipped => return,
        };
        if let Some(job) = server.job() {
            println!(
                "Job {} of relative duration {} has been attributed to server {}",
                job.id,
                job.relative_duration,
                server.id + 1
            );
        }
    }

    /// Narrate the selected policy before the first tick
    pub fn announce(&self) {
        if self.config.silent {
            return;
        }
        match self.algorithm {
            Algorithm::Fifo => println!("Running FIFO"),
            Algorithm::FirstFit => println!(
                "Running first fit. We execute jobs with the smallest duration on the most performant server"
            ),
            Algorithm::Edf => {
                println!(
                    "Running Earliest Deadline First with Constant Static Slowdown (CSS) and a static slowdown of 1."
                );
                if let Some(feasibility) = &self.feasibility {
                    println!("{}", feasibility);
                }
            }
            Algorithm::RoundRobin => println!("Running Round Robin"),
            Algorithm::Wavefront => {
                println!("Running WaveFront");
                println!("The waves are: {:?}", self.layering.waves);
            }
            Algorithm::Cpm => {
                println!("Running Critical Path Method (CPM)");
                println!("The dependency branches are: {:?}", self.layering.branches);
            }
        }
    }

    fn check_invariants(&self) {
        for server in &self.servers {
            debug_assert_eq!(
                server.power() > 0.0,
                !server.is_idle(),
                "Server {} power does not match its occupancy",
                server.id
            );
        }
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn timestep(&self) -> Tick {
        self.timestep
    }

    /// Aggregate power sampled at the start of every tick
    pub fn power_used(&self) -> &[f64] {
        &self.power_used
    }

    pub fn deadline_missed(&self) -> u64 {
        self.deadline_missed
    }

    pub fn waiting(&self) -> &WaitingQueue {
        &self.queue
    }

    pub fn feasibility(&self) -> Option<&Feasibility> {
        self.feasibility.as_ref()
    }

    /// Index of the last simulated tick
    pub fn makespan(&self) -> Tick {
        self.timestep.saturating_sub(1)
    }

    /// Sum of all power samples
    pub fn energy_used(&self) -> f64 {
        self.power_used.iter().sum()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            job_ids: self.job_ids.clone(),
            power_cap: self.config.power_cap,
            energy_used: self.energy_used(),
            energy_cap: self.config.energy_cap,
            makespan: self.makespan(),
            deadline_missed: self.deadline_missed,
            repeat: self.config.repeat,
        }
    }
}
