//! Scheduling Test Utilities
//!
//! This crate provides shared utilities for scheduling property tests.
//!
//! ## Test Philosophy
//!
//! - **Exact scenarios**: Scripted burst outcomes make every tick predictable
//! - **Seeded sweeps**: Properties are checked across many random runs
//! - **Prompt exits**: The harness reconciles exits right after each tick,
//!   as a dispatch loop draining its queue would

use core_types::{Tick, WorkerHandle};
use sim_kernel::{
    ConfigError, ProcessSpec, ProcessState, Scheduler, SchedulerConfig, ScriptedBurstPolicy, SignalLog,
    StateCode, TickReport,
};

/// Scheduler driven tick by tick against a recording worker port
pub struct Harness {
    pub scheduler: Scheduler,
    pub log: SignalLog,
    pub workers: Vec<WorkerHandle>,
}

impl Harness {
    /// Builds a started scheduler over `(cpu_burst, priority)` pairs
    pub fn scripted(
        mut config: SchedulerConfig,
        processes: &[(u32, u32)],
        policy: ScriptedBurstPolicy,
    ) -> Result<Self, ConfigError> {
        config.num_processes = processes.len();
        let workers: Vec<WorkerHandle> = processes.iter().map(|_| WorkerHandle::new()).collect();
        let specs = workers
            .iter()
            .zip(processes)
            .map(|(&worker, &(burst, priority))| {
                ProcessSpec::new(worker, burst).with_priority(priority)
            })
            .collect();
        let scheduler = Scheduler::new(config, specs, Box::new(policy))?;
        Ok(Self::started(scheduler, workers))
    }

    /// Builds a started scheduler with randomly sampled bursts
    pub fn random(config: SchedulerConfig) -> Result<Self, ConfigError> {
        let workers: Vec<WorkerHandle> =
            (0..config.num_processes).map(|_| WorkerHandle::new()).collect();
        let scheduler = Scheduler::with_random_bursts(config, &workers)?;
        Ok(Self::started(scheduler, workers))
    }

    fn started(mut scheduler: Scheduler, workers: Vec<WorkerHandle>) -> Self {
        scheduler.start();
        Self {
            scheduler,
            log: SignalLog::new(),
            workers,
        }
    }

    /// Fires one tick, then reconciles every exit it requested
    pub fn tick(&mut self) -> TickReport {
        let report = self.scheduler.on_tick(&mut self.log);
        for worker in self.log.drain_terminations() {
            self.scheduler.reconcile_exit(worker);
        }
        report
    }

    /// Ticks until every process is done; panics past `max_ticks`
    pub fn run_to_completion(&mut self, max_ticks: Tick) -> Tick {
        while !self.scheduler.is_finished() {
            assert!(
                self.scheduler.current_time() < max_ticks,
                "not finished within {} ticks",
                max_ticks
            );
            self.tick();
        }
        self.scheduler.current_time()
    }

    /// First tick in which process `index` was recorded with `code`
    pub fn first_tick_in(&self, index: usize, code: StateCode) -> Option<Tick> {
        self.scheduler
            .history()
            .row(index)
            .iter()
            .position(|&c| c == code)
            .map(|tick| tick as Tick)
    }

    /// Current state of process `index`
    pub fn state(&self, index: usize) -> Option<ProcessState> {
        self.scheduler.processes().get(index).map(|record| record.state)
    }
}

/// Seeded configuration for property sweeps
pub fn sweep_config(seed: u64) -> SchedulerConfig {
    SchedulerConfig {
        num_processes: 8,
        time_quantum: 2,
        max_cpu_burst: 12,
        max_io_time: 4,
        seed: Some(seed),
        ..SchedulerConfig::default()
    }
}
