//! # Simulation Runtime
//!
//! The dispatch loop that ties the scheduler to its workers.
//!
//! The loop is the single consumer of the event queue and the sole owner of
//! the [`Scheduler`]. Workers only ever send `WorkerExited`; the timer only
//! ever produces `Tick`. Because events are applied one at a time, a tick
//! and an exit reconciliation never overlap.

use crossbeam_channel::{select, tick, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, info, warn};
use serde::Serialize;
use services_worker_pool::{SimulatedWorkers, ThreadWorkers, WorkerPoolError};
use sim_kernel::{
    ConfigError, ProcessState, ScheduleEvent, Scheduler, SchedulerConfig, SchedulerEvent,
    SimulationSummary, WorkerPort,
};
use std::time::Duration;
use thiserror::Error;

/// How long the loop waits for asynchronous exits before ticking past them
pub const DEFAULT_EXIT_GRACE: Duration = Duration::from_millis(50);

/// Runtime error types
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker pool error: {0}")]
    Workers(#[from] WorkerPoolError),

    #[error("Tick budget exhausted after {ticks} ticks ({completed}/{total} completed)")]
    TickBudgetExhausted {
        ticks: u64,
        completed: usize,
        total: usize,
    },

    #[error("Event queue closed with unfinished processes")]
    EventChannelClosed,
}

/// Source of the periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    /// Tick as soon as pending exits are drained
    Immediate,
    /// Tick on a wall-clock interval
    Interval(Duration),
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub summary: SimulationSummary,
    pub audit_log: Vec<ScheduleEvent>,
}

/// Creates the event queue shared by the timer, the workers and the loop
pub fn event_queue() -> (Sender<SchedulerEvent>, Receiver<SchedulerEvent>) {
    unbounded()
}

/// A scheduler, its workers and the queue connecting them
pub struct Simulation<W: WorkerPort> {
    scheduler: Scheduler,
    workers: W,
    events: Receiver<SchedulerEvent>,
    tick_source: TickSource,
    exit_grace: Option<Duration>,
}

impl Simulation<SimulatedWorkers> {
    /// Builds a deterministic run over in-process workers with randomly
    /// sampled bursts
    pub fn simulated(config: SchedulerConfig, tick_source: TickSource) -> Result<Self, RuntimeError> {
        config.validate()?;
        let (tx, rx) = event_queue();
        let workers = SimulatedWorkers::spawn(config.num_processes, tx);
        let scheduler = Scheduler::with_random_bursts(config, workers.handles())?;
        Ok(Self::new(scheduler, workers, rx, tick_source))
    }
}

impl Simulation<ThreadWorkers> {
    /// Builds a run over one OS thread per process
    pub fn threaded(config: SchedulerConfig, tick_source: TickSource) -> Result<Self, RuntimeError> {
        config.validate()?;
        let (tx, rx) = event_queue();
        let workers = ThreadWorkers::spawn(config.num_processes, tx)?;
        let scheduler = Scheduler::with_random_bursts(config, workers.handles())?;
        Ok(Self::new(scheduler, workers, rx, tick_source).with_exit_grace(DEFAULT_EXIT_GRACE))
    }
}

impl<W: WorkerPort> Simulation<W> {
    /// Wires an existing scheduler to `workers`, whose exits arrive on `events`
    pub fn new(
        scheduler: Scheduler,
        workers: W,
        events: Receiver<SchedulerEvent>,
        tick_source: TickSource,
    ) -> Self {
        Self {
            scheduler,
            workers,
            events,
            tick_source,
            exit_grace: None,
        }
    }

    /// Waits up to `grace` for outstanding exits whenever every unfinished
    /// process is already exiting
    pub fn with_exit_grace(mut self, grace: Duration) -> Self {
        self.exit_grace = Some(grace);
        self
    }

    /// Runs until every process is done.
    ///
    /// Fails with [`RuntimeError::TickBudgetExhausted`] once the configured
    /// `max_ticks` have elapsed with processes still unfinished.
    pub fn run(&mut self) -> Result<SimulationReport, RuntimeError> {
        info!(
            "starting {:?} simulation of {} processes (quantum {})",
            self.scheduler.config().policy,
            self.scheduler.processes().len(),
            self.scheduler.config().time_quantum
        );
        self.scheduler.start();

        let events = self.events.clone();
        let ticker = match self.tick_source {
            TickSource::Immediate => None,
            TickSource::Interval(period) => Some(tick(period)),
        };

        while !self.scheduler.is_finished() {
            self.check_budget()?;
            match &ticker {
                None => self.step_immediate()?,
                Some(ticker) => {
                    select! {
                        recv(events) -> event => {
                            let event = event.map_err(|_| RuntimeError::EventChannelClosed)?;
                            self.dispatch(event);
                        }
                        recv(ticker) -> _ => self.dispatch(SchedulerEvent::Tick),
                    }
                }
            }
        }

        info!(
            "simulation finished after {} ticks",
            self.scheduler.current_time()
        );
        Ok(self.report())
    }

    /// Delivers pending exits, then fires one tick
    fn step_immediate(&mut self) -> Result<(), RuntimeError> {
        self.drain_events()?;
        if self.scheduler.is_finished() {
            return Ok(());
        }

        if let Some(grace) = self.exit_grace {
            if self.only_exits_outstanding() {
                match self.events.recv_timeout(grace) {
                    Ok(event) => {
                        self.dispatch(event);
                        return Ok(());
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(RuntimeError::EventChannelClosed)
                    }
                }
            }
        }

        self.dispatch(SchedulerEvent::Tick);
        Ok(())
    }

    fn drain_events(&mut self) -> Result<(), RuntimeError> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.dispatch(event),
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) if self.scheduler.is_finished() => return Ok(()),
                Err(TryRecvError::Disconnected) => return Err(RuntimeError::EventChannelClosed),
            }
        }
    }

    fn dispatch(&mut self, event: SchedulerEvent) {
        debug!("dispatch: {:?} at tick {}", event, self.scheduler.current_time());
        self.scheduler.handle_event(event, &mut self.workers);
    }

    fn only_exits_outstanding(&self) -> bool {
        let processes = self.scheduler.processes();
        let exiting = processes.count_in(ProcessState::Exiting);
        exiting > 0 && exiting + self.scheduler.completed_count() == processes.len()
    }

    fn check_budget(&self) -> Result<(), RuntimeError> {
        let Some(max_ticks) = self.scheduler.config().max_ticks else {
            return Ok(());
        };
        let ticks = self.scheduler.current_time();
        if ticks < max_ticks {
            return Ok(());
        }

        let completed = self.scheduler.completed_count();
        let total = self.scheduler.processes().len();
        warn!(
            "supervisor: tick budget of {} exhausted with {}/{} processes completed",
            max_ticks, completed, total
        );
        Err(RuntimeError::TickBudgetExhausted {
            ticks,
            completed,
            total,
        })
    }

    /// Summary and audit trail of the run so far
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            summary: SimulationSummary::from_scheduler(&self.scheduler),
            audit_log: self.scheduler.audit_log().to_vec(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn workers(&self) -> &W {
        &self.workers
    }

    pub fn workers_mut(&mut self) -> &mut W {
        &mut self.workers
    }

    /// Consumes the simulation, returning its workers
    pub fn into_workers(self) -> W {
        self.workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_kernel::{AgingConfig, ProcessSpec, ScriptedBurstPolicy};

    fn config(processes: usize) -> SchedulerConfig {
        SchedulerConfig {
            num_processes: processes,
            seed: Some(11),
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn test_simulated_run_completes() {
        let mut simulation = Simulation::simulated(config(5), TickSource::Immediate).unwrap();
        let report = simulation.run().unwrap();

        assert_eq!(report.summary.completed, 5);
        assert_eq!(report.summary.completion_order.len(), 5);
        assert!(simulation.scheduler().is_finished());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut simulation =
                Simulation::simulated(config(6), TickSource::Immediate).unwrap();
            simulation.run().unwrap().summary
        };
        let a = run();
        let b = run();
        assert_eq!(a.total_ticks, b.total_ticks);
        assert_eq!(a.completion_order, b.completion_order);
        assert_eq!(
            a.processes.iter().map(|p| p.wait_time).collect::<Vec<_>>(),
            b.processes.iter().map(|p| p.wait_time).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Simulation::simulated(config(0), TickSource::Immediate);
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::NoProcesses))
        ));
    }

    #[test]
    fn test_stuck_worker_exhausts_budget() {
        let (tx, rx) = event_queue();
        let mut workers = SimulatedWorkers::spawn(2, tx);
        workers.ignore_terminate(workers.handles()[1]);

        let config = SchedulerConfig {
            num_processes: 2,
            max_ticks: Some(40),
            aging: AgingConfig::disabled(),
            ..SchedulerConfig::default()
        };
        let specs = workers
            .handles()
            .iter()
            .map(|&h| ProcessSpec::new(h, 2))
            .collect();
        let scheduler =
            Scheduler::new(config, specs, Box::new(ScriptedBurstPolicy::new())).unwrap();
        let mut simulation = Simulation::new(scheduler, workers, rx, TickSource::Immediate);

        match simulation.run() {
            Err(RuntimeError::TickBudgetExhausted {
                ticks,
                completed,
                total,
            }) => {
                assert_eq!(ticks, 40);
                assert_eq!(completed, 1);
                assert_eq!(total, 2);
            }
            other => panic!("expected tick budget exhaustion, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_interval_ticks_complete() {
        let config = SchedulerConfig {
            num_processes: 2,
            max_cpu_burst: 3,
            max_io_time: 1,
            seed: Some(5),
            ..SchedulerConfig::default()
        };
        let mut simulation =
            Simulation::simulated(config, TickSource::Interval(Duration::from_millis(1))).unwrap();
        let report = simulation.run().unwrap();
        assert_eq!(report.summary.completed, 2);
    }

    #[test]
    fn test_threaded_run_completes() {
        let config = SchedulerConfig {
            num_processes: 4,
            max_cpu_burst: 10,
            seed: Some(23),
            ..SchedulerConfig::default()
        };
        let mut simulation = Simulation::threaded(config, TickSource::Immediate).unwrap();
        let report = simulation.run().unwrap();
        assert_eq!(report.summary.completed, 4);

        let mut workers = simulation.into_workers();
        workers.shutdown().unwrap();
    }
}
