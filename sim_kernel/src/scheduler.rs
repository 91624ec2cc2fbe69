//! Preemptive priority scheduler with aging
//!
//! This module holds the tick driver and the completion reconciler. Both are
//! `&mut self` entry points on a single owned [`Scheduler`], so whoever owns
//! the scheduler decides how ticks and exit notifications are serialized;
//! they can never interleave inside one call.
//!
//! ## Per-tick phases
//!
//! 1. Advance the clock.
//! 2. Charge a tick of waiting to every READY process, then run aging.
//! 3. Count down sleepers; finished I/O returns the process to READY with a
//!    fresh quantum and a one-step promotion.
//! 4. The running process executes one unit. An exhausted burst either
//!    requests termination or blocks on I/O; an expired quantum demotes it
//!    and puts it back in the ready set.
//! 5. An idle CPU is handed to the selector.
//! 6. The history log records how every process spent the tick.
//!
//! Termination is two-step: the driver only *requests* an exit and parks the
//! process in `Exiting`. It becomes `Done` when the worker's exit
//! notification reaches [`Scheduler::reconcile_exit`].

use crate::aging::AgingEngine;
use crate::burst::{BurstOutcome, BurstPolicy, RandomBurstPolicy};
use crate::config::SchedulerConfig;
use crate::error::{ConfigError, InvariantViolation};
use crate::event::SchedulerEvent;
use crate::history::{History, StateCode};
use crate::process::{ProcessRecord, ProcessSpec, ProcessState, ProcessTable};
use crate::selector::select_next;
use crate::worker::WorkerPort;
use core_types::{Tick, WorkerHandle};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Scheduling event for audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// Process was given the CPU
    ProcessSelected { index: usize, timestamp_ticks: Tick },
    /// Process left the CPU before finishing
    ProcessPreempted {
        index: usize,
        reason: PreemptionReason,
        timestamp_ticks: Tick,
    },
    /// Worker was asked to exit
    TerminationRequested { index: usize, timestamp_ticks: Tick },
    /// Pending I/O finished
    IoCompleted { index: usize, timestamp_ticks: Tick },
    /// Aging promoted a waiting process
    PriorityAged {
        index: usize,
        from: u32,
        to: u32,
        timestamp_ticks: Tick,
    },
    /// Exit notification reconciled
    ProcessCompleted { index: usize, timestamp_ticks: Tick },
}

/// Reason for leaving the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreemptionReason {
    /// Time quantum expired
    QuantumExpired,
    /// Burst exhausted and the process blocked on I/O
    IoRequested,
}

/// Result of reconciling one exit notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Process marked done
    Completed { index: usize },
    /// Process was already done; nothing changed
    AlreadyDone { index: usize },
    /// No process is backed by this worker; ignored
    UnknownWorker,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    /// Process that executed a unit this tick
    pub ran: Option<usize>,
    /// Process holding the CPU once the tick finished
    pub running: Option<usize>,
    /// Whether the tick made it into the history log
    pub recorded: bool,
}

/// Scheduler state
///
/// Owns every process record and all process-wide scheduling state.
pub struct Scheduler {
    config: SchedulerConfig,
    table: ProcessTable,
    history: History,
    aging: AgingEngine,
    burst_policy: Box<dyn BurstPolicy>,
    current_time: Tick,
    current_running: Option<usize>,
    last_scheduled: Option<usize>,
    completed_count: usize,
    audit_log: Vec<ScheduleEvent>,
}

impl Scheduler {
    /// Creates a scheduler over `specs`, one per configured process.
    ///
    /// Every process starts READY at tick 0. Nothing runs until
    /// [`start`](Self::start) or the first tick.
    pub fn new(
        config: SchedulerConfig,
        specs: Vec<ProcessSpec>,
        burst_policy: Box<dyn BurstPolicy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if specs.len() != config.num_processes {
            return Err(ConfigError::ProcessCountMismatch {
                expected: config.num_processes,
                actual: specs.len(),
            });
        }

        let mut priorities = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if spec.cpu_burst == 0 {
                return Err(ConfigError::ZeroInitialBurst { index });
            }
            let priority = spec
                .priority
                .unwrap_or_else(|| config.default_priority_for(index));
            if !(config.min_priority..=config.max_priority).contains(&priority) {
                return Err(ConfigError::PriorityOutOfRange {
                    index,
                    priority,
                    min: config.min_priority,
                    max: config.max_priority,
                });
            }
            priorities.push(priority);
        }

        let table = ProcessTable::new(&specs, &priorities, config.time_quantum, 0);
        let history = History::new(specs.len(), config.history_horizon);
        let aging = AgingEngine::from_config(&config);

        Ok(Self {
            config,
            table,
            history,
            aging,
            burst_policy,
            current_time: 0,
            current_running: None,
            last_scheduled: None,
            completed_count: 0,
            audit_log: Vec::new(),
        })
    }

    /// Creates a scheduler whose initial bursts and exit decisions are
    /// sampled by a [`RandomBurstPolicy`] seeded from the configuration
    pub fn with_random_bursts(
        config: SchedulerConfig,
        workers: &[WorkerHandle],
    ) -> Result<Self, ConfigError> {
        let mut policy = RandomBurstPolicy::from_config(&config);
        let specs = workers
            .iter()
            .map(|&worker| ProcessSpec::new(worker, policy.sample_burst()))
            .collect();
        Self::new(config, specs, Box::new(policy))
    }

    /// Hands the CPU to the first process before any tick runs
    pub fn start(&mut self) -> Option<usize> {
        if self.current_running.is_none() {
            self.dispatch();
        }
        self.current_running
    }

    /// Processes one timer tick
    pub fn on_tick(&mut self, workers: &mut dyn WorkerPort) -> TickReport {
        self.current_time += 1;
        let tick = self.current_time;

        // How each process spends this tick is fixed by its state as the
        // tick begins; RUNNING here means it is about to execute a unit.
        let codes: Vec<StateCode> = self.table.iter().map(|r| StateCode::from(r.state)).collect();

        self.account_wait_time();
        for promotion in self.aging.age_ready(&mut self.table) {
            self.audit_log.push(ScheduleEvent::PriorityAged {
                index: promotion.index,
                from: promotion.from,
                to: promotion.to,
                timestamp_ticks: tick,
            });
        }
        self.advance_sleepers();

        let ran = self.run_current(workers);
        if self.current_running.is_none() {
            self.dispatch();
        }

        let recorded = self.history.record(tick, &codes);
        debug_assert_eq!(self.check_invariants(), Ok(()));

        TickReport {
            tick,
            ran,
            running: self.current_running,
            recorded,
        }
    }

    /// Reconciles a worker's exit notification.
    ///
    /// Idempotent: a second notification for a finished process, or one for
    /// an unknown worker, changes nothing.
    pub fn reconcile_exit(&mut self, worker: WorkerHandle) -> ReconcileOutcome {
        let Some(index) = self.table.index_of(worker) else {
            debug!("reconcile: ignoring exit of unknown {}", worker);
            return ReconcileOutcome::UnknownWorker;
        };
        let now = self.current_time;
        let total = self.table.len();
        let Some(record) = self.table.get_mut(index) else {
            return ReconcileOutcome::UnknownWorker;
        };
        if record.is_done() {
            debug!("reconcile: P{} already done", index);
            return ReconcileOutcome::AlreadyDone { index };
        }

        record.state = ProcessState::Done;
        record.completion_time = Some(now);
        self.completed_count += 1;
        self.audit_log.push(ScheduleEvent::ProcessCompleted {
            index,
            timestamp_ticks: now,
        });
        info!(
            "P{} completed at tick {} (initial priority {}) - {}/{}",
            index,
            now,
            record.initial_priority,
            self.completed_count,
            total
        );

        if self.current_running == Some(index) {
            self.current_running = None;
        }
        if self.current_running.is_none() {
            self.dispatch();
        }

        ReconcileOutcome::Completed { index }
    }

    /// Applies one event from the dispatch queue
    pub fn handle_event(&mut self, event: SchedulerEvent, workers: &mut dyn WorkerPort) {
        match event {
            SchedulerEvent::Tick => {
                self.on_tick(workers);
            }
            SchedulerEvent::WorkerExited(worker) => {
                self.reconcile_exit(worker);
            }
        }
    }

    /// Verifies the process-wide invariants
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let running = self.table.indices_in(ProcessState::Running);
        if running.len() > 1 {
            return Err(InvariantViolation::MultipleRunning(running));
        }
        if running.first().copied() != self.current_running {
            return Err(InvariantViolation::RunningIndexMismatch {
                index: self.current_running,
            });
        }
        let done = self.table.count_in(ProcessState::Done);
        if done != self.completed_count {
            return Err(InvariantViolation::CompletedCountMismatch {
                counted: self.completed_count,
                done,
            });
        }
        Ok(())
    }

    /// Returns true once every process has completed
    pub fn is_finished(&self) -> bool {
        self.completed_count == self.table.len()
    }

    /// Snapshot of the record at `index`
    pub fn record(&self, index: usize) -> Option<ProcessRecord> {
        self.table.get(index).cloned()
    }

    /// All process records
    pub fn processes(&self) -> &ProcessTable {
        &self.table
    }

    /// Recorded state of `index` during `tick`
    pub fn history_state(&self, index: usize, tick: Tick) -> StateCode {
        self.history.get(index, tick)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns the current scheduler tick count
    pub fn current_time(&self) -> Tick {
        self.current_time
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    /// Returns the process holding the CPU, if any
    pub fn current_running(&self) -> Option<usize> {
        self.current_running
    }

    /// Returns the round-robin cursor
    pub fn last_scheduled(&self) -> Option<usize> {
        self.last_scheduled
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns a reference to the audit log
    pub fn audit_log(&self) -> &[ScheduleEvent] {
        &self.audit_log
    }

    /// Clears the audit log
    pub fn clear_audit_log(&mut self) {
        self.audit_log.clear();
    }

    fn account_wait_time(&mut self) {
        for record in self.table.iter_mut() {
            if record.state == ProcessState::Ready {
                record.wait_time += 1;
            }
        }
    }

    fn advance_sleepers(&mut self) {
        let tick = self.current_time;
        for (index, record) in self.table.iter_mut().enumerate() {
            if record.state != ProcessState::Sleeping {
                continue;
            }
            record.io_wait_remaining = record.io_wait_remaining.saturating_sub(1);
            if record.io_wait_remaining > 0 {
                continue;
            }

            record.state = ProcessState::Ready;
            record.remaining_quantum = self.config.time_quantum;
            record.priority = self.aging.on_io_completed(record.priority);
            record.aging_counter = 0;
            record.ready_since = tick;
            debug!("tick {}: P{} I/O complete, priority {}", tick, index, record.priority);
            self.audit_log.push(ScheduleEvent::IoCompleted {
                index,
                timestamp_ticks: tick,
            });
        }
    }

    /// Executes one unit of the running process and applies the burst and
    /// quantum rules. Returns the index that ran.
    fn run_current(&mut self, workers: &mut dyn WorkerPort) -> Option<usize> {
        let index = self.current_running?;
        let tick = self.current_time;
        let record = self.table.get_mut(index)?;
        if record.state != ProcessState::Running {
            return None;
        }

        workers.signal_run_unit(record.worker);
        record.cpu_burst_remaining = record.cpu_burst_remaining.saturating_sub(1);
        record.remaining_quantum = record.remaining_quantum.saturating_sub(1);

        if record.cpu_burst_remaining == 0 {
            match self.burst_policy.on_burst_exhausted(index) {
                BurstOutcome::Terminate => {
                    record.state = ProcessState::Exiting;
                    workers.signal_terminate(record.worker);
                    debug!("tick {}: P{} burst done, terminating", tick, index);
                    self.audit_log.push(ScheduleEvent::TerminationRequested {
                        index,
                        timestamp_ticks: tick,
                    });
                }
                BurstOutcome::Io {
                    io_wait,
                    next_burst,
                } => {
                    record.state = ProcessState::Sleeping;
                    record.io_wait_remaining = io_wait.max(1);
                    record.cpu_burst_remaining = next_burst.max(1);
                    debug!("tick {}: P{} requests I/O for {}", tick, index, io_wait);
                    self.audit_log.push(ScheduleEvent::ProcessPreempted {
                        index,
                        reason: PreemptionReason::IoRequested,
                        timestamp_ticks: tick,
                    });
                }
            }
            self.current_running = None;
        } else if self.config.policy.is_preemptive() && record.remaining_quantum == 0 {
            record.priority = self.aging.on_quantum_expired(record.priority);
            record.state = ProcessState::Ready;
            record.remaining_quantum = self.config.time_quantum;
            record.ready_since = tick;
            debug!(
                "tick {}: P{} quantum expired, priority {}",
                tick, index, record.priority
            );
            self.audit_log.push(ScheduleEvent::ProcessPreempted {
                index,
                reason: PreemptionReason::QuantumExpired,
                timestamp_ticks: tick,
            });
            self.current_running = None;
        }

        Some(index)
    }

    /// Gives an idle CPU to the selector's choice
    fn dispatch(&mut self) -> Option<usize> {
        let next = select_next(&self.table, self.last_scheduled, self.config.policy)?;
        let record = self.table.get_mut(next)?;
        record.state = ProcessState::Running;
        record.aging_counter = 0;
        self.current_running = Some(next);
        self.last_scheduled = Some(next);

        debug!(
            "tick {}: dispatch P{} (priority {})",
            self.current_time, next, record.priority
        );
        self.audit_log.push(ScheduleEvent::ProcessSelected {
            index: next,
            timestamp_ticks: self.current_time,
        });
        Some(next)
    }
}
