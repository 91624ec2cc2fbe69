//! # Simulated Kernel Scheduler
//!
//! This crate provides the scheduling core of a discrete-time, single-CPU
//! process scheduler simulator.
//!
//! ## Purpose
//!
//! A fixed population of simulated processes competes for one CPU under a
//! tick-driven clock:
//! - Static priorities with round-robin tie-breaking
//! - Time-quantum preemption
//! - I/O sleep/wake cycles
//! - Anti-starvation aging
//!
//! ## Philosophy
//!
//! **Determinism first**: same configuration, same burst decisions and same
//! notification order produce the same schedule.
//!
//! The core never spawns anything. Workers are reached through the
//! [`WorkerPort`] seam and report their exits back through
//! [`Scheduler::reconcile_exit`]; whoever owns the [`Scheduler`] serializes
//! ticks and exit notifications.

pub mod aging;
pub mod burst;
pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod process;
pub mod scheduler;
pub mod selector;
pub mod summary;
pub mod worker;

pub use aging::{AgingEngine, Promotion};
pub use burst::{BurstOutcome, BurstPolicy, RandomBurstPolicy, ScriptedBurstPolicy};
pub use config::{
    AgingConfig, SchedulerConfig, SchedulingPolicy, MAX_PROCESSES, MAX_TIME_QUANTUM,
    MIN_TIME_QUANTUM,
};
pub use error::{ConfigError, InvariantViolation};
pub use event::SchedulerEvent;
pub use history::{History, StateCode};
pub use process::{ProcessRecord, ProcessSpec, ProcessState, ProcessTable};
pub use scheduler::{
    PreemptionReason, ReconcileOutcome, ScheduleEvent, Scheduler, TickReport,
};
pub use selector::select_next;
pub use summary::{ProcessSummary, SimulationSummary};
pub use worker::{SignalLog, WorkerPort, WorkerSignal};
