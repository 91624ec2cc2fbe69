//! # Scheduler Simulation Host
//!
//! This crate provides the runtime that drives a scheduler simulation.
//!
//! ## Philosophy
//!
//! - **One dispatch loop**: Ticks and worker exits are events on a single
//!   queue, consumed by the only owner of scheduler state
//! - **Deterministic mode is first-class**: Immediate ticks with in-process
//!   workers reproduce a run exactly from its seed
//! - **Bounded**: A supervisor stops a run that exceeds its tick budget
//!
//! ## Responsibilities
//!
//! The host runtime:
//! - Wires a worker pool to the scheduler through the event queue
//! - Fires the periodic timer, immediately or on a wall-clock interval
//! - Reports the final summary and audit trail
//!
//! ## Non-Responsibilities
//!
//! The host does NOT:
//! - Render tables or Gantt charts
//! - Make scheduling decisions of its own

pub mod logging;
pub mod runtime;

pub use runtime::{
    event_queue, RuntimeError, Simulation, SimulationReport, TickSource, DEFAULT_EXIT_GRACE,
};
