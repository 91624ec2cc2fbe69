//! # Worker Pool Service
//!
//! This crate provides the execution units the scheduler drives.
//!
//! ## Philosophy
//!
//! Workers are managed explicitly through the `WorkerPort` seam:
//! - The scheduler signals, workers never call back into it
//! - Exits are reported as events on the scheduler's queue, not by mutation
//! - The same scheduler runs against in-process or thread-backed workers

pub mod error;
pub mod lifecycle;
pub mod simulated;
pub mod threaded;

pub use error::WorkerPoolError;
pub use lifecycle::WorkerState;
pub use simulated::SimulatedWorkers;
pub use threaded::{ThreadWorkers, WorkerCommand};
