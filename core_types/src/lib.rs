//! # Core Types
//!
//! This crate defines the identifiers shared by the scheduler core, the
//! worker pool and the runtime.
//!
//! ## Key Types
//!
//! - [`WorkerHandle`]: Opaque identity of a simulated process's execution unit
//! - [`Tick`]: One discrete unit of simulated time

pub mod ids;

pub use ids::WorkerHandle;

/// Logical timestamp, counted in scheduler ticks
pub type Tick = u64;
