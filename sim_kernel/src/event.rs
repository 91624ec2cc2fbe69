//! Scheduler events
//!
//! The periodic timer and worker exits are the only two things that mutate
//! scheduling state. Both are delivered as events on one queue and consumed
//! by a single dispatch loop, so a tick and a reconciliation never overlap.

use core_types::WorkerHandle;
use serde::{Deserialize, Serialize};

/// Event consumed by the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerEvent {
    /// The periodic timer fired
    Tick,
    /// A worker unit exited
    WorkerExited(WorkerHandle),
}
