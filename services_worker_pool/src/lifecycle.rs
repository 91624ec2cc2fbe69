//! Worker lifecycle

/// Lifecycle states for a worker unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Worker accepts run-unit signals
    Alive,
    /// Worker was asked to exit but has not done so
    Terminating,
    /// Worker has exited and its exit was reported
    Exited,
}

impl WorkerState {
    /// Checks if the worker has exited
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Exited)
    }

    /// Checks if the worker still executes units
    pub fn is_active(&self) -> bool {
        matches!(self, WorkerState::Alive)
    }
}
