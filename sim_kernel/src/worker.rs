//! Worker seam
//!
//! The scheduler addresses execution units only through this trait. Both
//! signals are fire-and-forget: the scheduler advances its bookkeeping
//! without waiting for acknowledgment and learns about actual exits through
//! `Scheduler::reconcile_exit`.

use core_types::WorkerHandle;

/// Signaling capability towards external workers
pub trait WorkerPort {
    /// Requests execution of one logical CPU unit
    fn signal_run_unit(&mut self, worker: WorkerHandle);

    /// Requests that the worker exit
    fn signal_terminate(&mut self, worker: WorkerHandle);
}

/// Signal sent to a worker, as recorded by [`SignalLog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSignal {
    RunUnit(WorkerHandle),
    Terminate(WorkerHandle),
}

/// Worker port that only records what it was asked to do
#[derive(Debug, Default, Clone)]
pub struct SignalLog {
    signals: Vec<WorkerSignal>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals received, in order
    pub fn signals(&self) -> &[WorkerSignal] {
        &self.signals
    }

    /// Handles asked to terminate, in order
    pub fn terminations(&self) -> Vec<WorkerHandle> {
        self.signals
            .iter()
            .filter_map(|signal| match signal {
                WorkerSignal::Terminate(worker) => Some(*worker),
                WorkerSignal::RunUnit(_) => None,
            })
            .collect()
    }

    /// Removes and returns the pending terminations
    pub fn drain_terminations(&mut self) -> Vec<WorkerHandle> {
        let terminations = self.terminations();
        self.signals
            .retain(|signal| matches!(signal, WorkerSignal::RunUnit(_)));
        terminations
    }

    /// Number of run-unit signals sent to `worker`
    pub fn units_run(&self, worker: WorkerHandle) -> usize {
        self.signals
            .iter()
            .filter(|&&signal| signal == WorkerSignal::RunUnit(worker))
            .count()
    }
}

impl WorkerPort for SignalLog {
    fn signal_run_unit(&mut self, worker: WorkerHandle) {
        self.signals.push(WorkerSignal::RunUnit(worker));
    }

    fn signal_terminate(&mut self, worker: WorkerHandle) {
        self.signals.push(WorkerSignal::Terminate(worker));
    }
}
