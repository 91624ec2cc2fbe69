//! In-process workers
//!
//! Deterministic stand-in for real execution units. Each worker is a counter
//! of executed units; a termination request produces a `WorkerExited` event
//! on the scheduler's queue, to be reconciled on a later dispatch.

use crate::lifecycle::WorkerState;
use core_types::WorkerHandle;
use crossbeam_channel::Sender;
use log::{debug, warn};
use sim_kernel::{SchedulerEvent, WorkerPort};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct SimulatedWorker {
    state: WorkerState,
    units_run: u64,
}

/// Pool of in-process workers reporting exits on an event queue
#[derive(Debug)]
pub struct SimulatedWorkers {
    handles: Vec<WorkerHandle>,
    workers: HashMap<WorkerHandle, SimulatedWorker>,
    events: Sender<SchedulerEvent>,
    stuck: HashSet<WorkerHandle>,
    duplicate_exits: bool,
}

impl SimulatedWorkers {
    /// Creates `count` live workers that report exits on `events`
    pub fn spawn(count: usize, events: Sender<SchedulerEvent>) -> Self {
        let handles: Vec<WorkerHandle> = (0..count).map(|_| WorkerHandle::new()).collect();
        let workers = handles
            .iter()
            .map(|&handle| {
                (
                    handle,
                    SimulatedWorker {
                        state: WorkerState::Alive,
                        units_run: 0,
                    },
                )
            })
            .collect();

        Self {
            handles,
            workers,
            events,
            stuck: HashSet::new(),
            duplicate_exits: false,
        }
    }

    /// Worker handles in spawn order
    pub fn handles(&self) -> &[WorkerHandle] {
        &self.handles
    }

    /// Makes `worker` ignore termination requests
    pub fn ignore_terminate(&mut self, worker: WorkerHandle) {
        self.stuck.insert(worker);
    }

    /// Reports every exit twice
    pub fn with_duplicate_exits(mut self) -> Self {
        self.duplicate_exits = true;
        self
    }

    pub fn state(&self, worker: WorkerHandle) -> Option<WorkerState> {
        self.workers.get(&worker).map(|w| w.state)
    }

    /// Units executed by `worker`
    pub fn units_run(&self, worker: WorkerHandle) -> u64 {
        self.workers.get(&worker).map_or(0, |w| w.units_run)
    }

    /// Units executed across the pool
    pub fn total_units(&self) -> u64 {
        self.workers.values().map(|w| w.units_run).sum()
    }

    fn report_exit(&self, worker: WorkerHandle) {
        let copies = if self.duplicate_exits { 2 } else { 1 };
        for _ in 0..copies {
            if self
                .events
                .send(SchedulerEvent::WorkerExited(worker))
                .is_err()
            {
                warn!("worker pool: event queue closed, exit of {} lost", worker);
                return;
            }
        }
    }
}

impl WorkerPort for SimulatedWorkers {
    fn signal_run_unit(&mut self, worker: WorkerHandle) {
        match self.workers.get_mut(&worker) {
            Some(w) if w.state.is_active() => w.units_run += 1,
            Some(w) => debug!("worker pool: {} is {:?}, run unit dropped", worker, w.state),
            None => debug!("worker pool: run unit for unknown {}", worker),
        }
    }

    fn signal_terminate(&mut self, worker: WorkerHandle) {
        let Some(w) = self.workers.get_mut(&worker) else {
            debug!("worker pool: terminate for unknown {}", worker);
            return;
        };
        if w.state.is_terminal() {
            return;
        }
        if self.stuck.contains(&worker) {
            w.state = WorkerState::Terminating;
            debug!("worker pool: {} ignores termination", worker);
            return;
        }

        w.state = WorkerState::Exited;
        self.report_exit(worker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_units_are_counted_per_worker() {
        let (tx, _rx) = unbounded();
        let mut pool = SimulatedWorkers::spawn(2, tx);
        let a = pool.handles()[0];
        let b = pool.handles()[1];

        pool.signal_run_unit(a);
        pool.signal_run_unit(a);
        pool.signal_run_unit(b);

        assert_eq!(pool.units_run(a), 2);
        assert_eq!(pool.units_run(b), 1);
        assert_eq!(pool.total_units(), 3);
    }

    #[test]
    fn test_terminate_reports_exit() {
        let (tx, rx) = unbounded();
        let mut pool = SimulatedWorkers::spawn(1, tx);
        let a = pool.handles()[0];

        pool.signal_terminate(a);
        assert_eq!(pool.state(a), Some(WorkerState::Exited));
        assert_eq!(rx.try_recv().unwrap(), SchedulerEvent::WorkerExited(a));

        // A second request for an exited worker reports nothing.
        pool.signal_terminate(a);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_exited_worker_drops_run_units() {
        let (tx, _rx) = unbounded();
        let mut pool = SimulatedWorkers::spawn(1, tx);
        let a = pool.handles()[0];

        pool.signal_terminate(a);
        pool.signal_run_unit(a);
        assert_eq!(pool.units_run(a), 0);
    }

    #[test]
    fn test_stuck_worker_never_exits() {
        let (tx, rx) = unbounded();
        let mut pool = SimulatedWorkers::spawn(1, tx);
        let a = pool.handles()[0];
        pool.ignore_terminate(a);

        pool.signal_terminate(a);
        assert_eq!(pool.state(a), Some(WorkerState::Terminating));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_duplicate_exits() {
        let (tx, rx) = unbounded();
        let mut pool = SimulatedWorkers::spawn(1, tx).with_duplicate_exits();
        let a = pool.handles()[0];

        pool.signal_terminate(a);
        let events: Vec<SchedulerEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![SchedulerEvent::WorkerExited(a), SchedulerEvent::WorkerExited(a)]
        );
    }

    #[test]
    fn test_closed_queue_does_not_panic() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut pool = SimulatedWorkers::spawn(1, tx);
        let a = pool.handles()[0];
        pool.signal_terminate(a);
        assert_eq!(pool.state(a), Some(WorkerState::Exited));
    }

    #[test]
    fn test_unknown_worker_is_ignored() {
        let (tx, rx) = unbounded();
        let mut pool = SimulatedWorkers::spawn(1, tx);
        let stranger = WorkerHandle::new();

        pool.signal_run_unit(stranger);
        pool.signal_terminate(stranger);
        assert_eq!(pool.units_run(stranger), 0);
        assert!(rx.try_recv().is_err());
    }
}
