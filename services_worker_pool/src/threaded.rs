//! Thread-backed workers
//!
//! One OS thread per process. The scheduler's signals become
//! `WorkerCommand`s on a per-worker channel; a worker that receives
//! `Terminate` reports `WorkerExited` on the event queue and returns the
//! number of units it executed.

use crate::error::WorkerPoolError;
use crate::lifecycle::WorkerState;
use core_types::WorkerHandle;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};
use sim_kernel::{SchedulerEvent, WorkerPort};
use std::collections::HashMap;
use std::thread::{self, JoinHandle};

/// Command delivered to a worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Execute one logical CPU unit
    RunUnit,
    /// Exit
    Terminate,
}

struct WorkerThread {
    state: WorkerState,
    commands: Option<Sender<WorkerCommand>>,
    join: Option<JoinHandle<u64>>,
}

/// Pool of worker threads
pub struct ThreadWorkers {
    handles: Vec<WorkerHandle>,
    workers: HashMap<WorkerHandle, WorkerThread>,
    units: HashMap<WorkerHandle, u64>,
}

impl ThreadWorkers {
    /// Spawns `count` worker threads that report exits on `events`
    pub fn spawn(count: usize, events: Sender<SchedulerEvent>) -> Result<Self, WorkerPoolError> {
        let mut handles = Vec::with_capacity(count);
        let mut workers = HashMap::with_capacity(count);

        for index in 0..count {
            let handle = WorkerHandle::new();
            let (tx, rx) = unbounded();
            let events = events.clone();
            let join = thread::Builder::new()
                .name(format!("worker-{}", index))
                .spawn(move || worker_loop(handle, rx, events))
                .map_err(|err| WorkerPoolError::SpawnFailed {
                    index,
                    reason: err.to_string(),
                })?;

            handles.push(handle);
            workers.insert(
                handle,
                WorkerThread {
                    state: WorkerState::Alive,
                    commands: Some(tx),
                    join: Some(join),
                },
            );
        }

        Ok(Self {
            handles,
            workers,
            units: HashMap::new(),
        })
    }

    /// Worker handles in spawn order
    pub fn handles(&self) -> &[WorkerHandle] {
        &self.handles
    }

    pub fn state(&self, worker: WorkerHandle) -> Option<WorkerState> {
        self.workers.get(&worker).map(|w| w.state)
    }

    /// Units executed by `worker`, known once its thread has been joined
    pub fn units_run(&self, worker: WorkerHandle) -> Option<u64> {
        self.units.get(&worker).copied()
    }

    /// Closes every command channel and joins all threads.
    ///
    /// Threads that were never asked to terminate exit when their channel
    /// closes, without reporting an exit.
    pub fn shutdown(&mut self) -> Result<(), WorkerPoolError> {
        let mut panicked = None;
        for (&handle, worker) in self.workers.iter_mut() {
            worker.commands = None;
            if let Some(join) = worker.join.take() {
                match join.join() {
                    Ok(units) => {
                        self.units.insert(handle, units);
                    }
                    Err(_) => panicked = Some(handle),
                }
            }
            worker.state = WorkerState::Exited;
        }

        match panicked {
            Some(handle) => Err(WorkerPoolError::WorkerPanicked(handle.to_string())),
            None => Ok(()),
        }
    }

    fn send(&mut self, worker: WorkerHandle, command: WorkerCommand) -> bool {
        let Some(w) = self.workers.get_mut(&worker) else {
            debug!("worker pool: {:?} for unknown {}", command, worker);
            return false;
        };
        let Some(commands) = w.commands.as_ref() else {
            debug!("worker pool: {} already shut down", worker);
            return false;
        };
        if commands.send(command).is_err() {
            w.state = WorkerState::Exited;
            debug!("worker pool: {} has exited, {:?} dropped", worker, command);
            return false;
        }
        true
    }
}

impl WorkerPort for ThreadWorkers {
    fn signal_run_unit(&mut self, worker: WorkerHandle) {
        self.send(worker, WorkerCommand::RunUnit);
    }

    fn signal_terminate(&mut self, worker: WorkerHandle) {
        if self.send(worker, WorkerCommand::Terminate) {
            if let Some(w) = self.workers.get_mut(&worker) {
                w.state = WorkerState::Terminating;
            }
        }
    }
}

impl Drop for ThreadWorkers {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("worker pool: {}", err);
        }
    }
}

fn worker_loop(
    handle: WorkerHandle,
    commands: Receiver<WorkerCommand>,
    events: Sender<SchedulerEvent>,
) -> u64 {
    let mut units = 0;
    for command in commands.iter() {
        match command {
            WorkerCommand::RunUnit => units += 1,
            WorkerCommand::Terminate => {
                if events.send(SchedulerEvent::WorkerExited(handle)).is_err() {
                    debug!("worker pool: event queue closed before {} exited", handle);
                }
                break;
            }
        }
    }
    units
}
