//! Process record store
//!
//! One control record per simulated process, addressed by index `0..N`.
//! Records are created once, before the first tick, and are never removed:
//! a finished process is only marked `Done`, so every record stays readable
//! through final reporting.

use core_types::{Tick, WorkerHandle};
use serde::{Deserialize, Serialize};

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    /// Waiting for the CPU
    Ready,
    /// Holding the CPU
    Running,
    /// Blocked on simulated I/O
    Sleeping,
    /// Termination requested; waiting for the worker's exit notification
    Exiting,
    /// Finished (terminal)
    Done,
}

/// Creation parameters for one process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Execution unit backing this process
    pub worker: WorkerHandle,
    /// Length of the first CPU burst
    pub cpu_burst: u32,
    /// Initial priority; defaults to the process index when unset
    pub priority: Option<u32>,
}

impl ProcessSpec {
    /// Creates a spec with the default (index-derived) priority
    pub fn new(worker: WorkerHandle, cpu_burst: u32) -> Self {
        Self {
            worker,
            cpu_burst,
            priority: None,
        }
    }

    /// Overrides the initial priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Process control record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Handle of the external execution unit
    pub worker: WorkerHandle,
    /// Ticks left in the current quantum
    pub remaining_quantum: u32,
    /// Ticks left in the current CPU burst
    pub cpu_burst_remaining: u32,
    /// Ticks left until the pending I/O completes
    pub io_wait_remaining: u32,
    pub state: ProcessState,
    /// Ticks spent READY over the whole lifetime; never reset
    pub wait_time: u64,
    /// Current priority (0 is best)
    pub priority: u32,
    pub initial_priority: u32,
    /// Consecutive READY ticks since the last dispatch or promotion
    pub aging_counter: u32,
    pub arrival_time: Tick,
    /// Set once, when the process becomes `Done`
    pub completion_time: Option<Tick>,
    /// Tick at which the process last entered the ready set
    pub ready_since: Tick,
    /// Whether the process has reached the best priority through aging
    pub reached_top: bool,
}

impl ProcessRecord {
    fn new(spec: &ProcessSpec, priority: u32, quantum: u32, arrival_time: Tick) -> Self {
        Self {
            worker: spec.worker,
            remaining_quantum: quantum,
            cpu_burst_remaining: spec.cpu_burst,
            io_wait_remaining: 0,
            state: ProcessState::Ready,
            wait_time: 0,
            priority,
            initial_priority: priority,
            aging_counter: 0,
            arrival_time,
            completion_time: None,
            ready_since: arrival_time,
            reached_top: false,
        }
    }

    /// Returns true once the process has finished
    pub fn is_done(&self) -> bool {
        self.state == ProcessState::Done
    }

    /// Turnaround time, if the process has finished
    pub fn turnaround(&self) -> Option<Tick> {
        self.completion_time
            .map(|done| done.saturating_sub(self.arrival_time))
    }
}

/// Fixed-size table of process records
#[derive(Debug, Clone)]
pub struct ProcessTable {
    records: Vec<ProcessRecord>,
}

impl ProcessTable {
    /// Builds the table from resolved `(spec, priority)` pairs
    pub(crate) fn new(
        specs: &[ProcessSpec],
        priorities: &[u32],
        quantum: u32,
        arrival_time: Tick,
    ) -> Self {
        let records = specs
            .iter()
            .zip(priorities)
            .map(|(spec, &priority)| ProcessRecord::new(spec, priority, quantum, arrival_time))
            .collect();
        Self { records }
    }

    /// Returns the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at `index`
    pub fn get(&self, index: usize) -> Option<&ProcessRecord> {
        self.records.get(index)
    }

    /// Mutable access to the record at `index`
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut ProcessRecord> {
        self.records.get_mut(index)
    }

    /// Iterates over all records in index order
    pub fn iter(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessRecord> {
        self.records.iter_mut()
    }

    /// Linear lookup of a record index by worker handle
    pub fn index_of(&self, worker: WorkerHandle) -> Option<usize> {
        self.records.iter().position(|record| record.worker == worker)
    }

    /// Indices of records currently in `state`
    pub fn indices_in(&self, state: ProcessState) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.state == state)
            .map(|(index, _)| index)
            .collect()
    }

    /// Number of records currently in `state`
    pub fn count_in(&self, state: ProcessState) -> usize {
        self.records.iter().filter(|r| r.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> (ProcessTable, Vec<WorkerHandle>) {
        let handles: Vec<WorkerHandle> = (0..n).map(|_| WorkerHandle::new()).collect();
        let specs: Vec<ProcessSpec> = handles.iter().map(|&h| ProcessSpec::new(h, 5)).collect();
        let priorities: Vec<u32> = (0..n as u32).collect();
        (ProcessTable::new(&specs, &priorities, 3, 0), handles)
    }

    #[test]
    fn test_records_start_ready() {
        let (table, _) = table(3);
        assert_eq!(table.len(), 3);
        for (index, record) in table.iter().enumerate() {
            assert_eq!(record.state, ProcessState::Ready);
            assert_eq!(record.remaining_quantum, 3);
            assert_eq!(record.cpu_burst_remaining, 5);
            assert_eq!(record.priority, index as u32);
            assert_eq!(record.initial_priority, index as u32);
            assert_eq!(record.completion_time, None);
            assert_eq!(record.wait_time, 0);
        }
    }

    #[test]
    fn test_index_of_handle() {
        let (table, handles) = table(4);
        assert_eq!(table.index_of(handles[2]), Some(2));
        assert_eq!(table.index_of(WorkerHandle::new()), None);
    }

    #[test]
    fn test_indices_in_state() {
        let (mut table, _) = table(4);
        table.get_mut(1).unwrap().state = ProcessState::Sleeping;
        table.get_mut(3).unwrap().state = ProcessState::Sleeping;

        assert_eq!(table.indices_in(ProcessState::Sleeping), vec![1, 3]);
        assert_eq!(table.count_in(ProcessState::Ready), 2);
    }

    #[test]
    fn test_turnaround() {
        let (mut table, _) = table(1);
        assert_eq!(table.get(0).unwrap().turnaround(), None);

        let record = table.get_mut(0).unwrap();
        record.state = ProcessState::Done;
        record.completion_time = Some(12);
        assert!(record.is_done());
        assert_eq!(record.turnaround(), Some(12));
    }
}
