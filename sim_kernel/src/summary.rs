//! Post-run statistics
//!
//! Plain data derived from the final process records, for reporting layers
//! to render however they like.

use crate::config::SchedulingPolicy;
use crate::process::ProcessRecord;
use crate::scheduler::Scheduler;
use core_types::Tick;
use serde::Serialize;

/// Per-process results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSummary {
    pub index: usize,
    pub initial_priority: u32,
    pub final_priority: u32,
    pub wait_time: u64,
    pub completion_time: Option<Tick>,
    pub turnaround: Option<Tick>,
    /// Aging lifted this process from a low class to the best priority
    pub reached_top: bool,
}

impl ProcessSummary {
    fn from_record(index: usize, record: &ProcessRecord) -> Self {
        Self {
            index,
            initial_priority: record.initial_priority,
            final_priority: record.priority,
            wait_time: record.wait_time,
            completion_time: record.completion_time,
            turnaround: record.turnaround(),
            reached_top: record.reached_top,
        }
    }
}

/// Whole-run results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub policy: SchedulingPolicy,
    pub time_quantum: u32,
    pub aging_interval: Option<u32>,
    pub total_ticks: Tick,
    pub completed: usize,
    pub processes: Vec<ProcessSummary>,
    /// Finished processes ordered by completion time, ties by index
    pub completion_order: Vec<usize>,
    /// Pairs where a worse initial priority finished before a better one
    pub priority_reversals: usize,
    pub average_wait_time: Option<f64>,
    pub average_turnaround: Option<f64>,
}

impl SimulationSummary {
    /// Summarizes the scheduler's current state
    pub fn from_scheduler(scheduler: &Scheduler) -> Self {
        let processes: Vec<ProcessSummary> = scheduler
            .processes()
            .iter()
            .enumerate()
            .map(|(index, record)| ProcessSummary::from_record(index, record))
            .collect();

        let mut finished: Vec<&ProcessSummary> = processes
            .iter()
            .filter(|p| p.completion_time.is_some())
            .collect();
        finished.sort_by_key(|p| (p.completion_time, p.index));
        let completion_order: Vec<usize> = finished.iter().map(|p| p.index).collect();

        let priority_reversals: usize = finished
            .iter()
            .enumerate()
            .map(|(position, early)| {
                finished[position + 1..]
                    .iter()
                    .filter(|late| early.initial_priority > late.initial_priority)
                    .count()
            })
            .sum();

        let average = |values: Vec<u64>| -> Option<f64> {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<u64>() as f64 / values.len() as f64)
            }
        };
        let average_wait_time = average(finished.iter().map(|p| p.wait_time).collect());
        let average_turnaround = average(finished.iter().filter_map(|p| p.turnaround).collect());

        let config = scheduler.config();
        Self {
            policy: config.policy,
            time_quantum: config.time_quantum,
            aging_interval: config.aging.interval,
            total_ticks: scheduler.current_time(),
            completed: scheduler.completed_count(),
            processes,
            completion_order,
            priority_reversals,
            average_wait_time,
            average_turnaround,
        }
    }
}
