//! Ready-set selection
//!
//! The priority selector scans all processes once, starting just after the
//! round-robin cursor and wrapping around. The best (numerically lowest)
//! priority wins; among equals, the first one met in scan order wins. Ties
//! therefore rotate through a priority class instead of always favoring the
//! lowest index.

use crate::config::SchedulingPolicy;
use crate::process::{ProcessState, ProcessTable};

/// Chooses the next process to run, or `None` if nothing is READY.
///
/// `last_scheduled` is the round-robin cursor: the index most recently
/// dispatched, or `None` before the first dispatch.
pub fn select_next(
    table: &ProcessTable,
    last_scheduled: Option<usize>,
    policy: SchedulingPolicy,
) -> Option<usize> {
    match policy {
        SchedulingPolicy::PriorityAging => select_by_priority(table, last_scheduled),
        SchedulingPolicy::RoundRobin => select_round_robin(table, last_scheduled),
        SchedulingPolicy::Fifo => select_earliest_arrival(table),
    }
}

/// Indices of the table in scan order, starting after the cursor
fn scan_order(len: usize, last_scheduled: Option<usize>) -> impl Iterator<Item = usize> {
    let start = last_scheduled.map_or(0, |last| (last + 1) % len.max(1));
    (0..len).map(move |offset| (start + offset) % len)
}

fn select_by_priority(table: &ProcessTable, last_scheduled: Option<usize>) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;

    for index in scan_order(table.len(), last_scheduled) {
        let Some(record) = table.get(index) else {
            continue;
        };
        if record.state != ProcessState::Ready {
            continue;
        }
        match best {
            Some((_, priority)) if record.priority >= priority => {}
            _ => best = Some((index, record.priority)),
        }
    }

    best.map(|(index, _)| index)
}

fn select_round_robin(table: &ProcessTable, last_scheduled: Option<usize>) -> Option<usize> {
    scan_order(table.len(), last_scheduled).find(|&index| {
        table
            .get(index)
            .is_some_and(|record| record.state == ProcessState::Ready)
    })
}

fn select_earliest_arrival(table: &ProcessTable) -> Option<usize> {
    table
        .iter()
        .enumerate()
        .filter(|(_, record)| record.state == ProcessState::Ready)
        .min_by_key(|(index, record)| (record.ready_since, *index))
        .map(|(index, _)| index)
}
