//! Per-tick state history
//!
//! Append-only record of how each process spent each tick, consumed by
//! reporting. Only the tick driver writes it, once per `(process, tick)`.
//! Ticks past the horizon are dropped: recording is best-effort and never
//! stops scheduling.

use crate::process::ProcessState;
use core_types::Tick;
use log::warn;
use serde::{Deserialize, Serialize};

/// Observed state of a process during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StateCode {
    /// Not started, exiting, finished or never recorded
    #[default]
    None,
    Ready,
    Running,
    Sleeping,
}

impl From<ProcessState> for StateCode {
    fn from(state: ProcessState) -> Self {
        match state {
            ProcessState::Ready => StateCode::Ready,
            ProcessState::Running => StateCode::Running,
            ProcessState::Sleeping => StateCode::Sleeping,
            ProcessState::Exiting | ProcessState::Done => StateCode::None,
        }
    }
}

/// History log indexed by `[process][tick]`
#[derive(Debug, Clone)]
pub struct History {
    horizon: Tick,
    rows: Vec<Vec<StateCode>>,
    last_recorded: Option<Tick>,
    truncated: bool,
}

impl History {
    /// Creates an empty history for `processes` processes, recording ticks
    /// `1..horizon`
    pub fn new(processes: usize, horizon: Tick) -> Self {
        Self {
            horizon,
            rows: vec![Vec::new(); processes],
            last_recorded: None,
            truncated: false,
        }
    }

    /// Records one tick for every process.
    ///
    /// Returns false if the tick lies beyond the horizon and was dropped.
    pub fn record(&mut self, tick: Tick, codes: &[StateCode]) -> bool {
        debug_assert_eq!(codes.len(), self.rows.len());
        debug_assert!(
            self.last_recorded.map_or(true, |last| tick > last),
            "tick {} recorded twice",
            tick
        );

        if tick >= self.horizon {
            if !self.truncated {
                warn!(
                    "history: horizon of {} ticks reached, no longer recording",
                    self.horizon
                );
                self.truncated = true;
            }
            return false;
        }

        let slot = tick as usize;
        for (row, &code) in self.rows.iter_mut().zip(codes) {
            if row.len() <= slot {
                row.resize(slot + 1, StateCode::None);
            }
            row[slot] = code;
        }
        self.last_recorded = Some(tick);
        true
    }

    /// State of `process` during `tick`; `None` if unrecorded
    pub fn get(&self, process: usize, tick: Tick) -> StateCode {
        self.rows
            .get(process)
            .and_then(|row| row.get(tick as usize))
            .copied()
            .unwrap_or_default()
    }

    /// Recorded row for one process, indexed by tick (slot 0 is unused)
    pub fn row(&self, process: usize) -> &[StateCode] {
        self.rows.get(process).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of recorded ticks in which `process` had state `code`
    pub fn count(&self, process: usize, code: StateCode) -> usize {
        self.row(process).iter().filter(|&&c| c == code).count()
    }

    /// Last tick that was recorded
    pub fn last_recorded(&self) -> Option<Tick> {
        self.last_recorded
    }

    /// Whether ticks have been dropped past the horizon
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn horizon(&self) -> Tick {
        self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_get() {
        let mut history = History::new(2, 100);
        assert!(history.record(1, &[StateCode::Running, StateCode::Ready]));
        assert!(history.record(2, &[StateCode::Sleeping, StateCode::Running]));

        assert_eq!(history.get(0, 1), StateCode::Running);
        assert_eq!(history.get(1, 1), StateCode::Ready);
        assert_eq!(history.get(0, 2), StateCode::Sleeping);
        assert_eq!(history.last_recorded(), Some(2));
    }

    #[test]
    fn test_unrecorded_is_none() {
        let history = History::new(2, 100);
        assert_eq!(history.get(0, 5), StateCode::None);
        assert_eq!(history.get(7, 1), StateCode::None);
    }

    #[test]
    fn test_horizon_drops_ticks() {
        let mut history = History::new(1, 3);
        assert!(history.record(1, &[StateCode::Ready]));
        assert!(history.record(2, &[StateCode::Ready]));
        assert!(!history.record(3, &[StateCode::Running]));
        assert!(!history.record(4, &[StateCode::Running]));

        assert!(history.is_truncated());
        assert_eq!(history.get(0, 3), StateCode::None);
        assert_eq!(history.count(0, StateCode::Ready), 2);
        assert_eq!(history.last_recorded(), Some(2));
    }

    #[test]
    fn test_state_code_from_process_state() {
        assert_eq!(StateCode::from(ProcessState::Ready), StateCode::Ready);
        assert_eq!(StateCode::from(ProcessState::Running), StateCode::Running);
        assert_eq!(StateCode::from(ProcessState::Sleeping), StateCode::Sleeping);
        assert_eq!(StateCode::from(ProcessState::Exiting), StateCode::None);
        assert_eq!(StateCode::from(ProcessState::Done), StateCode::None);
    }
}
