//! Aging and priority adjustment
//!
//! Three rules move a process's priority:
//! - **Aging**: every READY tick bumps `aging_counter`; once it reaches the
//!   interval the process is promoted by the aging amount and the counter
//!   restarts. A process left waiting long enough reaches the best priority
//!   whatever class it started in.
//! - **Quantum expiry**: demoted by one step.
//! - **I/O completion**: promoted by one step.
//!
//! Every adjustment is clamped to `[min_priority, max_priority]`.

use crate::config::SchedulerConfig;
use crate::process::{ProcessState, ProcessTable};
use log::{debug, info};

/// Initial priorities at or beyond this are announced when aging lifts them
/// to the top
const LOW_CLASS_PRIORITY: u32 = 3;

/// A promotion applied by the per-tick aging pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    pub index: usize,
    pub from: u32,
    pub to: u32,
}

/// Priority engine
#[derive(Debug, Clone)]
pub struct AgingEngine {
    enabled: bool,
    interval: Option<u32>,
    amount: u32,
    min_priority: u32,
    max_priority: u32,
}

impl AgingEngine {
    /// Builds the engine from a validated configuration.
    ///
    /// Policies that ignore priority get an engine whose rules are all no-ops.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            enabled: config.policy.uses_priority(),
            interval: config.aging.interval,
            amount: config.aging.amount,
            min_priority: config.min_priority,
            max_priority: config.max_priority,
        }
    }

    /// Runs one aging pass over every READY process
    pub fn age_ready(&self, table: &mut ProcessTable) -> Vec<Promotion> {
        let mut promotions = Vec::new();
        if !self.enabled {
            return promotions;
        }

        for (index, record) in table.iter_mut().enumerate() {
            if record.state != ProcessState::Ready {
                continue;
            }
            record.aging_counter += 1;

            let Some(interval) = self.interval else {
                continue;
            };
            if record.aging_counter < interval {
                continue;
            }

            record.aging_counter = 0;
            if record.priority > self.min_priority {
                let from = record.priority;
                record.priority = self.promote(from, self.amount);
                debug!("aging: P{} priority {} -> {}", index, from, record.priority);
                promotions.push(Promotion {
                    index,
                    from,
                    to: record.priority,
                });

                if record.priority == self.min_priority
                    && record.initial_priority >= LOW_CLASS_PRIORITY
                    && !record.reached_top
                {
                    record.reached_top = true;
                    info!(
                        "aging: P{} reached top priority (initial {})",
                        index, record.initial_priority
                    );
                }
            }
        }

        promotions
    }

    /// Priority after a quantum expiry
    pub fn on_quantum_expired(&self, priority: u32) -> u32 {
        if !self.enabled {
            return priority;
        }
        priority.saturating_add(1).min(self.max_priority)
    }

    /// Priority after an I/O completion
    pub fn on_io_completed(&self, priority: u32) -> u32 {
        if !self.enabled {
            return priority;
        }
        self.promote(priority, 1)
    }

    /// Upper bound on continuous READY ticks before `initial_priority`
    /// reaches the best priority, absent any demotion. `None` when aging is
    /// disabled.
    pub fn promotion_bound(&self, initial_priority: u32) -> Option<u64> {
        let interval = u64::from(self.interval?);
        let distance = u64::from(initial_priority.saturating_sub(self.min_priority));
        let steps = distance.div_ceil(u64::from(self.amount));
        Some(steps * interval)
    }

    fn promote(&self, priority: u32, amount: u32) -> u32 {
        priority.saturating_sub(amount).max(self.min_priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgingConfig, SchedulingPolicy};
    use crate::process::ProcessSpec;
    use core_types::WorkerHandle;

    fn single(priority: u32) -> ProcessTable {
        let spec = ProcessSpec::new(WorkerHandle::new(), 5);
        ProcessTable::new(&[spec], &[priority], 3, 0)
    }

    fn engine(interval: Option<u32>, amount: u32) -> AgingEngine {
        AgingEngine::from_config(&SchedulerConfig {
            aging: AgingConfig { interval, amount },
            ..SchedulerConfig::default()
        })
    }

    #[test]
    fn test_aging_fires_at_interval() {
        let engine = engine(Some(3), 1);
        let mut table = single(4);

        assert!(engine.age_ready(&mut table).is_empty());
        assert!(engine.age_ready(&mut table).is_empty());
        assert_eq!(table.get(0).unwrap().aging_counter, 2);

        let promotions = engine.age_ready(&mut table);
        assert_eq!(
            promotions,
            vec![Promotion {
                index: 0,
                from: 4,
                to: 3
            }]
        );
        assert_eq!(table.get(0).unwrap().aging_counter, 0);
    }

    #[test]
    fn test_aging_clamps_at_min_priority() {
        let engine = engine(Some(1), 5);
        let mut table = single(3);

        engine.age_ready(&mut table);
        let record = table.get(0).unwrap();
        assert_eq!(record.priority, 0);
        assert!(record.reached_top);

        // Already at the top: counter still resets but nothing is promoted.
        assert!(engine.age_ready(&mut table).is_empty());
        assert_eq!(table.get(0).unwrap().aging_counter, 0);
    }

    #[test]
    fn test_aging_skips_non_ready() {
        let engine = engine(Some(1), 1);
        let mut table = single(4);
        table.get_mut(0).unwrap().state = ProcessState::Sleeping;

        assert!(engine.age_ready(&mut table).is_empty());
        assert_eq!(table.get(0).unwrap().aging_counter, 0);
        assert_eq!(table.get(0).unwrap().priority, 4);
    }

    #[test]
    fn test_disabled_aging_never_promotes() {
        let engine = engine(None, 1);
        let mut table = single(4);
        for _ in 0..1000 {
            assert!(engine.age_ready(&mut table).is_empty());
        }
        assert_eq!(table.get(0).unwrap().priority, 4);
        assert_eq!(engine.promotion_bound(4), None);
    }

    #[test]
    fn test_reaches_top_within_bound() {
        for (initial, interval, amount) in [(4, 10, 1), (7, 3, 2), (10, 5, 3), (1, 4, 1)] {
            let engine = engine(Some(interval), amount);
            let mut table = single(initial);
            let bound = engine.promotion_bound(initial).unwrap();

            let mut ticks = 0u64;
            while table.get(0).unwrap().priority > 0 {
                engine.age_ready(&mut table);
                ticks += 1;
                assert!(ticks <= bound, "P{} exceeded bound {}", initial, bound);
            }
            assert_eq!(ticks, bound);
        }
    }

    #[test]
    fn test_quantum_expiry_demotes_and_clamps() {
        let engine = engine(Some(10), 1);
        assert_eq!(engine.on_quantum_expired(3), 4);
        assert_eq!(engine.on_quantum_expired(10), 10);
    }

    #[test]
    fn test_io_completion_promotes_and_clamps() {
        let engine = engine(Some(10), 1);
        assert_eq!(engine.on_io_completed(3), 2);
        assert_eq!(engine.on_io_completed(0), 0);
    }

    #[test]
    fn test_round_robin_policy_ignores_priority() {
        let engine = AgingEngine::from_config(&SchedulerConfig {
            policy: SchedulingPolicy::RoundRobin,
            ..SchedulerConfig::default()
        });
        let mut table = single(4);
        for _ in 0..50 {
            assert!(engine.age_ready(&mut table).is_empty());
        }
        assert_eq!(table.get(0).unwrap().priority, 4);
        assert_eq!(engine.on_quantum_expired(4), 4);
        assert_eq!(engine.on_io_completed(4), 4);
    }
}
