//! Burst policies
//!
//! What a process does when its CPU burst runs out is a pluggable decision:
//! the random policy models the reference behavior, the scripted policy
//! gives tests exact, repeatable sequences.

use crate::config::SchedulerConfig;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};

/// Outcome of an exhausted CPU burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstOutcome {
    /// Ask the worker to exit
    Terminate,
    /// Block on I/O, then run another burst
    Io { io_wait: u32, next_burst: u32 },
}

/// Decides what happens when a process exhausts its CPU burst
pub trait BurstPolicy: Send {
    fn on_burst_exhausted(&mut self, index: usize) -> BurstOutcome;
}

/// Fair coin between terminating and issuing I/O, with uniformly sampled
/// I/O waits and follow-up bursts
#[derive(Debug, Clone)]
pub struct RandomBurstPolicy {
    rng: SmallRng,
    max_cpu_burst: u32,
    max_io_time: u32,
}

impl RandomBurstPolicy {
    /// Creates a policy seeded from `config.seed`, or from entropy if unset
    pub fn from_config(config: &SchedulerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            rng,
            max_cpu_burst: config.max_cpu_burst.max(1),
            max_io_time: config.max_io_time.max(1),
        }
    }

    /// Samples a CPU burst in `1..=max_cpu_burst`
    pub fn sample_burst(&mut self) -> u32 {
        self.rng.gen_range(1..=self.max_cpu_burst)
    }

    /// Samples an I/O wait in `1..=max_io_time`
    pub fn sample_io_wait(&mut self) -> u32 {
        self.rng.gen_range(1..=self.max_io_time)
    }
}

impl BurstPolicy for RandomBurstPolicy {
    fn on_burst_exhausted(&mut self, _index: usize) -> BurstOutcome {
        if self.rng.gen_bool(0.5) {
            BurstOutcome::Terminate
        } else {
            let io_wait = self.sample_io_wait();
            let next_burst = self.sample_burst();
            BurstOutcome::Io {
                io_wait,
                next_burst,
            }
        }
    }
}

/// Replays per-process outcome scripts; a process whose script has run out
/// terminates
#[derive(Debug, Clone, Default)]
pub struct ScriptedBurstPolicy {
    scripts: HashMap<usize, VecDeque<BurstOutcome>>,
}

impl ScriptedBurstPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends outcomes to the script of process `index`
    pub fn with_script(
        mut self,
        index: usize,
        outcomes: impl IntoIterator<Item = BurstOutcome>,
    ) -> Self {
        self.scripts.entry(index).or_default().extend(outcomes);
        self
    }

    /// Number of scripted outcomes not yet consumed
    pub fn remaining(&self) -> usize {
        self.scripts.values().map(VecDeque::len).sum()
    }
}

impl BurstPolicy for ScriptedBurstPolicy {
    fn on_burst_exhausted(&mut self, index: usize) -> BurstOutcome {
        self.scripts
            .get_mut(&index)
            .and_then(VecDeque::pop_front)
            .unwrap_or(BurstOutcome::Terminate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> RandomBurstPolicy {
        RandomBurstPolicy::from_config(&SchedulerConfig {
            seed: Some(seed),
            max_cpu_burst: 8,
            max_io_time: 3,
            ..SchedulerConfig::default()
        })
    }

    #[test]
    fn test_random_policy_respects_bounds() {
        let mut policy = seeded(7);
        for _ in 0..500 {
            assert!((1..=8).contains(&policy.sample_burst()));
            match policy.on_burst_exhausted(0) {
                BurstOutcome::Terminate => {}
                BurstOutcome::Io {
                    io_wait,
                    next_burst,
                } => {
                    assert!((1..=3).contains(&io_wait));
                    assert!((1..=8).contains(&next_burst));
                }
            }
        }
    }

    #[test]
    fn test_random_policy_is_reproducible_with_seed() {
        let mut a = seeded(42);
        let mut b = seeded(42);
        for index in 0..100 {
            assert_eq!(a.on_burst_exhausted(index), b.on_burst_exhausted(index));
        }
    }

    #[test]
    fn test_random_policy_produces_both_outcomes() {
        let mut policy = seeded(3);
        let outcomes: Vec<BurstOutcome> = (0..200).map(|i| policy.on_burst_exhausted(i)).collect();
        assert!(outcomes.contains(&BurstOutcome::Terminate));
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, BurstOutcome::Io { .. })));
    }

    #[test]
    fn test_scripted_policy_replays_in_order() {
        let io = BurstOutcome::Io {
            io_wait: 3,
            next_burst: 1,
        };
        let mut policy = ScriptedBurstPolicy::new().with_script(1, [io, BurstOutcome::Terminate]);
        assert_eq!(policy.remaining(), 2);

        assert_eq!(policy.on_burst_exhausted(1), io);
        assert_eq!(policy.on_burst_exhausted(1), BurstOutcome::Terminate);
        assert_eq!(policy.remaining(), 0);
    }

    #[test]
    fn test_scripted_policy_defaults_to_terminate() {
        let mut policy = ScriptedBurstPolicy::new();
        assert_eq!(policy.on_burst_exhausted(9), BurstOutcome::Terminate);
    }
}
