//! Scheduler configuration
//!
//! All inputs are validated once, at setup. Nothing here is re-checked per
//! tick.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed capacity of the process table
pub const MAX_PROCESSES: usize = 50;

/// Largest accepted time quantum
pub const MAX_TIME_QUANTUM: u32 = 10;

/// Smallest accepted time quantum
pub const MIN_TIME_QUANTUM: u32 = 1;

/// Which selection and preemption rules the tick driver applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Non-preemptive; earliest arrival in the ready set runs first
    Fifo,
    /// Quantum preemption, priorities ignored
    RoundRobin,
    /// Static priority, quantum preemption, round-robin ties and aging
    #[default]
    PriorityAging,
}

impl SchedulingPolicy {
    /// Returns true if this policy adjusts and compares priorities
    pub fn uses_priority(self) -> bool {
        matches!(self, SchedulingPolicy::PriorityAging)
    }

    /// Returns true if the running process is preempted when its quantum expires
    pub fn is_preemptive(self) -> bool {
        !matches!(self, SchedulingPolicy::Fifo)
    }
}

/// Anti-starvation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingConfig {
    /// Ticks of continuous READY waiting before a promotion.
    /// `None` disables aging altogether.
    pub interval: Option<u32>,
    /// Priority steps gained per promotion
    pub amount: u32,
}

impl AgingConfig {
    /// Aging switched off; starvation is then unbounded
    pub fn disabled() -> Self {
        Self {
            interval: None,
            ..Self::default()
        }
    }
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            interval: Some(10),
            amount: 1,
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of simulated processes
    pub num_processes: usize,
    /// Consecutive ticks a process may hold the CPU
    pub time_quantum: u32,
    /// Upper bound for sampled CPU bursts
    pub max_cpu_burst: u32,
    /// Upper bound for sampled I/O waits
    pub max_io_time: u32,
    /// Aging settings
    pub aging: AgingConfig,
    /// Numerically lowest (best) priority
    pub min_priority: u32,
    /// Numerically highest (worst) priority
    pub max_priority: u32,
    /// Selection rules
    pub policy: SchedulingPolicy,
    /// Number of ticks recorded in the history log
    pub history_horizon: u64,
    /// Supervisor safety bound; `None` runs until every process completes
    pub max_ticks: Option<u64>,
    /// Seed for sampled bursts and exit decisions
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_processes: 5,
            time_quantum: 3,
            max_cpu_burst: 50,
            max_io_time: 5,
            aging: AgingConfig::default(),
            min_priority: 0,
            max_priority: 10,
            policy: SchedulingPolicy::PriorityAging,
            history_horizon: 1000,
            max_ticks: Some(10_000),
            seed: None,
        }
    }
}

impl SchedulerConfig {
    /// Checks every bound, returning the first violation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_processes == 0 {
            return Err(ConfigError::NoProcesses);
        }
        if self.num_processes > MAX_PROCESSES {
            return Err(ConfigError::TooManyProcesses {
                requested: self.num_processes,
                max: MAX_PROCESSES,
            });
        }
        if !(MIN_TIME_QUANTUM..=MAX_TIME_QUANTUM).contains(&self.time_quantum) {
            return Err(ConfigError::QuantumOutOfRange {
                quantum: self.time_quantum,
                min: MIN_TIME_QUANTUM,
                max: MAX_TIME_QUANTUM,
            });
        }
        if self.min_priority >= self.max_priority {
            return Err(ConfigError::InvalidPriorityBounds {
                min: self.min_priority,
                max: self.max_priority,
            });
        }
        if self.max_cpu_burst == 0 {
            return Err(ConfigError::InvalidCpuBurst);
        }
        if self.max_io_time == 0 {
            return Err(ConfigError::InvalidIoTime);
        }
        if self.aging.amount == 0 || self.aging.interval == Some(0) {
            return Err(ConfigError::InvalidAging {
                interval: self.aging.interval,
                amount: self.aging.amount,
            });
        }
        if self.history_horizon == 0 {
            return Err(ConfigError::ZeroHistoryHorizon);
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Default initial priority for the process at `index`: its index,
    /// clamped into the configured bounds
    pub fn default_priority_for(&self, index: usize) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        index
            .saturating_add(self.min_priority)
            .clamp(self.min_priority, self.max_priority)
    }
}
