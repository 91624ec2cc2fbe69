//! Scheduler error types

use thiserror::Error;

/// Errors rejected at setup time
///
/// A configuration error is fatal to the run and never surfaces once the
/// first tick has been processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No processes requested
    #[error("At least one process is required")]
    NoProcesses,

    /// Process count exceeds the fixed capacity
    #[error("Too many processes: {requested} (maximum {max})")]
    TooManyProcesses { requested: usize, max: usize },

    /// Time quantum outside the accepted bounds
    #[error("Time quantum {quantum} out of range {min}..={max}")]
    QuantumOutOfRange { quantum: u32, min: u32, max: u32 },

    /// Priority bounds are empty or inverted
    #[error("Invalid priority bounds: min {min} must be below max {max}")]
    InvalidPriorityBounds { min: u32, max: u32 },

    /// Maximum CPU burst must be at least one tick
    #[error("Maximum CPU burst must be at least 1")]
    InvalidCpuBurst,

    /// Maximum I/O time must be at least one tick
    #[error("Maximum I/O time must be at least 1")]
    InvalidIoTime,

    /// Aging must promote by at least one step, and fire after at least one tick
    #[error("Invalid aging settings: interval {interval:?}, amount {amount}")]
    InvalidAging { interval: Option<u32>, amount: u32 },

    /// History horizon must cover at least one tick
    #[error("History horizon must be at least 1 tick")]
    ZeroHistoryHorizon,

    /// Supplied process specs do not match the configured count
    #[error("Expected {expected} process specs, got {actual}")]
    ProcessCountMismatch { expected: usize, actual: usize },

    /// A process was given a priority outside the configured bounds
    #[error("Process {index}: priority {priority} out of range {min}..={max}")]
    PriorityOutOfRange {
        index: usize,
        priority: u32,
        min: u32,
        max: u32,
    },

    /// A process was created with nothing to run
    #[error("Process {index}: initial CPU burst must be at least 1")]
    ZeroInitialBurst { index: usize },

    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(String),

    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// A broken scheduler invariant, reported by `Scheduler::check_invariants`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("More than one process is running: {0:?}")]
    MultipleRunning(Vec<usize>),

    #[error("Current running index {index:?} does not point at a running process")]
    RunningIndexMismatch { index: Option<usize> },

    #[error("Completed count {counted} disagrees with {done} finished records")]
    CompletedCountMismatch { counted: usize, done: usize },
}
