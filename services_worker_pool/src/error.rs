//! Worker pool errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerPoolError {
    #[error("Failed to spawn worker {index}: {reason}")]
    SpawnFailed { index: usize, reason: String },

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),
}
