//! Logger setup for the host binary

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Starts logging to stderr, filtered by `RUST_LOG` (default `info`).
///
/// The returned handle must be kept alive for the duration of the run.
pub fn initialize() -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str("info")?.start()
}
