//! Error types for the runner module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before or while waiting on an external process.
///
/// A process that runs and exits non-zero is not an error; it is reported
/// through [`super::CommandOutput::exit_code`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The program could not be started.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The output log could not be created or written.
    #[error("Failed to write log {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while waiting for the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Whether the program itself is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
