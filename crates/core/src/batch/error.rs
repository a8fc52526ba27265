use std::path::PathBuf;
use thiserror::Error;

use crate::discovery::DiscoveryError;

/// Errors that end a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
