mod loader;
mod run;
mod types;
mod validate;

pub use loader::{load_settings, load_settings_from_str};
pub use run::RunConfiguration;
pub use types::*;
pub use validate::validate_settings;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    #[error("Settings validation failed: {0}")]
    ValidationError(String),

    #[error("CPU percentage must be one of 25, 50, 75 or 100 (got {0})")]
    InvalidFraction(u8),

    #[error("Input directory does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {}", .0.display())]
    InputNotDirectory(PathBuf),

    #[error("Input directory is not readable: {}", .path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output directory must differ from the input directory: {}", .0.display())]
    OutputIsInput(PathBuf),

    #[error("Required tool not found: {tool} (is it installed and in PATH?)")]
    ToolNotFound { tool: String },
}
