//! External tool lookup.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{ConfigError, ToolsConfig};

/// Resolved locations of the external tools used by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Transcoding engine. Required.
    pub ffmpeg: PathBuf,
    /// Metadata tool. Metadata copy is skipped when absent.
    pub exiftool: Option<PathBuf>,
}

impl Toolchain {
    /// Resolves tools from configured paths, falling back to `PATH`.
    pub fn discover(config: &ToolsConfig) -> Result<Self, ConfigError> {
        let ffmpeg = locate("ffmpeg", config.ffmpeg_path.as_deref()).ok_or_else(|| {
            ConfigError::ToolNotFound {
                tool: "ffmpeg".to_string(),
            }
        })?;
        let exiftool = locate("exiftool", config.exiftool_path.as_deref());

        debug!(ffmpeg = %ffmpeg.display(), exiftool = ?exiftool, "Resolved tools");
        Ok(Self { ffmpeg, exiftool })
    }
}

/// A configured path that exists wins; otherwise search `PATH`.
fn locate(name: &str, configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        debug!(tool = name, path = %path.display(), "Configured tool path missing, searching PATH");
    }
    which::which(name).ok()
}
