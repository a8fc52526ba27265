//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{EncoderConfig, Settings};

/// Configuration for the FFmpeg-based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Encoding policy.
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Timeout for a single conversion in seconds. `None` waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Number of log lines kept on a failed result.
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_log_tail_lines() -> usize {
    20
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            encoder: EncoderConfig::default(),
            timeout_secs: None,
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

impl ConverterConfig {
    /// Builds the converter configuration from loaded settings and a resolved ffmpeg path.
    pub fn from_settings(ffmpeg_path: PathBuf, settings: &Settings) -> Self {
        Self {
            ffmpeg_path,
            encoder: settings.encoder.clone(),
            timeout_secs: settings.batch.timeout_secs,
            log_tail_lines: settings.batch.log_tail_lines,
        }
    }

    /// Sets the ffmpeg path.
    pub fn with_ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.ffmpeg_path = path;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the number of log lines kept on failure.
    pub fn with_log_tail_lines(mut self, lines: usize) -> Self {
        self.log_tail_lines = lines;
        self
    }

    /// Timeout as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
