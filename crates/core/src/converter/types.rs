//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::EncoderConfig;
use crate::planner::ResourcePlan;

/// Video encoding strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// CPU encoder bounded by the resource plan.
    #[default]
    Software,
    /// Dedicated media hardware at a fixed bitrate.
    Hardware,
}

impl EncodingMode {
    /// The ffmpeg encoder selected by this mode.
    pub fn encoder<'a>(&self, config: &'a EncoderConfig) -> &'a str {
        match self {
            Self::Software => &config.software_codec,
            Self::Hardware => &config.hardware_codec,
        }
    }

    /// Video encoder arguments for this mode.
    pub fn video_args(&self, config: &EncoderConfig, plan: &ResourcePlan) -> Vec<String> {
        match self {
            Self::Software => vec![
                "-c:v".to_string(),
                config.software_codec.clone(),
                "-preset".to_string(),
                config.preset.clone(),
                "-crf".to_string(),
                config.crf.to_string(),
                "-threads".to_string(),
                plan.workers.to_string(),
                "-x265-params".to_string(),
                format!("pools={}", plan.pools),
            ],
            Self::Hardware => vec![
                "-c:v".to_string(),
                config.hardware_codec.clone(),
                "-b:v".to_string(),
                config.hardware_bitrate.clone(),
                "-tag:v".to_string(),
                config.hardware_tag.clone(),
            ],
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Software => write!(f, "software"),
            Self::Hardware => write!(f, "hardware"),
        }
    }
}

/// Classification of a single engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ConversionStatus {
    Succeeded,
    Failed { reason: String },
}

/// Outcome of one conversion job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Success or failure with a reason.
    #[serde(flatten)]
    pub status: ConversionStatus,
    /// Engine exit code, if it exited normally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Wall-clock duration of the engine run in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the output file existed after the run.
    pub output_exists: bool,
    /// Last lines of the retained log (failures only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_tail: Vec<String>,
}

impl ConversionResult {
    /// Classifies an engine run.
    ///
    /// Success needs both a zero exit code and an output file on disk.
    pub fn classify(
        exit_code: Option<i32>,
        timed_out: bool,
        output_exists: bool,
        elapsed: Duration,
    ) -> Self {
        let status = if timed_out {
            ConversionStatus::Failed {
                reason: format!("timed out after {}s", elapsed.as_secs()),
            }
        } else {
            match exit_code {
                Some(0) if output_exists => ConversionStatus::Succeeded,
                Some(0) => ConversionStatus::Failed {
                    reason: "engine exited with code 0 but produced no output".to_string(),
                },
                Some(code) => ConversionStatus::Failed {
                    reason: format!("engine exited with code {}", code),
                },
                None => ConversionStatus::Failed {
                    reason: "engine was terminated by a signal".to_string(),
                },
            }
        };

        Self {
            status,
            exit_code,
            elapsed_ms: elapsed.as_millis() as u64,
            output_exists,
            log_tail: Vec::new(),
        }
    }

    /// A failure that happened before the engine produced an exit code.
    pub fn failed(reason: impl Into<String>, output_exists: bool, elapsed: Duration) -> Self {
        Self {
            status: ConversionStatus::Failed {
                reason: reason.into(),
            },
            exit_code: None,
            elapsed_ms: elapsed.as_millis() as u64,
            output_exists,
            log_tail: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ConversionStatus::Succeeded)
    }

    /// Failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            ConversionStatus::Failed { reason } => Some(reason),
            ConversionStatus::Succeeded => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}
