//! Types for the finalize module.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::format::format_bytes;

/// Size comparison between a source and its output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    pub source_bytes: u64,
    pub output_bytes: u64,
    /// `(1 - output/source) * 100`. Negative when the output grew, `None` for
    /// an empty source.
    pub reduction_percent: Option<f64>,
}

impl SizeReport {
    pub fn new(source_bytes: u64, output_bytes: u64) -> Self {
        let reduction_percent = if source_bytes == 0 {
            None
        } else {
            Some((1.0 - output_bytes as f64 / source_bytes as f64) * 100.0)
        };

        Self {
            source_bytes,
            output_bytes,
            reduction_percent,
        }
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            format_bytes(self.source_bytes),
            format_bytes(self.output_bytes)
        )?;
        match self.reduction_percent {
            Some(pct) if pct >= 0.0 => write!(f, " ({:.1}% smaller)", pct),
            Some(pct) => write!(f, " ({:.1}% larger)", -pct),
            None => Ok(()),
        }
    }
}

/// A non-fatal problem during post-processing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostProcessingWarning {
    #[error("metadata copy failed: {reason}")]
    MetadataCopy { reason: String },

    #[error("timestamp copy failed: {reason}")]
    Timestamps { reason: String },

    #[error("size comparison unavailable: {reason}")]
    Size { reason: String },
}

/// Result of finalizing one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalizeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PostProcessingWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_percent() {
        let report = SizeReport::new(1_000_000, 400_000);
        let pct = report.reduction_percent.unwrap();
        assert!((pct - 60.0).abs() < 1e-9);
        assert!(report.to_string().ends_with("(60.0% smaller)"));
    }

    #[test]
    fn test_zero_byte_source_has_no_percentage() {
        let report = SizeReport::new(0, 1024);
        assert_eq!(report.reduction_percent, None);
        assert_eq!(report.to_string(), "0 B -> 1.0 KB");
    }

    #[test]
    fn test_output_grew() {
        let report = SizeReport::new(1000, 1500);
        assert!((report.reduction_percent.unwrap() + 50.0).abs() < 1e-9);
        assert!(report.to_string().ends_with("(50.0% larger)"));
    }

    #[test]
    fn test_warning_serialization() {
        let warning = PostProcessingWarning::MetadataCopy {
            reason: "exiftool exited with code 1".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "metadata_copy");
        assert_eq!(json["reason"], "exiftool exited with code 1");
        assert_eq!(
            warning.to_string(),
            "metadata copy failed: exiftool exited with code 1"
        );
    }
}
