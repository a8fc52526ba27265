//! Types for the batch module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::{ConversionResult, EncodingMode};
use crate::finalize::FinalizeReport;
use crate::planner::{ResourcePlan, UtilizationFraction};

/// Terminal state of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The output already existed.
    Skipped,
    /// Converted and finalized.
    Succeeded {
        conversion: ConversionResult,
        finalize: FinalizeReport,
    },
    /// Conversion failed; the log was kept.
    Failed { conversion: ConversionResult },
}

impl ItemOutcome {
    pub fn warning_count(&self) -> usize {
        match self {
            Self::Succeeded { finalize, .. } => finalize.warnings.len(),
            _ => 0,
        }
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchProgress {
    /// Discovery finished.
    Started {
        total: usize,
        plan: ResourcePlan,
        mode: EncodingMode,
        fraction: UtilizationFraction,
        input_dir: PathBuf,
        output_dir: PathBuf,
    },
    /// An item is about to be handled.
    ItemStarted {
        index: usize,
        total: usize,
        name: String,
    },
    /// An item reached its terminal state.
    ItemFinished {
        index: usize,
        total: usize,
        name: String,
        log: PathBuf,
        outcome: ItemOutcome,
    },
    /// All items were handled.
    Finished { summary: RunSummary },
}

/// One line of the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub source: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Eligible files found.
    pub discovered: usize,
    /// Items the engine ran on (succeeded + failed).
    pub processed: usize,
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Post-processing warnings across all items.
    pub warnings: usize,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub log_dir: PathBuf,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl RunSummary {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            discovered: 0,
            processed: 0,
            skipped: 0,
            succeeded: 0,
            failed: 0,
            warnings: 0,
            started_at: Utc::now(),
            finished_at: None,
            log_dir,
            items: Vec::new(),
        }
    }

    /// Counts one item's terminal state.
    pub fn record(&mut self, record: ItemRecord) {
        match &record.outcome {
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Succeeded { .. } => {
                self.processed += 1;
                self.succeeded += 1;
            }
            ItemOutcome::Failed { .. } => {
                self.processed += 1;
                self.failed += 1;
            }
        }
        self.warnings += record.outcome.warning_count();
        self.items.push(record);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::PostProcessingWarning;
    use std::time::Duration;

    fn record(outcome: ItemOutcome) -> ItemRecord {
        ItemRecord {
            source: PathBuf::from("/in/a.mov"),
            output: PathBuf::from("/out/a.mp4"),
            outcome,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new(PathBuf::from("/out/.logs"));
        summary.discovered = 3;

        summary.record(record(ItemOutcome::Skipped));
        summary.record(record(ItemOutcome::Succeeded {
            conversion: ConversionResult::classify(Some(0), false, true, Duration::from_secs(3)),
            finalize: FinalizeReport {
                size: None,
                warnings: vec![PostProcessingWarning::MetadataCopy {
                    reason: "exit 1".to_string(),
                }],
            },
        }));
        summary.record(record(ItemOutcome::Failed {
            conversion: ConversionResult::classify(Some(1), false, false, Duration::from_secs(1)),
        }));
        summary.finish();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.warnings, 1);
        assert!(summary.has_failures());
        assert!(summary.finished_at.unwrap() >= summary.started_at);
    }

    #[test]
    fn test_summary_serialization() {
        let mut summary = RunSummary::new(PathBuf::from("/out/.logs"));
        summary.record(record(ItemOutcome::Skipped));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["log_dir"], "/out/.logs");
        assert_eq!(json["items"][0]["status"], "skipped");
        assert_eq!(json["items"][0]["output"], "/out/a.mp4");
        assert!(json.get("finished_at").is_none());
    }
}
