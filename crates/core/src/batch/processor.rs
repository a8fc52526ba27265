//! Sequential batch processor.

use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::error::BatchError;
use super::types::{BatchProgress, ItemOutcome, ItemRecord, RunSummary};
use crate::config::{BatchConfig, RunConfiguration};
use crate::converter::Converter;
use crate::discovery::{discover, OutputLayout, WorkItem};
use crate::finalize::Finalizer;
use crate::format::format_elapsed;
use crate::planner::ResourcePlan;

/// Drives one batch run.
pub struct BatchProcessor<C: Converter, F: Finalizer> {
    run: RunConfiguration,
    plan: ResourcePlan,
    batch: BatchConfig,
    converter: C,
    finalizer: F,
    progress_tx: Option<mpsc::Sender<BatchProgress>>,
}

impl<C: Converter, F: Finalizer> BatchProcessor<C, F> {
    pub fn new(
        run: RunConfiguration,
        plan: ResourcePlan,
        batch: BatchConfig,
        converter: C,
        finalizer: F,
    ) -> Self {
        Self {
            run,
            plan,
            batch,
            converter,
            finalizer,
            progress_tx: None,
        }
    }

    /// Sends progress events to `tx`.
    pub fn with_progress(mut self, tx: mpsc::Sender<BatchProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(
            self.run.output_dir(),
            &self.batch.log_dir_name,
            self.batch.output_extension.as_str(),
        )
    }

    async fn emit(&self, event: BatchProgress) {
        if let Some(tx) = &self.progress_tx {
            // A closed receiver only means nobody is watching.
            let _ = tx.send(event).await;
        }
    }

    /// Runs the whole batch.
    pub async fn run(&self) -> Result<RunSummary, BatchError> {
        let layout = self.layout();

        for dir in [layout.output_dir(), layout.log_dir()] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| BatchError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let items = discover(self.run.input_dir(), &self.batch.extensions, &layout).await?;
        let total = items.len();

        let mut summary = RunSummary::new(layout.log_dir().to_path_buf());
        summary.discovered = total;

        info!(
            input = %self.run.input_dir().display(),
            output = %self.run.output_dir().display(),
            total,
            mode = %self.run.mode(),
            fraction = %self.run.fraction(),
            workers = self.plan.workers,
            pools = self.plan.pools,
            converter = self.converter.name(),
            "Starting batch"
        );
        self.emit(BatchProgress::Started {
            total,
            plan: self.plan,
            mode: self.run.mode(),
            fraction: self.run.fraction(),
            input_dir: self.run.input_dir().to_path_buf(),
            output_dir: self.run.output_dir().to_path_buf(),
        })
        .await;

        for (idx, item) in items.iter().enumerate() {
            let index = idx + 1;
            let outcome = self.process_item(index, total, item).await;

            self.emit(BatchProgress::ItemFinished {
                index,
                total,
                name: item.name(),
                log: item.log.clone(),
                outcome: outcome.clone(),
            })
            .await;

            summary.record(ItemRecord {
                source: item.source.clone(),
                output: item.output.clone(),
                outcome,
            });
        }

        summary.finish();
        info!(
            discovered = summary.discovered,
            processed = summary.processed,
            skipped = summary.skipped,
            succeeded = summary.succeeded,
            failed = summary.failed,
            warnings = summary.warnings,
            "Batch complete"
        );
        self.emit(BatchProgress::Finished {
            summary: summary.clone(),
        })
        .await;

        Ok(summary)
    }

    async fn process_item(&self, index: usize, total: usize, item: &WorkItem) -> ItemOutcome {
        let name = item.name();
        self.emit(BatchProgress::ItemStarted {
            index,
            total,
            name: name.clone(),
        })
        .await;

        if tokio::fs::try_exists(&item.output).await.unwrap_or(false) {
            info!(item = %name, output = %item.output.display(), "Output exists, skipping");
            return ItemOutcome::Skipped;
        }

        info!(item = %name, index, total, "Converting");

        let start = Instant::now();
        let conversion = self
            .converter
            .convert(item, &self.plan, self.run.mode())
            .await;

        if !conversion.is_success() {
            warn!(
                item = %name,
                reason = conversion.failure_reason().unwrap_or_default(),
                log = %item.log.display(),
                "Conversion failed"
            );
            // A partial output would be skipped as finished on the next run.
            if conversion.output_exists {
                remove_if_exists(&item.output).await;
            }
            return ItemOutcome::Failed { conversion };
        }

        remove_if_exists(&item.log).await;

        let finalize = self.finalizer.finalize(item).await;

        info!(
            item = %name,
            elapsed = %format_elapsed(start.elapsed()),
            reduction = ?finalize.size.and_then(|s| s.reduction_percent),
            warnings = finalize.warnings.len(),
            "Converted"
        );
        ItemOutcome::Succeeded {
            conversion,
            finalize,
        }
    }
}

async fn remove_if_exists(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConverterConfig, EncodingMode, FfmpegConverter};
    use crate::finalize::PostProcessor;
    use crate::planner::{plan, UtilizationFraction};
    use crate::testing::{fixtures, MockRunner};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn processor(
        input: &TempDir,
        runner: &Arc<MockRunner>,
    ) -> BatchProcessor<FfmpegConverter<MockRunner>, PostProcessor<MockRunner>> {
        let run = RunConfiguration::new(
            input.path(),
            input.path().join("out"),
            50,
            EncodingMode::Software,
        )
        .unwrap();
        BatchProcessor::new(
            run,
            plan(UtilizationFraction::Half, 8),
            BatchConfig::default(),
            FfmpegConverter::new(ConverterConfig::default(), Arc::clone(runner)),
            PostProcessor::new(Some(PathBuf::from("exiftool")), Arc::clone(runner)),
        )
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let input = TempDir::new().unwrap();
        fixtures::write_video(input.path(), "a.mov", 1000);
        fixtures::write_video(input.path(), "b.mov", 1000);
        let runner = Arc::new(MockRunner::new());
        runner.fail_source("b.mov").await;

        let (tx, mut rx) = mpsc::channel(32);
        let summary = processor(&input, &runner).with_progress(tx).run().await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], BatchProgress::Started { total: 2, .. }));
        assert!(matches!(events[1], BatchProgress::ItemStarted { index: 1, .. }));
        assert!(matches!(
            events[2],
            BatchProgress::ItemFinished { index: 1, outcome: ItemOutcome::Succeeded { .. }, .. }
        ));
        assert!(matches!(events[3], BatchProgress::ItemStarted { index: 2, .. }));
        assert!(matches!(
            events[4],
            BatchProgress::ItemFinished { index: 2, outcome: ItemOutcome::Failed { .. }, .. }
        ));
        assert!(matches!(events[5], BatchProgress::Finished { .. }));

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_skipped_item_reports_before_and_after() {
        let input = TempDir::new().unwrap();
        fixtures::write_video(input.path(), "a.mov", 1000);
        std::fs::create_dir_all(input.path().join("out")).unwrap();
        std::fs::write(input.path().join("out").join("a.mp4"), b"done").unwrap();
        let runner = Arc::new(MockRunner::new());

        let (tx, mut rx) = mpsc::channel(32);
        let summary = processor(&input, &runner).with_progress(tx).run().await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(runner.engine_invocations().await, 0);
        assert_eq!(events.len(), 4);
        assert!(matches!(events[1], BatchProgress::ItemStarted { index: 1, .. }));
        assert!(matches!(
            events[2],
            BatchProgress::ItemFinished { outcome: ItemOutcome::Skipped, .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_item_leaves_no_output() {
        let input = TempDir::new().unwrap();
        fixtures::write_video(input.path(), "a.mov", 1000);
        let runner = Arc::new(MockRunner::new());
        runner.fail_source_with_partial_output("a.mov").await;

        let summary = processor(&input, &runner).run().await.unwrap();

        assert_eq!(summary.failed, 1);
        match &summary.items[0].outcome {
            ItemOutcome::Failed { conversion } => assert!(conversion.output_exists),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!input.path().join("out").join("a.mp4").exists());
        assert!(input.path().join("out").join(".logs").join("a.log").exists());
    }

    #[tokio::test]
    async fn test_metadata_warning_keeps_success() {
        let input = TempDir::new().unwrap();
        fixtures::write_video(input.path(), "a.mov", 1000);
        let runner = Arc::new(MockRunner::new());
        runner.set_metadata_exit_code(1).await;

        let summary = processor(&input, &runner).run().await.unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.warnings, 1);
    }

    #[tokio::test]
    async fn test_output_dir_cannot_be_created() {
        let input = TempDir::new().unwrap();
        // A regular file where the output directory should go.
        let blocker = input.path().join("blocked");
        std::fs::write(&blocker, b"x").unwrap();
        let run = RunConfiguration::new(
            input.path(),
            blocker.join("out"),
            100,
            EncodingMode::Software,
        )
        .unwrap();
        let runner = Arc::new(MockRunner::new());

        let processor = BatchProcessor::new(
            run,
            plan(UtilizationFraction::Full, 2),
            BatchConfig::default(),
            FfmpegConverter::new(ConverterConfig::default(), Arc::clone(&runner)),
            PostProcessor::new(None, Arc::clone(&runner)),
        );

        let err = processor.run().await.unwrap_err();
        assert!(matches!(err, BatchError::CreateDir { .. }));
    }
}
