//! Metadata, timestamp and size post-processing.

use async_trait::async_trait;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::Finalizer;
use super::types::{FinalizeReport, PostProcessingWarning, SizeReport};
use crate::discovery::WorkItem;
use crate::runner::{CommandRequest, CommandRunner};

/// Default [`Finalizer`]: exiftool metadata copy, timestamp copy, size report.
pub struct PostProcessor<R: CommandRunner> {
    /// `None` disables the metadata copy.
    exiftool: Option<PathBuf>,
    runner: Arc<R>,
}

impl<R: CommandRunner> PostProcessor<R> {
    pub fn new(exiftool: Option<PathBuf>, runner: Arc<R>) -> Self {
        Self { exiftool, runner }
    }

    pub fn metadata_enabled(&self) -> bool {
        self.exiftool.is_some()
    }

    async fn copy_metadata(&self, exiftool: &Path, item: &WorkItem) -> Result<(), String> {
        let request = CommandRequest::new(exiftool)
            .arg("-overwrite_original")
            .arg("-TagsFromFile")
            .arg(&item.source)
            .arg("-all:all")
            .arg(&item.output);

        let output = self.runner.run(&request).await.map_err(|e| e.to_string())?;
        if output.success() {
            Ok(())
        } else {
            let detail = output.output.lines().last().unwrap_or("").trim().to_string();
            match output.exit_code {
                Some(code) if detail.is_empty() => Err(format!("exiftool exited with code {code}")),
                Some(code) => Err(format!("exiftool exited with code {code}: {detail}")),
                None => Err("exiftool was terminated by a signal".to_string()),
            }
        }
    }
}

/// Copies access and modification times, and creation time where the
/// platform can set it.
async fn copy_timestamps(source: &Path, output: &Path) -> Result<(), String> {
    let source = source.to_path_buf();
    let output = output.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let metadata = std::fs::metadata(&source).map_err(|e| e.to_string())?;

        #[cfg(any(target_os = "macos", windows))]
        if let Ok(created) = metadata.created() {
            set_created(&output, created).map_err(|e| e.to_string())?;
        }

        filetime::set_file_times(
            &output,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )
        .map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())?
}

#[cfg(target_os = "macos")]
fn set_created(path: &Path, created: std::time::SystemTime) -> std::io::Result<()> {
    use std::os::macos::fs::FileTimesExt;

    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_times(std::fs::FileTimes::new().set_created(created))
}

#[cfg(windows)]
fn set_created(path: &Path, created: std::time::SystemTime) -> std::io::Result<()> {
    use std::os::windows::fs::FileTimesExt;

    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_times(std::fs::FileTimes::new().set_created(created))
}

async fn size_report(item: &WorkItem) -> Result<SizeReport, String> {
    let source = tokio::fs::metadata(&item.source)
        .await
        .map_err(|e| format!("{}: {e}", item.source.display()))?;
    let output = tokio::fs::metadata(&item.output)
        .await
        .map_err(|e| format!("{}: {e}", item.output.display()))?;
    Ok(SizeReport::new(source.len(), output.len()))
}

#[async_trait]
impl<R: CommandRunner + 'static> Finalizer for PostProcessor<R> {
    async fn finalize(&self, item: &WorkItem) -> FinalizeReport {
        let mut report = FinalizeReport::default();

        // Metadata first: exiftool rewrites the output and resets its times.
        if let Some(exiftool) = &self.exiftool {
            if let Err(reason) = self.copy_metadata(exiftool, item).await {
                warn!(item = %item.name(), %reason, "Metadata copy failed");
                report
                    .warnings
                    .push(PostProcessingWarning::MetadataCopy { reason });
            }
        }

        if let Err(reason) = copy_timestamps(&item.source, &item.output).await {
            warn!(item = %item.name(), %reason, "Timestamp copy failed");
            report
                .warnings
                .push(PostProcessingWarning::Timestamps { reason });
        }

        match size_report(item).await {
            Ok(size) => report.size = Some(size),
            Err(reason) => report.warnings.push(PostProcessingWarning::Size { reason }),
        }

        debug!(item = %item.name(), warnings = report.warnings.len(), "Finalized");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::OutputLayout;
    use crate::testing::MockRunner;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    async fn converted_item(dir: &TempDir) -> WorkItem {
        let layout = OutputLayout::new(dir.path().join("out"), ".logs", "mp4");
        tokio::fs::create_dir_all(layout.output_dir()).await.unwrap();
        let source = dir.path().join("clip.mov");
        tokio::fs::write(&source, vec![0u8; 1_000_000]).await.unwrap();
        let item = WorkItem::new(source, &layout);
        tokio::fs::write(&item.output, vec![0u8; 400_000]).await.unwrap();
        item
    }

    fn set_source_mtime(path: &Path, age: Duration) -> FileTime {
        let time = FileTime::from_system_time(SystemTime::now() - age);
        filetime::set_file_times(path, time, time).unwrap();
        time
    }

    #[tokio::test]
    async fn test_finalize_copies_metadata_and_times() {
        let dir = TempDir::new().unwrap();
        let item = converted_item(&dir).await;
        let mtime = set_source_mtime(&item.source, Duration::from_secs(86_400 * 30));

        let runner = Arc::new(MockRunner::new());
        let processor = PostProcessor::new(Some(PathBuf::from("exiftool")), Arc::clone(&runner));
        let report = processor.finalize(&item).await;

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        let size = report.size.unwrap();
        assert_eq!(size.source_bytes, 1_000_000);
        assert_eq!(size.output_bytes, 400_000);
        assert!((size.reduction_percent.unwrap() - 60.0).abs() < 1e-9);

        let out_meta = std::fs::metadata(&item.output).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&out_meta).unix_seconds(),
            mtime.unix_seconds()
        );

        let requests = runner.requests_for("exiftool").await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].has_arg("-overwrite_original"));
        assert_eq!(
            requests[0].arg_after("-TagsFromFile"),
            Some(item.source.to_string_lossy().as_ref())
        );
    }

    #[tokio::test]
    async fn test_metadata_failure_is_warning() {
        let dir = TempDir::new().unwrap();
        let item = converted_item(&dir).await;

        let runner = Arc::new(MockRunner::new());
        runner.set_metadata_exit_code(1).await;
        let processor = PostProcessor::new(Some(PathBuf::from("exiftool")), runner);
        let report = processor.finalize(&item).await;

        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            PostProcessingWarning::MetadataCopy { reason } if reason.contains("code 1")
        ));
        assert!(report.size.is_some());
    }

    #[tokio::test]
    async fn test_metadata_disabled_without_exiftool() {
        let dir = TempDir::new().unwrap();
        let item = converted_item(&dir).await;

        let runner = Arc::new(MockRunner::new());
        let processor = PostProcessor::new(None, Arc::clone(&runner));
        assert!(!processor.metadata_enabled());

        let report = processor.finalize(&item).await;
        assert!(report.warnings.is_empty());
        assert!(runner.requests_for("exiftool").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_reports_warnings() {
        let dir = TempDir::new().unwrap();
        let item = converted_item(&dir).await;
        tokio::fs::remove_file(&item.output).await.unwrap();

        let processor = PostProcessor::new(None, Arc::new(MockRunner::new()));
        let report = processor.finalize(&item).await;

        assert!(report.size.is_none());
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, PostProcessingWarning::Timestamps { .. })));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, PostProcessingWarning::Size { .. })));
    }
}
