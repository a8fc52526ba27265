//! Input discovery.
//!
//! Lists eligible video files at a single directory level and maps each one
//! to its output and log paths.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to read input directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where outputs and logs for a run are placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_dir: PathBuf,
    log_dir: PathBuf,
    output_extension: String,
}

impl OutputLayout {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        log_dir_name: &str,
        output_extension: impl Into<String>,
    ) -> Self {
        let output_dir = output_dir.into();
        Self {
            log_dir: output_dir.join(log_dir_name),
            output_dir,
            output_extension: output_extension.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Output path: same stem, normalized extension.
    pub fn output_for(&self, source: &Path) -> PathBuf {
        self.output_dir
            .join(with_extension(source, &self.output_extension))
    }

    /// Log path: `<log_dir>/<stem>.log`.
    pub fn log_for(&self, source: &Path) -> PathBuf {
        self.log_dir.join(with_extension(source, "log"))
    }
}

/// `<stem>.<ext>` built on the raw file stem, so non-UTF-8 names survive.
fn with_extension(path: &Path, ext: &str) -> OsString {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(ext);
    name
}

/// One file to convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub source: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
}

impl WorkItem {
    pub fn new(source: PathBuf, layout: &OutputLayout) -> Self {
        Self {
            output: layout.output_for(&source),
            log: layout.log_for(&source),
            source,
        }
    }

    /// Source file name, for display.
    pub fn name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Lists eligible files directly inside `dir`.
///
/// Extensions match case-sensitively. Items are grouped by extension in the
/// order of `extensions`, and keep directory-listing order within a group.
/// Subdirectories and anything that is not a regular file are ignored.
pub async fn discover(
    dir: &Path,
    extensions: &[String],
    layout: &OutputLayout,
) -> Result<Vec<WorkItem>, DiscoveryError> {
    let unreadable = |source| DiscoveryError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        // file_type() does not follow symlinks; fall back to metadata for those
        let is_file = match entry.file_type().await {
            Ok(ft) if ft.is_symlink() => tokio::fs::metadata(entry.path())
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Ok(ft) => ft.is_file(),
            Err(_) => false,
        };
        if is_file {
            files.push(entry.path());
        }
    }

    let mut items = Vec::new();
    for ext in extensions {
        for path in &files {
            let matches = path
                .extension()
                .map(|e| e.to_string_lossy() == ext.as_str())
                .unwrap_or(false);
            if matches {
                items.push(WorkItem::new(path.clone(), layout));
            }
        }
    }

    debug!(dir = %dir.display(), found = items.len(), scanned = files.len(), "Discovery complete");
    Ok(items)
}
