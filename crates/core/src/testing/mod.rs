//! Testing utilities and mock implementations.
//!
//! The [`MockRunner`] stands in for ffmpeg and exiftool so the converter,
//! the post-processor and the whole batch driver can be exercised against
//! temporary directories without any external tool installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelpress_core::testing::{fixtures, MockRunner};
//!
//! let runner = Arc::new(MockRunner::new());
//! runner.fail_source("broken.mov").await;
//!
//! let input = tempfile::TempDir::new()?;
//! fixtures::write_video(input.path(), "holiday.mov", 1_000_000);
//! fixtures::write_video(input.path(), "broken.mov", 1_000);
//! ```

mod mock_runner;

pub use mock_runner::MockRunner;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Write a fake video file of `bytes` bytes and return its path.
    pub fn write_video(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0x42u8; bytes]).expect("Failed to write fixture");
        path
    }

    /// Write a non-video file and return its path.
    pub fn write_other(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"not a video").expect("Failed to write fixture");
        path
    }

    /// Names of the entries directly inside `dir`, sorted.
    pub fn list_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
