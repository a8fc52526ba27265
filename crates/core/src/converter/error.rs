//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use crate::runner::RunnerError;

/// Errors raised while checking that the engine is usable.
///
/// Individual conversions never return these; a failed item is a
/// [`super::ConversionResult`] with a failed status.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {}", path.display())]
    FfmpegNotFound { path: PathBuf },

    /// The encoder for the selected mode is not compiled into ffmpeg.
    #[error("Encoder {encoder} is not available in this ffmpeg build")]
    EncoderUnavailable { encoder: String },

    /// FFmpeg ran but could not list its encoders.
    #[error("FFmpeg validation failed: {reason}")]
    ValidationFailed { reason: String },

    /// Process-level failure.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}
