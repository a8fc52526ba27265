//! Conversion jobs.
//!
//! This module provides the `Converter` trait and the FFmpeg implementation
//! that turns one discovered input into a normalized HEVC/AAC MP4.
//!
//! # Features
//!
//! - Software (libx265, bounded by a [`crate::planner::ResourcePlan`]) and
//!   hardware (fixed bitrate, tagged for player compatibility) encoding
//! - Downscaling to a bounding box without upscaling, fixed frame rate
//! - Stereo AAC audio, source metadata and fast-start layout
//! - Per-item engine log, with its tail surfaced on failure
//!
//! # Example
//!
//! ```ignore
//! use reelpress_core::converter::{Converter, ConverterConfig, EncodingMode, FfmpegConverter};
//! use reelpress_core::runner::SystemRunner;
//!
//! let converter = FfmpegConverter::new(ConverterConfig::default(), Arc::new(SystemRunner::new()));
//! converter.validate(EncodingMode::Software).await?;
//!
//! let result = converter.convert(&item, &plan, EncodingMode::Software).await;
//! println!("Converted in {} ms", result.elapsed_ms);
//! ```

mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use capabilities::EncoderCapabilities;
pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{ConversionResult, ConversionStatus, EncodingMode};
