//! Encoder capability detection.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Matches a video encoder row of `ffmpeg -encoders`, e.g. ` V....D libx265  libx265 H.265 / HEVC`.
static VIDEO_ENCODER_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*V[A-Z.]{5}\s+(\S+)").expect("valid encoder regex"));

/// Video encoders compiled into an ffmpeg build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCapabilities {
    video_encoders: BTreeSet<String>,
}

impl EncoderCapabilities {
    /// Parses the listing printed by `ffmpeg -encoders`.
    pub fn parse(listing: &str) -> Self {
        let video_encoders = listing
            .lines()
            .filter_map(|line| VIDEO_ENCODER_ROW.captures(line))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            // The legend row ("V..... = Video") is not an encoder.
            .filter(|name| name != "=")
            .collect();

        Self { video_encoders }
    }

    /// Whether the named video encoder is available.
    pub fn supports(&self, encoder: &str) -> bool {
        self.video_encoders.contains(encoder)
    }

    /// Whether any known hardware HEVC encoder is available.
    pub fn has_hardware_hevc(&self) -> bool {
        ["hevc_videotoolbox", "hevc_nvenc", "hevc_qsv", "hevc_amf", "hevc_vaapi"]
            .iter()
            .any(|e| self.supports(e))
    }

    pub fn video_encoders(&self) -> impl Iterator<Item = &str> {
        self.video_encoders.iter().map(String::as_str)
    }
}
