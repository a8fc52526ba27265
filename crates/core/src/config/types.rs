use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings, layered from defaults, an optional TOML file and the environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Overrides for external tool locations. Unset paths are looked up in `PATH`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exiftool_path: Option<PathBuf>,
}

/// Encoding policy shared by both encoding modes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EncoderConfig {
    /// Software video encoder.
    #[serde(default = "default_software_codec")]
    pub software_codec: String,
    /// Speed preset for the software encoder.
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Constant rate factor for the software encoder (0-51).
    #[serde(default = "default_crf")]
    pub crf: u8,
    /// Hardware video encoder.
    #[serde(default = "default_hardware_codec")]
    pub hardware_codec: String,
    /// Target bitrate for the hardware encoder, in ffmpeg notation (e.g. "5M").
    #[serde(default = "default_hardware_bitrate")]
    pub hardware_bitrate: String,
    /// Codec tag written on hardware-encoded streams for player compatibility.
    #[serde(default = "default_hardware_tag")]
    pub hardware_tag: String,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
    #[serde(default = "default_audio_channels")]
    pub audio_channels: u8,
}

fn default_software_codec() -> String {
    "libx265".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u8 {
    28
}

fn default_hardware_codec() -> String {
    "hevc_videotoolbox".to_string()
}

fn default_hardware_bitrate() -> String {
    "5M".to_string()
}

fn default_hardware_tag() -> String {
    "hvc1".to_string()
}

fn default_max_width() -> u32 {
    1920
}

fn default_max_height() -> u32 {
    1080
}

fn default_fps() -> u32 {
    30
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> u32 {
    128
}

fn default_audio_channels() -> u8 {
    2
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            software_codec: default_software_codec(),
            preset: default_preset(),
            crf: default_crf(),
            hardware_codec: default_hardware_codec(),
            hardware_bitrate: default_hardware_bitrate(),
            hardware_tag: default_hardware_tag(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            fps: default_fps(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate(),
            audio_channels: default_audio_channels(),
        }
    }
}

/// Batch driver behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Eligible input extensions, matched case-sensitively and scanned in this order.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Extension given to every output file.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Hidden subdirectory of the output directory holding per-item logs.
    #[serde(default = "default_log_dir_name")]
    pub log_dir_name: String,
    /// Number of log lines printed for a failed item.
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
    /// Per-item engine timeout in seconds. `None` waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_extensions() -> Vec<String> {
    ["mp4", "MP4", "mov", "MOV", "m4v", "M4V", "avi", "AVI", "mkv", "MKV"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

fn default_log_dir_name() -> String {
    ".logs".to_string()
}

fn default_log_tail_lines() -> usize {
    20
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            output_extension: default_output_extension(),
            log_dir_name: default_log_dir_name(),
            log_tail_lines: default_log_tail_lines(),
            timeout_secs: None,
        }
    }
}
