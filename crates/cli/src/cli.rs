use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use reelpress_core::EncodingMode;

#[derive(Parser, Debug)]
#[command(name = "reelpress")]
#[command(author, version, about = "Batch-convert videos to compact HEVC/AAC MP4 files")]
pub struct Cli {
    /// Directory containing the videos to convert (not searched recursively)
    pub input: PathBuf,

    /// Directory receiving the converted files; created if missing
    pub output: PathBuf,

    /// Share of CPU cores given to the encoder: 25, 50, 75 or 100
    #[arg(default_value_t = 100)]
    pub cpu_percent: u8,

    /// Use hardware-accelerated encoding
    #[arg(value_enum, default_value_t = HwAccel::No)]
    pub hwaccel: HwAccel,

    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Kill a conversion after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write the run summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Exit with status 1 if any file failed to convert
    #[arg(long)]
    pub fail_on_error: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HwAccel {
    #[value(alias = "software")]
    No,
    #[value(alias = "hardware")]
    Yes,
}

impl From<HwAccel> for EncodingMode {
    fn from(value: HwAccel) -> Self {
        match value {
            HwAccel::No => EncodingMode::Software,
            HwAccel::Yes => EncodingMode::Hardware,
        }
    }
}
