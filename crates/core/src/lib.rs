pub mod batch;
pub mod config;
pub mod converter;
pub mod discovery;
pub mod finalize;
pub mod format;
pub mod planner;
pub mod runner;
pub mod testing;
pub mod tools;

pub use batch::{BatchError, BatchProcessor, BatchProgress, ItemOutcome, ItemRecord, RunSummary};
pub use config::{
    load_settings, load_settings_from_str, validate_settings, BatchConfig, ConfigError,
    EncoderConfig, RunConfiguration, Settings, ToolsConfig,
};
pub use converter::{
    ConversionResult, ConversionStatus, Converter, ConverterConfig, ConverterError, EncodingMode,
    FfmpegConverter,
};
pub use discovery::{discover, DiscoveryError, OutputLayout, WorkItem};
pub use finalize::{FinalizeReport, Finalizer, PostProcessingWarning, PostProcessor, SizeReport};
pub use planner::{plan, ResourcePlan, UtilizationFraction};
pub use runner::{CommandOutput, CommandRequest, CommandRunner, RunnerError, SystemRunner};
pub use tools::Toolchain;
