use std::path::{Path, PathBuf};

use super::{BatchConfig, ConfigError};
use crate::converter::EncodingMode;
use crate::planner::UtilizationFraction;

/// The validated parameters of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    input_dir: PathBuf,
    output_dir: PathBuf,
    fraction: UtilizationFraction,
    mode: EncodingMode,
}

impl RunConfiguration {
    /// Validates and builds a run configuration.
    ///
    /// The input directory must exist, be a directory and be listable. The
    /// output directory is not checked here; the batch driver creates it.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        cpu_percent: u8,
        mode: EncodingMode,
    ) -> Result<Self, ConfigError> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        let fraction = UtilizationFraction::try_from(cpu_percent)?;

        let metadata = std::fs::metadata(&input_dir)
            .map_err(|_| ConfigError::InputNotFound(input_dir.clone()))?;
        if !metadata.is_dir() {
            return Err(ConfigError::InputNotDirectory(input_dir));
        }
        std::fs::read_dir(&input_dir).map_err(|source| ConfigError::InputUnreadable {
            path: input_dir.clone(),
            source,
        })?;

        if same_location(&input_dir, &output_dir) {
            return Err(ConfigError::OutputIsInput(output_dir));
        }

        Ok(Self {
            input_dir,
            output_dir,
            fraction,
            mode,
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn fraction(&self) -> UtilizationFraction {
        self.fraction
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// Hidden per-run log directory inside the output directory.
    pub fn log_dir(&self, batch: &BatchConfig) -> PathBuf {
        self.output_dir.join(&batch.log_dir_name)
    }
}

// Outputs share the input's stem, so converting in place would treat
// `.mp4` inputs as already converted.
fn same_location(input: &Path, output: &Path) -> bool {
    match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    }
}
