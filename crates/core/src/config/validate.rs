use super::{types::Settings, ConfigError};

/// Validate settings
/// Currently validates:
/// - CRF is within the encoder's 0-51 range
/// - Scale bounds, frame rate and audio layout are non-zero
/// - At least one input extension is configured
/// - Output extension and log directory name are plain names
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let encoder = &settings.encoder;
    if encoder.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "encoder.crf must be between 0 and 51 (got {})",
            encoder.crf
        )));
    }
    if encoder.max_width == 0 || encoder.max_height == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.max_width and encoder.max_height cannot be 0".to_string(),
        ));
    }
    if encoder.fps == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.fps cannot be 0".to_string(),
        ));
    }
    if encoder.audio_channels == 0 || encoder.audio_bitrate_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.audio_channels and encoder.audio_bitrate_kbps cannot be 0".to_string(),
        ));
    }

    let batch = &settings.batch;
    if batch.extensions.is_empty() || batch.extensions.iter().any(|e| e.is_empty()) {
        return Err(ConfigError::ValidationError(
            "batch.extensions must list at least one non-empty extension".to_string(),
        ));
    }
    if !is_plain_name(&batch.output_extension) || batch.output_extension.contains('.') {
        return Err(ConfigError::ValidationError(format!(
            "batch.output_extension must be a bare extension (got {:?})",
            batch.output_extension
        )));
    }
    if !is_plain_name(&batch.log_dir_name) {
        return Err(ConfigError::ValidationError(format!(
            "batch.log_dir_name must be a single path component (got {:?})",
            batch.log_dir_name
        )));
    }
    if batch.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "batch.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
