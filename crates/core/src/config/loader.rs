use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Settings, ConfigError};

/// Environment variable prefix for settings overrides (`REELPRESS_ENCODER__CRF=24`).
const ENV_PREFIX: &str = "REELPRESS_";

/// Load settings from built-in defaults, an optional TOML file and environment overrides
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load settings from a TOML string (useful for testing)
pub fn load_settings_from_str(toml_str: &str) -> Result<Settings, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
