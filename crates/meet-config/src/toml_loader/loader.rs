//! Core TOML config loading: read from path or platform default.

use crate::schema::MeetConfig;
use meet_common::ConfigError;
use std::path::Path;
use tracing::info;

use super::paths::default_config_path;

/// Load config from a specific TOML file path.
///
/// Missing fields are filled by serde defaults. Validation is left to the
/// caller so that env overrides can be applied first.
pub fn load_from_path(path: &Path) -> Result<MeetConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: MeetConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On Linux: `~/.config/eisc-meet/config.toml`
///
/// A missing file is not an error: defaults are returned.
pub fn load_default() -> Result<MeetConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, using defaults", path.display());
            Ok(MeetConfig::default())
        }
        Err(e) => Err(e),
    }
}
