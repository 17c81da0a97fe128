//! Configuration for the eisc-meet relay and client.
//!
//! TOML-based, with every section defaulted so partial files work. The
//! loading order is: file (or defaults) → environment overrides →
//! validation.
//!
//! ```rust,no_run
//! let config = meet_config::load_config().expect("failed to load config");
//! println!("{}", config.relay.listen_addr());
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::{apply_env_overrides, apply_overrides_from};
pub use schema::{ClientConfig, LoggingConfig, MediaConfig, MeetConfig, RelayConfig};
pub use toml_loader::{default_config_path, load_default, load_from_path};
pub use validation::validate;

use std::path::Path;

use meet_common::ConfigError;

/// Load config from the platform default path, apply env overrides, validate.
pub fn load_config() -> Result<MeetConfig, ConfigError> {
    finish(toml_loader::load_default()?)
}

/// Load config from an explicit path, apply env overrides, validate.
pub fn load_config_from(path: &Path) -> Result<MeetConfig, ConfigError> {
    finish(toml_loader::load_from_path(path)?)
}

fn finish(mut config: MeetConfig) -> Result<MeetConfig, ConfigError> {
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &MeetConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
