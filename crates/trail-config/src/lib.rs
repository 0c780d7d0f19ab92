//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, EngineSettings, LoggingConfig, TrailingSettings};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables prefixed `TRAIL__` override file values, e.g.
/// `TRAIL__TRAILING__POLL_INTERVAL_MS=250`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TRAIL")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}
