//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub trailing: TrailingSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trailtrade".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Trade engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Bars requested from the feed per evaluation. Must cover the 90-bar
    /// indicator warmup.
    pub history_bars: usize,
    /// Half-spread applied to synthetic quotes derived from bar closes.
    pub half_spread: Decimal,
}

impl Default for EngineSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            history_bars: 100,
            half_spread: dec!(0.0001),
        }
    }
}

/// Trailing stop controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailingSettings {
    /// Delay between controller ticks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Consecutive transient failures tolerated before the controller
    /// gives up.
    pub max_consecutive_failures: u32,
}

impl TrailingSettings {
    /// Poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TrailingSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            max_consecutive_failures: 5,
        }
    }
}
