//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trail_config::load_config;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("History bars: {}", config.engine.history_bars);
            println!("Half-spread: {}", config.engine.half_spread);
            println!("Trailing poll interval: {}ms", config.trailing.poll_interval_ms);
            println!(
                "Trailing failure limit: {}",
                config.trailing.max_consecutive_failures
            );
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
