//! Utility module for playerview
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Logging setup

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, ConstructionPolicy, EngineConfig, GeneralConfig, PlaybackConfig, VolumeScaling};
pub use error::{PlayerViewError, Result};

use env_logger::Env;

/// Initialize the application configuration
///
/// Loads configuration from defaults, the system and user configuration
/// files, and environment variables.
pub fn load_config() -> Result<Config> {
    Config::load()
}

/// Initialize logging with the given default filter
///
/// `RUST_LOG` still takes precedence over `default_level`. Calling this more
/// than once is harmless.
pub fn init_logging(default_level: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}

/// Convert an engine timestamp in milliseconds to fractional seconds
pub fn millis_to_secs(ms: i64) -> f64 {
    ms as f64 / 1000.0
}
