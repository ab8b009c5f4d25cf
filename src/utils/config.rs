//! Configuration management for playerview
//!
//! This module handles loading and managing view configuration
//! from config files and environment variables.

use crate::utils::error::{IntoPlayerViewError, PlayerViewError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main view configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event normalization settings
    pub playback: PlaybackConfig,

    /// Engine construction settings
    pub engine: EngineConfig,

    /// General settings
    pub general: GeneralConfig,
}

/// Event normalization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Minimum distance between two reported progress values, in seconds
    pub min_progress_interval_secs: f64,

    /// Buffering percentage below which a stall begins
    pub stall_threshold_percent: f32,
}

/// Engine construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Options prepended to every per-source option list
    pub base_options: Vec<String>,

    /// Request hardware decoding for bound media
    pub hardware_decoding: bool,

    /// When the engine gets constructed
    pub construction: ConstructionPolicy,

    /// How the volume modifier maps onto the engine range
    pub volume_scaling: VolumeScaling,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Upper bound for waiting on an in-flight release before a new engine
    /// is constructed, in milliseconds
    pub release_timeout_ms: u64,
}

/// Engine construction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructionPolicy {
    /// Construct on the first source bind with an available surface
    Lazy,

    /// Construct as soon as the view is attached
    Eager,
}

/// Volume scaling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeScaling {
    /// Truncate the volume to an integer before scaling (`(int) volume * 200`)
    Truncating,

    /// Scale the fractional volume and round
    Linear,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_progress_interval_secs: 0.1,
            stall_threshold_percent: 30.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_options: vec!["-vvvv".to_string()],
            hardware_decoding: true,
            construction: ConstructionPolicy::Lazy,
            volume_scaling: VolumeScaling::Truncating,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            release_timeout_ms: 5000,
        }
    }
}

impl std::str::FromStr for VolumeScaling {
    type Err = PlayerViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "truncating" => Ok(VolumeScaling::Truncating),
            "linear" => Ok(VolumeScaling::Linear),
            other => Err(PlayerViewError::Config(format!(
                "Unknown volume scaling '{}'",
                other
            ))),
        }
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/playerview/config.toml on Linux)
    /// 3. User config file (~/.config/playerview/config.toml on Linux)
    /// 4. Environment variables (PLAYERVIEW_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config = Self::read_file(&system_path)?;
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config = Self::read_file(&user_path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| PlayerViewError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(log_level) = std::env::var("PLAYERVIEW_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        if let Ok(interval) = std::env::var("PLAYERVIEW_MIN_PROGRESS_INTERVAL") {
            self.playback.min_progress_interval_secs = interval
                .parse()
                .map_err(|_| PlayerViewError::Config("Invalid PLAYERVIEW_MIN_PROGRESS_INTERVAL".to_string()))?;
        }

        if let Ok(threshold) = std::env::var("PLAYERVIEW_STALL_THRESHOLD") {
            self.playback.stall_threshold_percent = threshold
                .parse()
                .map_err(|_| PlayerViewError::Config("Invalid PLAYERVIEW_STALL_THRESHOLD".to_string()))?;
        }

        if let Ok(scaling) = std::env::var("PLAYERVIEW_VOLUME_SCALING") {
            self.engine.volume_scaling = scaling.parse()?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.playback.min_progress_interval_secs >= 0.0) {
            return Err(PlayerViewError::Config(
                "min_progress_interval_secs must be non-negative".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.playback.stall_threshold_percent) {
            return Err(PlayerViewError::Config(
                "stall_threshold_percent must be between 0 and 100".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(PlayerViewError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level, valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/playerview/config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/playerview/config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("playerview").join("config.toml"))
    }
}
