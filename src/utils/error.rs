//! Error types for playerview
//!
//! This module defines the error type used throughout the library.
//! We use thiserror for the library error type and anyhow for the
//! demo binary.

use thiserror::Error;

/// Main error type for playerview
#[derive(Error, Debug)]
pub enum PlayerViewError {
    /// Errors reported by a live engine
    #[error("Engine error: {0}")]
    Engine(String),

    /// The engine factory could not build an engine
    #[error("Engine construction failed: {0}")]
    EngineConstruction(String),

    /// Malformed property delivered by the host binding layer
    #[error("Invalid property '{name}': {reason}")]
    InvalidProperty { name: String, reason: String },

    /// Surface-related errors
    #[error("Surface error: {0}")]
    Surface(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerViewError {
    /// Create an invalid property error
    pub fn invalid_property<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        PlayerViewError::InvalidProperty {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results in playerview
pub type Result<T> = std::result::Result<T, PlayerViewError>;

/// Extension trait for converting other errors to PlayerViewError
pub trait IntoPlayerViewError<T> {
    /// Convert this error into a configuration error with the given context
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerViewError<T> for std::result::Result<T, E> {
    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerViewError::Config(format!("{}: {}", context, e)))
    }
}
