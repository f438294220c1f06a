//! Error types for the anomaly detection engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for anomaly detection operations
#[derive(Debug, Error)]
pub enum Error {
    /// Not enough usable samples for the requested detector
    #[error(
        "Insufficient data for {detector}: at least {required} valid points required, got {actual}"
    )]
    InsufficientData {
        detector: &'static str,
        required: usize,
        actual: usize,
    },

    /// Invalid thresholds, window sizes or method names
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an insufficient-data error
    pub fn insufficient(detector: &'static str, required: usize, actual: usize) -> Self {
        Error::InsufficientData {
            detector,
            required,
            actual,
        }
    }

    /// Creates an invalid-configuration error
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration(message.into())
    }

    /// Returns true when the caller can degrade gracefully (e.g. skip annotation
    /// for a short time range) instead of failing.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Error::InsufficientData { .. })
    }

    /// Minimum sample count named by an insufficient-data error
    pub fn required_points(&self) -> Option<usize> {
        match self {
            Error::InsufficientData { required, .. } => Some(*required),
            _ => None,
        }
    }
}
