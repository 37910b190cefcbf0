//! Error types for Thermowatch
//!
//! Uses `thiserror` for library errors. Setup failures are fatal and
//! surfaced with exit status 1; update failures are logged and the
//! reactor loop keeps running.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Thermowatch operations
pub type ThermowatchResult<T> = Result<T, ThermowatchError>;

/// Main error type for Thermowatch operations
#[derive(Error, Debug)]
pub enum ThermowatchError {
    /// Could not register the filesystem watch (fatal)
    #[error("failed to watch {path}: {message}")]
    WatchSetup { path: PathBuf, message: String },

    /// Reading line does not match `<value>,<timestamp>`
    #[error("invalid reading in {file}: {message}")]
    InvalidReading { file: PathBuf, message: String },

    /// Readings file exists but contains no data
    #[error("no reading found in {file}")]
    EmptyReading { file: PathBuf },

    /// Invalid TOML configuration
    #[error("invalid configuration in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Sensor range is empty or inverted
    #[error("invalid sensor range: min {min} must be below max {max}")]
    InvalidRange { min: f64, max: f64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
