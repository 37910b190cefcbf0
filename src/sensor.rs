//! Simulated temperature sensor and readings file IO
//!
//! The simulator draws uniformly from a half-open `[min, max)` range and
//! truncates to hundredths so the rendered two-decimal value stays inside
//! the range. The readings file is fully rewritten on every update; a
//! reading never appends.

use std::fs;
use std::path::Path;

use rand::RngExt;

use crate::config::SensorConfig;
use crate::error::{ThermowatchError, ThermowatchResult};
use crate::models::Reading;

/// Pseudo-random temperature source
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    min: f64,
    max: f64,
}

impl SensorSimulator {
    pub fn new(min: f64, max: f64) -> ThermowatchResult<Self> {
        if min >= max {
            return Err(ThermowatchError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn from_config(config: &SensorConfig) -> ThermowatchResult<Self> {
        Self::new(config.min, config.max)
    }

    /// Take one sample, stamped with the current wall-clock time
    pub fn sample(&self) -> Reading {
        let raw = rand::rng().random_range(self.min..self.max);
        // Truncate to hundredths so the two-decimal rendering stays < max;
        // clamp because flooring can undershoot a min that is not on the
        // hundredths grid
        let value = ((raw * 100.0).floor() / 100.0).max(self.min);
        Reading::now(value)
    }
}

/// Overwrite the readings file with a single formatted line
///
/// Truncates any prior contents; a shorter reading never leaves trailing
/// garbage from a longer one.
pub fn write_reading(path: &Path, reading: &Reading) -> ThermowatchResult<()> {
    fs::write(path, reading.format_line())?;
    Ok(())
}

/// Read and parse the current reading from the file
pub fn read_reading(path: &Path) -> ThermowatchResult<Reading> {
    let content = fs::read_to_string(path)?;
    Reading::parse_line(&content, path)
}
