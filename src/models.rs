//! Core data model for Thermowatch
//!
//! A `Reading` is one simulated sensor sample: a temperature value paired
//! with the wall-clock timestamp (whole seconds since the Unix epoch) at
//! which it was taken. Readings are persisted as a single text line
//! `<value>,<timestamp>` with the value rendered to exactly two decimals.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ThermowatchError, ThermowatchResult};

/// One simulated sensor sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature value in degrees Celsius
    pub value: f64,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl Reading {
    pub fn new(value: f64, timestamp: u64) -> Self {
        Self { value, timestamp }
    }

    /// Create a reading stamped with the current wall-clock time
    pub fn now(value: f64) -> Self {
        Self {
            value,
            timestamp: Utc::now().timestamp().max(0) as u64,
        }
    }

    /// Render the on-disk line, newline-terminated
    pub fn format_line(&self) -> String {
        format!("{:.2},{}\n", self.value, self.timestamp)
    }

    /// Parse a persisted reading line
    ///
    /// Accepts exactly two comma-separated fields. The `file` argument is
    /// only used for error context.
    pub fn parse_line(line: &str, file: &Path) -> ThermowatchResult<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return Err(ThermowatchError::EmptyReading {
                file: file.to_path_buf(),
            });
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            return Err(ThermowatchError::InvalidReading {
                file: file.to_path_buf(),
                message: format!("expected 2 comma-separated fields, got {}", fields.len()),
            });
        }

        let value: f64 = fields[0].trim().parse().map_err(|_| {
            ThermowatchError::InvalidReading {
                file: file.to_path_buf(),
                message: format!("invalid value '{}'", fields[0]),
            }
        })?;

        let timestamp: u64 = fields[1].trim().parse().map_err(|_| {
            ThermowatchError::InvalidReading {
                file: file.to_path_buf(),
                message: format!("invalid timestamp '{}'", fields[1]),
            }
        })?;

        Ok(Self { value, timestamp })
    }
}
