//! Configuration module for Thermowatch
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (THERMOWATCH_*)
//! 3. Project config (./thermowatch.toml)
//! 4. User config (~/.config/thermowatch/config.toml)
//! 5. Built-in defaults (lowest priority)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ThermowatchError, ThermowatchResult};

/// Default location of the readings file
pub const DEFAULT_SENSOR_PATH: &str = "/tmp/temperature_data";

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// File that holds the current reading and carries the watch
    #[serde(default = "default_sensor_path")]
    pub path: PathBuf,

    /// Lower bound of the simulated range (inclusive)
    #[serde(default = "default_min")]
    pub min: f64,

    /// Upper bound of the simulated range (exclusive)
    #[serde(default = "default_max")]
    pub max: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            path: default_sensor_path(),
            min: default_min(),
            max: default_max(),
        }
    }
}

fn default_sensor_path() -> PathBuf {
    PathBuf::from(DEFAULT_SENSOR_PATH)
}

fn default_min() -> f64 {
    36.5
}

fn default_max() -> f64 {
    37.5
}

/// PID controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_kp")]
    pub kp: f64,

    #[serde(default)]
    pub ki: f64,

    #[serde(default)]
    pub kd: f64,

    /// Target temperature for the control loop
    #[serde(default = "default_setpoint")]
    pub setpoint: f64,

    /// Fan turns on when the reading exceeds setpoint by this margin
    #[serde(default = "default_cooling_margin")]
    pub cooling_margin: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki: 0.0,
            kd: 0.0,
            setpoint: default_setpoint(),
            cooling_margin: default_cooling_margin(),
        }
    }
}

fn default_kp() -> f64 {
    2.0
}

fn default_setpoint() -> f64 {
    37.0
}

fn default_cooling_margin() -> f64 {
    0.5
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub verbosity: Verbosity,
}

/// Verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> ThermowatchResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> ThermowatchResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            unknown_paths.push(path.to_string());
        })
        .map_err(|e| ThermowatchError::InvalidConfig {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;

        let warnings = unknown_paths
            .into_iter()
            .map(|path_str| {
                let key = path_str
                    .split('.')
                    .next_back()
                    .unwrap_or(path_str.as_str())
                    .to_string();
                ConfigWarning {
                    key: key.clone(),
                    file: path.to_path_buf(),
                    line: find_line_number(&content, &key),
                    suggestion: suggest_key(&key),
                }
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load from the project config, user config, or defaults
    ///
    /// Discovery is best-effort: a broken discovered file falls back to the
    /// next layer. An explicitly requested file goes through `load` instead,
    /// where failures are fatal.
    pub fn load_or_default() -> Self {
        let project_config = Path::new("thermowatch.toml");
        if project_config.exists() {
            if let Ok(config) = Self::load(project_config) {
                return config.with_env_overrides();
            }
        }

        if let Some(user_config_dir) = dirs::config_dir() {
            let user_config = user_config_dir.join("thermowatch/config.toml");
            if user_config.exists() {
                if let Ok(config) = Self::load(&user_config) {
                    return config.with_env_overrides();
                }
            }
        }

        Self::default().with_env_overrides()
    }

    /// Apply environment variable overrides (THERMOWATCH_* prefix)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("THERMOWATCH_PATH") {
            if !path.is_empty() {
                self.sensor.path = PathBuf::from(path);
            }
        }

        if let Ok(setpoint) = std::env::var("THERMOWATCH_SETPOINT") {
            if let Ok(parsed) = setpoint.parse() {
                self.control.setpoint = parsed;
            }
        }

        if let Ok(verbosity) = std::env::var("THERMOWATCH_VERBOSITY") {
            self.output.verbosity = match verbosity.to_lowercase().as_str() {
                "quiet" => Verbosity::Quiet,
                "verbose" => Verbosity::Verbose,
                _ => Verbosity::Normal,
            };
        }

        self
    }

    /// Reject configurations the simulator cannot run with
    pub fn validate(&self) -> ThermowatchResult<()> {
        if self.sensor.min >= self.sensor.max {
            return Err(ThermowatchError::InvalidRange {
                min: self.sensor.min,
                max: self.sensor.max,
            });
        }
        Ok(())
    }
}

/// Best-effort line lookup for a key in the raw TOML content
fn find_line_number(content: &str, key: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| {
            line.trim_start()
                .strip_prefix(key)
                .map(|rest| rest.trim_start().starts_with('='))
                .unwrap_or(false)
        })
        .map(|idx| idx + 1)
}

/// Suggest a known key for a likely typo
fn suggest_key(key: &str) -> Option<String> {
    const KNOWN: &[&str] = &[
        "path",
        "min",
        "max",
        "kp",
        "ki",
        "kd",
        "setpoint",
        "cooling_margin",
        "verbosity",
    ];

    let lower = key.to_lowercase();
    KNOWN
        .iter()
        .find(|known| {
            known.starts_with(&lower) || lower.starts_with(**known)
        })
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sensor.path, PathBuf::from(DEFAULT_SENSOR_PATH));
        assert_eq!(config.sensor.min, 36.5);
        assert_eq!(config.sensor.max, 37.5);
        assert_eq!(config.control.setpoint, 37.0);
        assert_eq!(config.output.verbosity, Verbosity::Normal);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thermowatch.toml");
        fs::write(&path, "[sensor]\npath = \"/tmp/custom\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.sensor.path, PathBuf::from("/tmp/custom"));
        assert_eq!(config.sensor.min, 36.5);
        assert_eq!(config.control.kp, 2.0);
    }

    #[test]
    fn test_load_unknown_key_warns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thermowatch.toml");
        fs::write(&path, "[sensor]\npaht = \"/tmp/custom\"\n").unwrap();

        let (_, warnings) = Config::load_with_warnings(&path).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "paht");
        assert_eq!(warnings[0].line, Some(2));
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thermowatch.toml");
        fs::write(&path, "[sensor\npath = 3\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thermowatch.toml");
        fs::write(&path, "[sensor]\nmin = 40.0\nmax = 36.0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ThermowatchError::InvalidRange { min, max } if min == 40.0 && max == 36.0
        ));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let err = Config::load(Path::new("/nonexistent/thermowatch.toml")).unwrap_err();
        assert!(matches!(err, ThermowatchError::Io(_)));
    }

    #[test]
    fn test_suggest_key_for_truncated_name() {
        assert_eq!(suggest_key("setpoin"), Some("setpoint".to_string()));
        assert_eq!(suggest_key("zzz"), None);
    }

    #[test]
    fn test_find_line_number() {
        let content = "[sensor]\nmin = 36.0\nmax = 37.0\n";
        assert_eq!(find_line_number(content, "max"), Some(3));
        assert_eq!(find_line_number(content, "absent"), None);
    }
}
