//! Thermowatch - simulated temperature sensor with an event-driven reactor loop
//!
//! Thermowatch writes pseudo-random temperature readings to a file and
//! blocks on filesystem notifications for that file, reacting to each
//! external modification. A PID control loop can consume the readings and
//! derive heating/cooling actions.

pub mod config;
pub mod control;
pub mod error;
pub mod models;
pub mod sensor;
pub mod watcher;

// Re-exports for convenience
pub use config::{Config, ControlConfig, SensorConfig, Verbosity};
pub use control::{control, ControlAction, ControlEvent, ControlOptions, Pid};
pub use error::{ThermowatchError, ThermowatchResult};
pub use models::Reading;
pub use sensor::{read_reading, write_reading, SensorSimulator};
pub use watcher::{watch, SelfWriteFilter, WatchEvent, WatchOptions};
