//! PID control loop over the readings file
//!
//! Implements the `control` command: block on filesystem notifications for
//! the readings file, parse the current reading on each change, and map the
//! PID output to heating/cooling actions. The controller only reads the
//! file; there is no self-write to filter.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::ControlConfig;
use crate::error::{ThermowatchError, ThermowatchResult};
use crate::sensor::read_reading;
use crate::watcher::{watch_root, TriggerState};

/// PID controller state
///
/// dt is derived from consecutive reading timestamps, floored at one
/// second: readings carry whole-second timestamps, so same-second updates
/// are common and must not divide by zero.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    prev_error: Option<f64>,
    prev_timestamp: Option<u64>,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: None,
            prev_timestamp: None,
        }
    }

    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(config.kp, config.ki, config.kd)
    }

    /// Feed one measurement, returning the raw control output
    pub fn update(&mut self, setpoint: f64, measured: f64, timestamp: u64) -> f64 {
        let error = setpoint - measured;
        let dt = self
            .prev_timestamp
            .map(|prev| timestamp.saturating_sub(prev).max(1))
            .unwrap_or(1) as f64;

        self.integral += error * dt;
        let derivative = self
            .prev_error
            .map(|prev| (error - prev) / dt)
            .unwrap_or(0.0);

        self.prev_error = Some(error);
        self.prev_timestamp = Some(timestamp);

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }
}

/// Concrete actions derived from one PID update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlAction {
    /// Heating drive, zero when the output is non-positive
    pub heating: f64,
    /// Cooling fan state
    pub cooling: bool,
}

impl ControlAction {
    pub fn from_output(output: f64, measured: f64, setpoint: f64, cooling_margin: f64) -> Self {
        Self {
            heating: output.max(0.0),
            cooling: measured > setpoint + cooling_margin,
        }
    }
}

/// Control loop options
#[derive(Debug, Clone)]
pub struct ControlOptions {
    /// Readings file to watch
    pub path: PathBuf,
    /// Controller gains, setpoint, and cooling margin
    pub control: ControlConfig,
    /// Output as NDJSON
    pub json: bool,
}

/// Raw notifications bridged from the notify backend thread
enum WatchMessage {
    Changed(PathBuf),
    Failed(String),
}

/// Control event types for NDJSON output
#[derive(Debug, Clone)]
pub enum ControlEvent {
    Started { path: String, setpoint: f64 },
    Decision { value: f64, output: f64, heating: f64, cooling: bool },
    SkippedReading { message: String },
    Error { message: String },
    Shutdown,
}

impl ControlEvent {
    pub fn to_json(&self) -> String {
        match self {
            ControlEvent::Started { path, setpoint } => {
                format!(
                    r#"{{"event":"started","path":"{}","setpoint":{:.2}}}"#,
                    path, setpoint
                )
            }
            ControlEvent::Decision {
                value,
                output,
                heating,
                cooling,
            } => {
                format!(
                    r#"{{"event":"decision","value":{:.2},"output":{:.2},"heating":{:.2},"cooling":{}}}"#,
                    value, output, heating, cooling
                )
            }
            ControlEvent::SkippedReading { message } => {
                format!(
                    r#"{{"event":"skipped_reading","message":"{}"}}"#,
                    message.replace('"', "\\\"")
                )
            }
            ControlEvent::Error { message } => {
                format!(
                    r#"{{"event":"error","message":"{}"}}"#,
                    message.replace('"', "\\\"")
                )
            }
            ControlEvent::Shutdown => r#"{"event":"shutdown"}"#.to_string(),
        }
    }
}

/// Start the control loop
///
/// The readings file does not need to exist yet; creation counts as the
/// first modification. Unreadable or malformed readings are reported and
/// skipped, and the loop keeps waiting.
pub fn control(
    options: ControlOptions,
    running: Arc<AtomicBool>,
    event_callback: impl Fn(ControlEvent),
) -> ThermowatchResult<()> {
    let watch_dir = watch_root(&options.path)?;
    let file_name = options
        .path
        .file_name()
        .ok_or_else(|| ThermowatchError::WatchSetup {
            path: options.path.clone(),
            message: "path has no file name".to_string(),
        })?
        .to_os_string();

    event_callback(ControlEvent::Started {
        path: options.path.display().to_string(),
        setpoint: options.control.setpoint,
    });

    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    for path in event.paths {
                        let _ = tx.send(WatchMessage::Changed(path));
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(WatchMessage::Failed(e.to_string()));
            }
        },
        Config::default(),
    )
    .map_err(|e| ThermowatchError::WatchSetup {
        path: options.path.clone(),
        message: e.to_string(),
    })?;

    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .map_err(|e| ThermowatchError::WatchSetup {
            path: options.path.clone(),
            message: e.to_string(),
        })?;

    let mut pid = Pid::from_config(&options.control);
    let mut state = TriggerState::new();

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(WatchMessage::Changed(path)) => {
                if path.file_name() == Some(file_name.as_os_str()) {
                    state.add_trigger();
                }
            }
            Ok(WatchMessage::Failed(message)) => {
                event_callback(ControlEvent::Error { message });
            }
            Err(_) => {}
        }

        if state.should_react() {
            state.take();
            match read_reading(&options.path) {
                Ok(reading) => {
                    let output =
                        pid.update(options.control.setpoint, reading.value, reading.timestamp);
                    let action = ControlAction::from_output(
                        output,
                        reading.value,
                        options.control.setpoint,
                        options.control.cooling_margin,
                    );
                    event_callback(ControlEvent::Decision {
                        value: reading.value,
                        output,
                        heating: action.heating,
                        cooling: action.cooling,
                    });
                }
                Err(e) => {
                    event_callback(ControlEvent::SkippedReading {
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    event_callback(ControlEvent::Shutdown);
    Ok(())
}
