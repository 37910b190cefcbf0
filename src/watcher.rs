//! File watcher and reactor loop
//!
//! Implements the `run` command with:
//! - Debouncing (100ms)
//! - Self-write suppression
//! - Graceful Ctrl+C shutdown
//! - NDJSON output for scripting
//!
//! The loop blocks on filesystem notifications for the readings file and
//! reacts to each external modification by recording a fresh reading. The
//! recorder's own overwrite is stamped and filtered so the loop does not
//! re-trigger itself.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{ThermowatchError, ThermowatchResult};
use crate::sensor::{write_reading, SensorSimulator};

/// Debounce duration in milliseconds
const DEBOUNCE_MS: u64 = 100;

/// Events arriving this soon after our own write are treated as echoes
const SELF_WRITE_WINDOW_MS: u64 = 200;

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Readings file to watch and rewrite
    pub path: PathBuf,
    /// Output as NDJSON
    pub json: bool,
}

/// Raw notifications bridged from the notify backend thread
enum WatchMessage {
    Changed(PathBuf),
    Failed(String),
}

/// Watch event types for NDJSON output
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Started { path: String },
    Updated { value: f64, timestamp: u64 },
    UpdateSkipped { message: String },
    Error { message: String },
    Shutdown,
}

impl WatchEvent {
    pub fn to_json(&self) -> String {
        match self {
            WatchEvent::Started { path } => {
                format!(r#"{{"event":"started","path":"{}"}}"#, path)
            }
            WatchEvent::Updated { value, timestamp } => {
                format!(
                    r#"{{"event":"updated","value":{:.2},"timestamp":{}}}"#,
                    value, timestamp
                )
            }
            WatchEvent::UpdateSkipped { message } => {
                format!(
                    r#"{{"event":"update_skipped","message":"{}"}}"#,
                    message.replace('"', "\\\"")
                )
            }
            WatchEvent::Error { message } => {
                format!(r#"{{"event":"error","message":"{}"}}"#, message.replace('"', "\\\""))
            }
            WatchEvent::Shutdown => r#"{"event":"shutdown"}"#.to_string(),
        }
    }
}

/// Trigger state for debouncing
///
/// Multiple notify events for one logical modification collapse into a
/// single reaction once the debounce window has passed.
pub(crate) struct TriggerState {
    pending: bool,
    last_event: Option<Instant>,
}

impl TriggerState {
    pub(crate) fn new() -> Self {
        Self {
            pending: false,
            last_event: None,
        }
    }

    pub(crate) fn add_trigger(&mut self) {
        self.pending = true;
        self.last_event = Some(Instant::now());
    }

    pub(crate) fn should_react(&self) -> bool {
        match self.last_event {
            Some(last) => self.pending && last.elapsed() >= Duration::from_millis(DEBOUNCE_MS),
            None => false,
        }
    }

    pub(crate) fn take(&mut self) {
        self.pending = false;
        self.last_event = None;
    }
}

/// Stamp-and-check filter for the recorder's own writes
///
/// The loop rewrites the very file it watches; without this filter every
/// update would feed the next and the loop would spin unprompted.
pub struct SelfWriteFilter {
    last_write: Option<Instant>,
    window: Duration,
}

impl SelfWriteFilter {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(SELF_WRITE_WINDOW_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            last_write: None,
            window,
        }
    }

    /// Stamp an own write; events inside the window are echoes of it
    pub fn record(&mut self) {
        self.last_write = Some(Instant::now());
    }

    /// True when an event should be dropped as an echo of an own write
    pub fn suppresses(&self) -> bool {
        self.last_write
            .map(|t| t.elapsed() < self.window)
            .unwrap_or(false)
    }
}

impl Default for SelfWriteFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the reactor loop
///
/// Writes an initial reading so the file exists with valid content, then
/// blocks on filesystem notifications until `running` clears. Watch
/// registration failures are fatal; per-update write failures are reported
/// through the callback and the loop continues.
pub fn watch(
    options: WatchOptions,
    sensor: SensorSimulator,
    running: Arc<AtomicBool>,
    event_callback: impl Fn(WatchEvent),
) -> ThermowatchResult<()> {
    let mut filter = SelfWriteFilter::new();

    // Initial reading, before the watch is registered
    let initial = sensor.sample();
    filter.record();
    write_reading(&options.path, &initial)?;

    event_callback(WatchEvent::Started {
        path: options.path.display().to_string(),
    });

    // Watch the parent directory and filter by file name, so external
    // rename-replace writes don't silently drop the watch.
    let watch_dir = watch_root(&options.path)?;
    let target = options.path.canonicalize()?;

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

    // Reactor loop with debouncing
    let mut state = TriggerState::new();

    while running.load(Ordering::SeqCst) {
        // Check for notifications (non-blocking with timeout)
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(WatchMessage::Changed(path)) => {
                if is_target(&path, &target) && !filter.suppresses() {
                    state.add_trigger();
                }
            }
            Ok(WatchMessage::Failed(message)) => {
                event_callback(WatchEvent::Error { message });
            }
            Err(_) => {}
        }

        // React once per debounced trigger
        if state.should_react() {
            state.take();
            react(&options.path, &sensor, &mut filter, &event_callback);
        }
    }

    event_callback(WatchEvent::Shutdown);
    Ok(())
}

/// One reaction: take a reading, rewrite the file, report the outcome
fn react(
    path: &Path,
    sensor: &SensorSimulator,
    filter: &mut SelfWriteFilter,
    event_callback: &impl Fn(WatchEvent),
) {
    let reading = sensor.sample();
    filter.record();
    match write_reading(path, &reading) {
        Ok(()) => {
            event_callback(WatchEvent::Updated {
                value: reading.value,
                timestamp: reading.timestamp,
            });
        }
        Err(e) => {
            // Dropped update, not fatal
            event_callback(WatchEvent::UpdateSkipped {
                message: e.to_string(),
            });
        }
    }
}

/// Resolve the directory whose events cover the readings file
pub(crate) fn watch_root(path: &Path) -> ThermowatchResult<PathBuf> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = match parent {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from("."),
    };
    dir.canonicalize().map_err(|e| ThermowatchError::WatchSetup {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Compare a notification path against the watched file
fn is_target(event_path: &Path, target: &Path) -> bool {
    if event_path == target {
        return true;
    }
    // Symlinked temp dirs (e.g. /tmp on macOS) report unresolved paths
    event_path
        .canonicalize()
        .map(|p| p == target)
        .unwrap_or(false)
}
