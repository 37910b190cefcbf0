//! Common test utilities for Thermowatch CLI tests.
//!
//! Provides `TestEnv` - an isolated temp directory plus helpers to run or
//! spawn the thermowatch binary against a readings file inside it.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;

/// Result of running a thermowatch CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Isolated test environment with a temp directory for the readings file.
pub struct TestEnv {
    pub dir: TempDir,
    bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
            bin: PathBuf::from(env!("CARGO_BIN_EXE_thermowatch")),
        }
    }

    /// Default readings file path inside the environment
    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join("temperature_data")
    }

    /// Path relative to the environment root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Run thermowatch to completion and capture output
    pub fn run(&self, args: &[&str]) -> TestResult {
        let output = Command::new(&self.bin)
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("failed to run thermowatch");

        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Spawn a long-running thermowatch command with piped output
    pub fn spawn(&self, args: &[&str]) -> Child {
        Command::new(&self.bin)
            .args(args)
            .current_dir(self.dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn thermowatch")
    }
}

/// Parse a readings file line into (value, timestamp), asserting the
/// two-decimal wire format along the way.
pub fn parse_data_line(content: &str) -> (f64, u64) {
    assert!(
        content.ends_with('\n'),
        "reading line must be newline-terminated: {content:?}"
    );
    let line = content.trim_end();
    assert_eq!(
        content.lines().count(),
        1,
        "readings file must hold exactly one line: {content:?}"
    );

    let (value_str, ts_str) = line
        .split_once(',')
        .unwrap_or_else(|| panic!("expected <value>,<timestamp>, got {line:?}"));

    let decimals = value_str
        .split_once('.')
        .map(|(_, frac)| frac.len())
        .unwrap_or(0);
    assert_eq!(decimals, 2, "value must have exactly two decimals: {value_str:?}");

    (
        value_str.parse().expect("value parses as f64"),
        ts_str.parse().expect("timestamp parses as u64"),
    )
}

/// Kill a spawned child and collect its captured stdout.
pub fn kill_and_collect(mut child: Child) -> String {
    let _ = child.kill();
    let output = child.wait_with_output().expect("collect child output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Current wall-clock seconds since the epoch, for timestamp assertions.
pub fn now_epoch() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}
