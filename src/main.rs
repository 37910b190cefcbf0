//! Thermowatch CLI - simulated temperature sensor and controller
//!
//! Usage: thermowatch <COMMAND>
//!
//! Commands:
//!   run      Watch the readings file and record on each external change
//!   record   Take one reading and write it immediately
//!   read     Parse and display the current reading
//!   control  Run the PID control loop over the readings file

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use thermowatch::config::Config;
use thermowatch::control::{ControlEvent, ControlOptions};
use thermowatch::sensor::SensorSimulator;
use thermowatch::watcher::{WatchEvent, WatchOptions};

/// Thermowatch - simulated temperature sensor and controller
#[derive(Parser, Debug)]
#[command(name = "thermowatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output events as NDJSON
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the readings file and record on each external change
    Run {
        /// Readings file (overrides configuration)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Take one reading and write it immediately
    Record {
        /// Readings file (overrides configuration)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Parse and display the current reading
    Read {
        /// Readings file (overrides configuration)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Run the PID control loop over the readings file
    Control {
        /// Readings file (overrides configuration)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Target temperature (overrides configuration)
        #[arg(long)]
        setpoint: Option<f64>,

        /// Proportional gain (overrides configuration)
        #[arg(long)]
        kp: Option<f64>,

        /// Integral gain (overrides configuration)
        #[arg(long)]
        ki: Option<f64>,

        /// Derivative gain (overrides configuration)
        #[arg(long)]
        kd: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => {
            // An explicitly requested config must load; discovery may not
            let (config, warnings) = Config::load_with_warnings(path)?;
            for warning in &warnings {
                match warning.line {
                    Some(line) => eprintln!(
                        "⚠ Unknown configuration key '{}' in {}:{}",
                        warning.key,
                        warning.file.display(),
                        line
                    ),
                    None => eprintln!(
                        "⚠ Unknown configuration key '{}' in {}",
                        warning.key,
                        warning.file.display()
                    ),
                }
                if let Some(suggestion) = &warning.suggestion {
                    eprintln!("    ↳ Did you mean '{}'?", suggestion);
                }
            }
            config.with_env_overrides()
        }
        None => Config::load_or_default(),
    };
    if cli.verbose > 0 {
        config.output.verbosity = thermowatch::Verbosity::Verbose;
    }

    match cli.command {
        Commands::Run { path } => cmd_run(config, path, cli.json),
        Commands::Record { path } => cmd_record(config, path, cli.json),
        Commands::Read { path } => cmd_read(config, path, cli.json),
        Commands::Control {
            path,
            setpoint,
            kp,
            ki,
            kd,
        } => cmd_control(config, path, setpoint, kp, ki, kd, cli.json),
    }
}

fn cmd_run(mut config: Config, path: Option<PathBuf>, json: bool) -> Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    if let Some(path) = path {
        config.sensor.path = path;
    }
    config.validate()?;

    let sensor = SensorSimulator::from_config(&config.sensor)?;
    let verbose = config.output.verbosity == thermowatch::Verbosity::Verbose;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })?;

    if !json {
        println!("🌡 Thermowatch");
        if verbose {
            println!(
                "Range: [{:.2}, {:.2})",
                config.sensor.min, config.sensor.max
            );
        }
        println!("Press Ctrl+C to stop\n");
    }

    let options = WatchOptions {
        path: config.sensor.path.clone(),
        json,
    };

    thermowatch::watcher::watch(options, sensor, running, |event| {
        if json {
            println!("{}", event.to_json());
        } else {
            match event {
                WatchEvent::Started { path } => {
                    println!("👀 Watching: {}", path);
                    println!("Waiting for temperature updates...");
                }
                WatchEvent::Updated { value, .. } => {
                    println!("Updated temperature: {:.2}", value);
                }
                WatchEvent::UpdateSkipped { message } => {
                    eprintln!("⚠ Update skipped: {}", message);
                }
                WatchEvent::Error { message } => {
                    eprintln!("✗ Error: {}", message);
                }
                WatchEvent::Shutdown => {
                    println!("\n👋 Shutting down...");
                }
            }
        }
    })?;

    Ok(())
}

fn cmd_record(mut config: Config, path: Option<PathBuf>, json: bool) -> Result<()> {
    if let Some(path) = path {
        config.sensor.path = path;
    }
    config.validate()?;

    let sensor = SensorSimulator::from_config(&config.sensor)?;
    let reading = sensor.sample();
    thermowatch::sensor::write_reading(&config.sensor.path, &reading)?;

    if json {
        let output = serde_json::json!({
            "event": "recorded",
            "value": reading.value,
            "timestamp": reading.timestamp,
            "path": config.sensor.path.display().to_string(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "✓ Recorded {:.2} at {} to {}",
            reading.value,
            reading.timestamp,
            config.sensor.path.display()
        );
    }

    Ok(())
}

fn cmd_read(mut config: Config, path: Option<PathBuf>, json: bool) -> Result<()> {
    if let Some(path) = path {
        config.sensor.path = path;
    }

    let reading = thermowatch::sensor::read_reading(&config.sensor.path)?;

    if json {
        let output = serde_json::json!({
            "event": "reading",
            "value": reading.value,
            "timestamp": reading.timestamp,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("🌡 {:.2} (recorded at {})", reading.value, reading.timestamp);
    }

    Ok(())
}

fn cmd_control(
    mut config: Config,
    path: Option<PathBuf>,
    setpoint: Option<f64>,
    kp: Option<f64>,
    ki: Option<f64>,
    kd: Option<f64>,
    json: bool,
) -> Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    if let Some(path) = path {
        config.sensor.path = path;
    }

    let overridden = setpoint.is_some() || kp.is_some() || ki.is_some() || kd.is_some();
    if let Some(setpoint) = setpoint {
        config.control.setpoint = setpoint;
    }
    if let Some(kp) = kp {
        config.control.kp = kp;
    }
    if let Some(ki) = ki {
        config.control.ki = ki;
    }
    if let Some(kd) = kd {
        config.control.kd = kd;
    }

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })?;

    if !json {
        println!("🎛 Thermowatch Control");
        if overridden {
            println!(
                "PID parameters overridden: kp={} ki={} kd={} setpoint={}",
                config.control.kp, config.control.ki, config.control.kd, config.control.setpoint
            );
        }
        println!("Press Ctrl+C to stop\n");
    }

    let options = ControlOptions {
        path: config.sensor.path.clone(),
        control: config.control.clone(),
        json,
    };

    thermowatch::control::control(options, running, |event| {
        if json {
            println!("{}", event.to_json());
        } else {
            match event {
                ControlEvent::Started { path, setpoint } => {
                    println!("👀 Watching: {}", path);
                    println!("Holding setpoint {:.2}\n", setpoint);
                }
                ControlEvent::Decision {
                    value,
                    heating,
                    cooling,
                    ..
                } => {
                    println!("Reading {:.2}", value);
                    if heating > 0.0 {
                        println!("  🔥 Heating output: {:.2}", heating);
                    } else {
                        println!("  🔥 Heating off");
                    }
                    if cooling {
                        println!("  🌀 Fan on");
                    } else {
                        println!("  🌀 Fan off");
                    }
                }
                ControlEvent::SkippedReading { message } => {
                    eprintln!("⚠ Skipped reading: {}", message);
                }
                ControlEvent::Error { message } => {
                    eprintln!("✗ Error: {}", message);
                }
                ControlEvent::Shutdown => {
                    println!("\n👋 Shutting down...");
                }
            }
        }
    })?;

    Ok(())
}
