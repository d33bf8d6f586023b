//! scanlog - ID scan capture for keyboard-emulating USB readers
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────┐        ┌──────────────────────────┐
//! │  Capture (main thread)    │        │  Dispatcher (thread)     │
//! │  evdev grab │ stdin lines │ queue  │  local log  (fatal)      │
//! │        ↓                  │ ─────→ │  Sheets     (best effort)│
//! │  line assembly → Scan     │  128   │  webhook    (best effort)│
//! └───────────────────────────┘        └──────────────────────────┘
//! ```

mod capture;
mod config;
mod constants;
mod dispatch;
mod pipeline;
mod scan;
mod sinks;

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::path::PathBuf;

use capture::{Capture, CaptureError};
use config::{CaptureMode, Config};
use dispatch::{DispatchError, FatalHook};
use pipeline::Pipeline;

/// Print help message
fn print_help() {
    println!(
        r#"scanlog {} - record ID scans from a USB reader

USAGE:
    scanlog [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -c, --config <PATH>     Use this config file
    --stdin                 Read newline-terminated IDs from stdin
    --device <PATH>         Grab this evdev device (symlinks allowed)
    --check                 Validate the configuration and exit
    --init-config[=PATH]    Write a default config file
    -f, --force             Overwrite config file with --init-config

CONFIG FILE (first found):
    --config <PATH>
    $SCANLOG_CONFIG
    ~/.config/scanlog/config.toml
    /etc/scanlog/config.toml

EXAMPLES:
    sudo scanlog --device /dev/input/by-id/usb-Reader-event-kbd
    printf '12345\n' | scanlog --stdin
    scanlog --init-config
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Value of `--flag <v>` or `--flag=<v>`
fn flag_value(args: &[String], names: &[&str]) -> Option<String> {
    for (i, arg) in args.iter().enumerate() {
        for name in names {
            if arg == name {
                return args.get(i + 1).cloned();
            }
            if let Some(value) = arg.strip_prefix(&format!("{}=", name)) {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn has_flag(args: &[String], names: &[&str]) -> bool {
    args.iter().any(|a| names.contains(&a.as_str()))
}

/// Resolve configuration: explicit file (errors are fatal) or layered lookup
fn load_config(args: &[String]) -> Result<Config> {
    let mut config = match flag_value(args, &["--config", "-c"]) {
        Some(path) => Config::load_from_file(&PathBuf::from(path))?,
        None => Config::load(),
    };

    if has_flag(args, &["--stdin"]) {
        config.capture.mode = CaptureMode::Stdin;
    }
    if let Some(device) = flag_value(args, &["--device"]) {
        config.capture.mode = CaptureMode::Device;
        config.capture.device_path = device;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Exit the whole process when the local log cannot be written
fn exit_on_fatal() -> FatalHook {
    Box::new(|e: &DispatchError| {
        error!("Fatal: {}", e);
        let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
        std::process::exit(1);
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Check command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();

    // --help
    if has_flag(&args, &["--help", "-h"]) {
        print_help();
        return Ok(());
    }

    // --version
    if has_flag(&args, &["--version", "-V"]) {
        println!("scanlog {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Config file generation mode
    if let Some(arg) = args.iter().find(|a| a.starts_with("--init-config")) {
        let path = match arg.split_once('=') {
            Some((_, p)) => PathBuf::from(p),
            None => config::default_config_path()
                .context("Cannot determine config directory; pass --init-config=PATH")?,
        };
        let force = has_flag(&args, &["--force", "-f"]);
        Config::write_default_config(&path, force)?;
        println!("Config file created: {}", path.display());
        return Ok(());
    }

    info!("scanlog {} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;

    if has_flag(&args, &["--check"]) {
        println!("[OK] configuration valid");
        return Ok(());
    }

    let sinks = sinks::from_config(&config)?;

    // Exclusive grab happens here; no retry
    let source = capture::open_source(&config.capture).context("Cannot open capture source")?;

    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);

    let report = Pipeline::new(sinks, config.capture.queue_capacity)
        .on_fatal(exit_on_fatal())
        .run(Capture::new(source))?;

    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
    info!(
        "Stopped: {} scans captured, {} dispatched, {} remote failures",
        report.captured, report.dispatched.scans, report.dispatched.sink_failures
    );

    match report.capture_end {
        // Piped input running out is a normal end in stdin mode
        Some(CaptureError::Exhausted) if config.capture.mode == CaptureMode::Stdin => Ok(()),
        Some(e) => Err(e).context("Capture ended"),
        None => {
            warn!("Dispatcher stopped before capture ended");
            Ok(())
        }
    }
}
