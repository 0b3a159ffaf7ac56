// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Climawatch Driver CLI
//!
//! Host-side daemon for a multi-channel wireless climate/weather-station
//! logger.
//!
//! # Usage
//!
//! ```bash
//! # Stream current observations in text format
//! climawatchd --frequency eu
//!
//! # Stream as JSON lines, with verbose internal logging
//! climawatchd --format json --verbose
//!
//! # Load a saved configuration file
//! climawatchd --config /etc/climawatchd/config.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use climawatch_driver::config::Frequency;
use climawatch_driver::{Driver, DriverConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "climawatchd")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Host-side driver for a multi-channel wireless climate station logger")]
#[command(long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transceiver frequency band
    #[arg(long, value_enum)]
    frequency: Option<FrequencyArg>,

    /// 14-digit decimal serial of the dongle to open (default: first match)
    #[arg(long)]
    serial: Option<String>,

    /// Seconds between current-observation polls
    #[arg(long)]
    polling_interval: Option<u64>,

    /// Output format for emitted observations
    #[arg(short, long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Verbose mode (debug-level internal logs)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (warn-level internal logs only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FrequencyArg {
    Eu,
    Us,
}

impl From<FrequencyArg> for Frequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Eu => Frequency::Eu,
            FrequencyArg::Us => Frequency::Us,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("climawatch_driver=debug,climawatchd=debug")
    } else if cli.quiet {
        EnvFilter::new("climawatch_driver=warn,climawatchd=warn")
    } else {
        EnvFilter::new("climawatch_driver=info,climawatchd=info")
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let config = build_config(&cli).context("failed to build configuration")?;

    tracing::info!(
        frequency = ?config.transceiver_frequency,
        polling_interval = config.polling_interval_secs,
        format = ?cli.format,
        "starting climawatchd"
    );

    let mut driver = Driver::new(config);
    driver.start_up().context("failed to start driver")?;

    let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let r = running.clone();
    let _ = ctrlc::set_handler(move || {
        tracing::info!("received Ctrl+C, shutting down...");
        r.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    while running.load(std::sync::atomic::Ordering::SeqCst) {
        match driver.next_observation() {
            Ok(Some(obs)) => emit(&obs, cli.format),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "driver requested restart");
                break;
            }
        }
    }

    driver.shut_down();
    tracing::info!("climawatchd shutdown complete");
    Ok(())
}

fn build_config(cli: &Cli) -> Result<DriverConfig> {
    let mut config = match &cli.config {
        Some(path) => DriverConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => DriverConfig::default(),
    };

    if let Some(freq) = cli.frequency {
        config.transceiver_frequency = freq.into();
    }
    if let Some(serial) = &cli.serial {
        config.serial = Some(serial.clone());
    }
    if let Some(secs) = cli.polling_interval {
        config.polling_interval_secs = secs;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn emit(obs: &climawatch_driver::Observation, format: FormatArg) {
    match format {
        FormatArg::Text => {
            let mut fields: Vec<_> = obs.0.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let rendered = fields
                .iter()
                .map(|(k, v)| format!("{k}={v:.1}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{rendered}");
        }
        FormatArg::Json => {
            if let Ok(line) = serde_json::to_string(obs) {
                println!("{line}");
            }
        }
    }
}
