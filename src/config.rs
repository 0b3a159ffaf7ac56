// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Driver configuration.
//!
//! Supports both programmatic and file-based configuration, mirroring
//! this codebase's router configuration loader.

use crate::transceiver::{FREQ_EU_HZ, FREQ_US_HZ};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Eu,
    Us,
}

impl Frequency {
    pub fn hz(self) -> u64 {
        match self {
            Self::Eu => FREQ_EU_HZ,
            Self::Us => FREQ_US_HZ,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_frequency")]
    pub transceiver_frequency: Frequency,

    #[serde(default = "default_polling_interval_secs")]
    pub polling_interval_secs: u64,

    #[serde(default = "default_comm_interval")]
    pub comm_interval: u8,

    #[serde(default = "default_logger_channel")]
    pub logger_channel: u8,

    #[serde(default)]
    pub serial: Option<String>,

    #[serde(default)]
    pub sensor_map: Option<HashMap<String, String>>,

    #[serde(default)]
    pub sensor_text: [Option<String>; 8],

    #[serde(default = "default_max_history_records")]
    pub max_history_records: u32,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_timing_ms")]
    pub timing_ms: u64,

    #[serde(default = "default_log_interval_secs")]
    pub log_interval_secs: u64,
}

fn default_frequency() -> Frequency {
    Frequency::Eu
}
fn default_polling_interval_secs() -> u64 {
    10
}
fn default_comm_interval() -> u8 {
    8
}
fn default_logger_channel() -> u8 {
    1
}
fn default_max_history_records() -> u32 {
    51_200
}
fn default_batch_size() -> u32 {
    1_800
}
fn default_timing_ms() -> u64 {
    300
}
fn default_log_interval_secs() -> u64 {
    600
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            transceiver_frequency: default_frequency(),
            polling_interval_secs: default_polling_interval_secs(),
            comm_interval: default_comm_interval(),
            logger_channel: default_logger_channel(),
            serial: None,
            sensor_map: None,
            sensor_text: Default::default(),
            max_history_records: default_max_history_records(),
            batch_size: default_batch_size(),
            timing_ms: default_timing_ms(),
            log_interval_secs: default_log_interval_secs(),
        }
    }
}

impl DriverConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".into()));
        }
        if self.max_history_records == 0 || self.max_history_records > 51_200 {
            return Err(ConfigError::Invalid(
                "max_history_records must be in 1..=51200".into(),
            ));
        }
        if self.logger_channel == 0 {
            return Err(ConfigError::Invalid("logger_channel must be >= 1".into()));
        }
        Ok(())
    }

    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct DriverConfigBuilder {
    config: OptionalFields,
}

#[derive(Debug, Default)]
struct OptionalFields {
    transceiver_frequency: Option<Frequency>,
    polling_interval_secs: Option<u64>,
    comm_interval: Option<u8>,
    logger_channel: Option<u8>,
    serial: Option<String>,
    batch_size: Option<u32>,
}

impl DriverConfigBuilder {
    pub fn frequency(mut self, f: Frequency) -> Self {
        self.config.transceiver_frequency = Some(f);
        self
    }

    pub fn polling_interval_secs(mut self, secs: u64) -> Self {
        self.config.polling_interval_secs = Some(secs);
        self
    }

    pub fn comm_interval(mut self, secs: u8) -> Self {
        self.config.comm_interval = Some(secs);
        self
    }

    pub fn logger_channel(mut self, ch: u8) -> Self {
        self.config.logger_channel = Some(ch);
        self
    }

    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.config.serial = Some(serial.into());
        self
    }

    pub fn batch_size(mut self, size: u32) -> Self {
        self.config.batch_size = Some(size);
        self
    }

    pub fn build(self) -> DriverConfig {
        let defaults = DriverConfig::default();
        DriverConfig {
            transceiver_frequency: self.config.transceiver_frequency.unwrap_or(defaults.transceiver_frequency),
            polling_interval_secs: self.config.polling_interval_secs.unwrap_or(defaults.polling_interval_secs),
            comm_interval: self.config.comm_interval.unwrap_or(defaults.comm_interval),
            logger_channel: self.config.logger_channel.unwrap_or(defaults.logger_channel),
            serial: self.config.serial.or(defaults.serial),
            batch_size: self.config.batch_size.unwrap_or(defaults.batch_size),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = DriverConfig::default();
        assert_eq!(cfg.transceiver_frequency, Frequency::Eu);
        assert_eq!(cfg.polling_interval_secs, 10);
        assert_eq!(cfg.comm_interval, 8);
        assert_eq!(cfg.logger_channel, 1);
        assert_eq!(cfg.max_history_records, 51_200);
        assert_eq!(cfg.batch_size, 1_800);
        assert_eq!(cfg.timing_ms, 300);
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let mut cfg = DriverConfig::default();
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn from_file_roundtrips_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "polling_interval_secs = 5\nlogger_channel = 2\n").unwrap();
        let cfg = DriverConfig::from_file(&path).unwrap();
        assert_eq!(cfg.polling_interval_secs, 5);
        assert_eq!(cfg.logger_channel, 2);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = DriverConfig::builder().logger_channel(3).batch_size(500).build();
        assert_eq!(cfg.logger_channel, 3);
        assert_eq!(cfg.batch_size, 500);
        assert_eq!(cfg.polling_interval_secs, 10);
    }
}
