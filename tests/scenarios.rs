// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// End-to-end wiring checks across config, records, and the driver facade's
// public surface -- the pieces that don't require a live transceiver.

use climawatch_driver::config::Frequency;
use climawatch_driver::{DriverConfig, HistoryInterval, StationConfig};

#[test]
fn driver_config_file_overrides_compose_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("climawatchd.toml");
    std::fs::write(
        &path,
        "transceiver_frequency = \"us\"\nlogger_channel = 4\nbatch_size = 900\n",
    )
    .unwrap();

    let config = DriverConfig::from_file(&path).unwrap();
    assert_eq!(config.transceiver_frequency, Frequency::Us);
    assert_eq!(config.logger_channel, 4);
    assert_eq!(config.batch_size, 900);
    // Untouched fields keep their defaults.
    assert_eq!(config.polling_interval_secs, 10);
    assert_eq!(config.max_history_records, 51_200);

    config.validate().expect("file-loaded config should validate");
}

#[test]
fn station_config_round_trips_through_decode_encode() {
    let mut raw = [0u8; 125];
    raw[2] = HistoryInterval::Min15 as u8;
    let sum: u32 = raw[5..122].iter().map(|&b| b as u32).sum();
    raw[123..125].copy_from_slice(&((sum as u16) + 7).to_be_bytes());

    let mut cfg = StationConfig::decode(&raw).unwrap();
    assert!(!cfg.test_config_changed(), "freshly decoded config should report unchanged");

    cfg.history_interval = HistoryInterval::Min360;
    let encoded = cfg.encode();
    // Scenario 6: any interval coarser than 5 minutes clamps on encode.
    assert_eq!(encoded[2], HistoryInterval::Min5 as u8);
}

#[test]
fn default_sensor_map_names_round_trip_into_config() {
    let config = DriverConfig::default();
    assert!(config.sensor_map.is_none(), "default config defers to the built-in map");
    assert_eq!(config.comm_interval, 8);
    assert_eq!(config.logger_channel, 1);
}
