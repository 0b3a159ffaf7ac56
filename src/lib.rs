// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Climawatch Driver
//!
//! Host-side driver for a multi-channel wireless climate/weather-station
//! logger talking to its USB RF dongle.
//!
//! # Features
//!
//! - **RF Communication Service**: a state machine driving the station's
//!   pairing, current-data, history-catchup, and config exchanges over a
//!   background worker thread
//! - **Current observations**: a blocking stream of the latest reading
//!   across up to nine temperature/humidity channels
//! - **Startup history**: batched replay of the station's on-device
//!   51,200-slot ring buffer
//!
//! # Example
//!
//! ```rust,ignore
//! use climawatch_driver::{Driver, DriverConfig};
//!
//! let mut driver = Driver::new(DriverConfig::default());
//! driver.start_up()?;
//! while let Some(obs) = driver.next_observation()? {
//!     println!("{obs:?}");
//! }
//! ```

mod codec;
mod driver;
mod error;
mod history_cache;
mod laststat;
mod records;
mod sensor_map;
mod service;
mod transceiver;

pub mod config;

pub use codec::{Humidity, Temperature};
pub use driver::{Driver, Observation};
pub use error::{Error, Result};
pub use history_cache::{AcceptOutcome, HistoryCache};
pub use laststat::LastStat;
pub use records::{
    AlarmRecord, ChannelReading, ChannelThresholds, CurrentData, HistoryData, HistoryInterval,
    HistoryRecord, SampleRecord, StationConfig, DEFAULT_ARCINT_SECS, NO_SENSOR_LABEL,
    NUM_CHANNELS, NUM_REMOTE_CHANNELS,
};
pub use sensor_map::default_sensor_map;
pub use service::{
    generate_response, Command, CommunicationService, Pace, ServiceAction, SharedState,
    StopHandle, Verbosity,
};
pub use transceiver::Transceiver;

pub use config::DriverConfig;
