// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Driver facade: lifecycle plus the two externally-visible streams
//! described in the design — current observations and startup history.

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::records::SampleRecord;
use crate::sensor_map::default_sensor_map;
use crate::service::CommunicationService;
use crate::transceiver::Transceiver;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

const MAX_CONSECUTIVE_EMPTY: u32 = 30;
const STALE_THRESHOLD_SECS: i64 = 300;
const HISTORY_RE_REQUEST_SECS: u64 = 300;

/// One emitted current observation: logical sensor name -> reading.
/// Sentinel (`NP`/`OFL`) readings never appear as entries; a missing
/// reading is simply absent from the map.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Observation(pub HashMap<String, f64>);

pub struct Driver {
    config: DriverConfig,
    service: CommunicationService,
    sensor_map: HashMap<String, String>,
    consecutive_empty: u32,
    last_emitted_weather_ts: Option<NaiveDateTime>,
    last_log_at: Option<NaiveDateTime>,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        let sensor_map = config.sensor_map.clone().unwrap_or_else(default_sensor_map);
        let service = CommunicationService::new(
            config.comm_interval,
            config.logger_channel,
            Duration::from_millis(config.timing_ms),
            config.batch_size,
        );
        Self {
            config,
            service,
            sensor_map,
            consecutive_empty: 0,
            last_emitted_weather_ts: None,
            last_log_at: None,
        }
    }

    /// Open the transceiver, program its frequency, and start the RF
    /// worker thread.
    pub fn start_up(&mut self) -> Result<()> {
        let transceiver = Transceiver::open(self.config.serial.as_deref())?;
        transceiver.initialize_transceiver()?;
        transceiver.set_frequency(self.config.transceiver_frequency.hz())?;
        transceiver.set_rx()?;
        info!("driver starting up");
        self.service.start(transceiver);
        Ok(())
    }

    /// Signal teardown and join the worker (60s bound, logged not forced).
    pub fn shut_down(&mut self) {
        info!("driver shutting down");
        self.service.stop();
    }

    /// Blocking: wait one polling interval, then return the latest
    /// observation if the current snapshot has advanced since the last
    /// emission, or `None` otherwise. After 30 consecutive empties,
    /// returns `Err(Error::NotRunning)` as the facade's restart signal.
    pub fn next_observation(&mut self) -> Result<Option<Observation>> {
        std::thread::sleep(Duration::from_secs(self.config.polling_interval_secs));

        let shared = self.service.shared();
        let state = shared.lock().unwrap();
        let now = chrono::Local::now().naive_local();

        self.maybe_log_staleness(&state, now);

        let Some(current) = state.current.as_ref() else {
            self.consecutive_empty += 1;
            return self.check_restart();
        };
        let weather_ts = state.last_stat.last_weather_ts;
        if weather_ts.is_none() || weather_ts == self.last_emitted_weather_ts {
            self.consecutive_empty += 1;
            return self.check_restart();
        }

        self.consecutive_empty = 0;
        self.last_emitted_weather_ts = weather_ts;

        let mut values = HashMap::new();
        for ch in 0..current.channels.len() {
            let reading = &current.channels[ch];
            if let Some(t) = reading.temp.reading() {
                insert_mapped(&mut values, &self.sensor_map, &format!("temp{ch}"), t as f64);
            }
            if let Some(h) = reading.humidity.reading() {
                insert_mapped(&mut values, &self.sensor_map, &format!("humidity{ch}"), h as f64);
            }
            insert_mapped(
                &mut values,
                &self.sensor_map,
                &format!("batteryStatus{ch}"),
                if current.battery_ok(ch) { 1.0 } else { 0.0 },
            );
        }
        insert_mapped(
            &mut values,
            &self.sensor_map,
            "rxCheckPercent",
            current.signal_quality as f64,
        );

        Ok(Some(Observation(values)))
    }

    fn check_restart(&mut self) -> Result<Option<Observation>> {
        if self.consecutive_empty >= MAX_CONSECUTIVE_EMPTY {
            warn!("no observation for 30 consecutive cycles, requesting restart");
            return Err(Error::NotRunning);
        }
        Ok(None)
    }

    fn maybe_log_staleness(&mut self, state: &crate::service::SharedState, now: NaiveDateTime) {
        let due = self
            .last_log_at
            .map(|t| (now - t).num_seconds() >= self.config.log_interval_secs as i64)
            .unwrap_or(true);
        if !due {
            return;
        }
        self.last_log_at = Some(now);
        if let Some(age) = state.last_stat.weather_age_secs(now) {
            if age >= STALE_THRESHOLD_SECS {
                info!(age_secs = age, "no current data for a while");
            }
        }
        if let Some(age) = state.last_stat.contact_age_secs(now) {
            if age >= STALE_THRESHOLD_SECS {
                info!(age_secs = age, "no contact with station for a while");
            }
        }
    }

    /// Request a history catchup starting from `since_ts` (unix seconds),
    /// or the last `num_rec` records if `num_rec > 0`.
    pub fn start_history_catchup(&self, since_ts: i64, num_rec: u32) {
        self.service.start_caching_history(since_ts, num_rec);
        self.service.clear_wait_at_start();
    }

    /// Blocking: drain the history cache in `batch_size` chunks. Returns
    /// an empty vec once a batch's collection period drops under 300s,
    /// matching the distilled design's termination rule.
    pub fn drain_history_batch(&self) -> Vec<SampleRecord> {
        let started = std::time::Instant::now();
        loop {
            std::thread::sleep(Duration::from_millis(200));
            let shared = self.service.shared();
            let mut state = shared.lock().unwrap();
            let full = state.history_cache.num_cached_records >= state.history_cache.batch_size;
            let elapsed = started.elapsed();
            if full || elapsed >= Duration::from_secs(HISTORY_RE_REQUEST_SECS) {
                let batch = std::mem::take(&mut state.history_cache.records);
                state.history_cache.num_cached_records = 0;
                return batch;
            }
        }
    }
}

fn insert_mapped(out: &mut HashMap<String, f64>, map: &HashMap<String, String>, key: &str, value: f64) {
    let name = map.get(key).cloned().unwrap_or_else(|| key.to_string());
    out.insert(name, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_defaults_to_empty() {
        let obs = Observation::default();
        assert!(obs.0.is_empty());
    }
}
