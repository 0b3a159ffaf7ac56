// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Communication service: the RF state machine.
//!
//! `generate_response` is the single decision function the distilled
//! design calls for: given an inbound frame, it updates the shared
//! state and returns a [`ServiceAction`] telling the worker loop what to
//! do with the USB side next. Exception-for-control-flow (the original
//! design's `DataWritten`/`BadResponse`/`UnknownDeviceId`) is replaced by
//! this tagged result, per the redesign notes.

use crate::codec;
use crate::error::Result;
use crate::history_cache::{self, AcceptOutcome, HistoryCache};
use crate::laststat::LastStat;
use crate::records::{CurrentData, HistoryData, HistoryInterval, HistoryRecord, StationConfig};
use crate::transceiver::Transceiver;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

const PAIRING_IDS: [u16; 2] = [0xF0F0, 0xFFFF];

const ACTION_GET_CONFIG: u8 = 0x03;
const ACTION_GET_CURRENT: u8 = 0x04;
const ACTION_GET_HISTORY: u8 = 0x05;
const ACTION_REQ_SET_CONFIG: u8 = 0x06;

const TYPE_DATA_WRITTEN: u8 = 0x10;
const TYPE_CONFIG: u8 = 0x20;
const TYPE_CURRENT: u8 = 0x30;
const TYPE_HISTORY: u8 = 0x40;
const TYPE_REQUEST_ACTION: u8 = 0x50;

const SUBTYPE_MEM_STATUS: u8 = 0x50;
const SUBTYPE_FIRST_CONFIG: u8 = 0x51;
const SUBTYPE_SET_CONFIG: u8 = 0x52;
const SUBTYPE_SET_TIME: u8 = 0x53;

const FIRST_CONFIG_MARKER: u8 = 0xF0;

/// Worker pacing: how long to sleep once, then how often to poll
/// `getState` until a frame is ready.
#[derive(Debug, Clone, Copy)]
pub struct Pace {
    pub first_sleep: Duration,
    pub next_sleep: Duration,
}

impl Pace {
    pub const AFTER_SEND: Pace = Pace {
        first_sleep: Duration::from_millis(75),
        next_sleep: Duration::from_millis(5),
    };
    pub const UNKNOWN_DEVICE: Pace = Pace {
        first_sleep: Duration::from_millis(200),
        next_sleep: Duration::from_millis(5),
    };

    pub fn after_decode(timing: Duration) -> Pace {
        Pace {
            first_sleep: timing,
            next_sleep: Duration::from_millis(10),
        }
    }
}

/// Replaces the original design's exception-driven control flow.
#[derive(Debug)]
pub enum ServiceAction {
    Reply(Vec<u8>),
    SwitchToRx,
    Retry(Pace),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetConfig,
    GetCurrent,
    GetHistory,
    ReqSetConfig,
}

impl Command {
    fn action_byte(self) -> u8 {
        match self {
            Self::GetConfig => ACTION_GET_CONFIG,
            Self::GetCurrent => ACTION_GET_CURRENT,
            Self::GetHistory => ACTION_GET_HISTORY,
            Self::ReqSetConfig => ACTION_REQ_SET_CONFIG,
        }
    }
}

/// Fields shared between the caller thread and the RF worker thread,
/// protected by one mutex per the concurrency model.
pub struct SharedState {
    pub current: Option<CurrentData>,
    pub station_config: Option<StationConfig>,
    pub desired_config: Option<StationConfig>,
    pub history_cache: HistoryCache,
    pub last_stat: LastStat,
    pub command: Command,
    pub registered_device_id: Option<u16>,
    pub restart_requested: bool,
}

impl SharedState {
    pub fn new(batch_size: u32) -> Self {
        Self {
            current: None,
            station_config: None,
            desired_config: None,
            history_cache: HistoryCache::new(batch_size),
            last_stat: LastStat::default(),
            command: Command::GetConfig,
            registered_device_id: None,
            restart_requested: false,
        }
    }
}

/// Cloneable handle letting the facade request teardown of the worker
/// thread without owning its `JoinHandle`.
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Replaces a global mutable debug-flags switch: one knob, threaded into
/// `CommunicationService::new`, that decides how chatty the worker's
/// per-poll tracing is. Frame-level events (pairing, dispatch, retries,
/// alarms) always log at their natural level regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    fn logs_poll_trace(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

pub struct CommunicationService {
    shared: Arc<Mutex<SharedState>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    comm_interval: u8,
    logger_channel: u8,
    timing: Duration,
    verbosity: Verbosity,
}

impl CommunicationService {
    pub fn new(comm_interval: u8, logger_channel: u8, timing: Duration, batch_size: u32) -> Self {
        Self::with_verbosity(comm_interval, logger_channel, timing, batch_size, Verbosity::default())
    }

    pub fn with_verbosity(
        comm_interval: u8,
        logger_channel: u8,
        timing: Duration,
        batch_size: u32,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SharedState::new(batch_size))),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            comm_interval,
            logger_channel,
            timing,
            verbosity,
        }
    }

    pub fn shared(&self) -> Arc<Mutex<SharedState>> {
        self.shared.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { running: self.running.clone() }
    }

    /// Start the RF worker thread. `transceiver` is moved in; the worker
    /// owns it exclusively for the rest of the service's lifetime.
    pub fn start(&mut self, transceiver: Transceiver) {
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let shared = self.shared.clone();
        let comm_interval = self.comm_interval;
        let timing = self.timing;

        let verbosity = self.verbosity;
        info!("rf worker starting");
        self.worker = Some(std::thread::spawn(move || {
            run_worker(transceiver, shared, running, comm_interval, timing, verbosity);
            info!("rf worker exiting");
        }));
    }

    /// Join the worker with a 60 s bound. Timeout is logged, not forced,
    /// matching the distilled design's teardown contract.
    pub fn stop(&mut self) {
        self.stop_handle().stop();
        if let Some(handle) = self.worker.take() {
            let deadline = std::time::Instant::now() + Duration::from_secs(60);
            while !handle.is_finished() && std::time::Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(50));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!("rf worker did not join within 60s; abandoning");
            }
        }
    }

    pub fn start_caching_history(&self, since_ts: i64, num_rec: u32) {
        let mut shared = self.shared.lock().unwrap();
        shared.history_cache.start_caching_history(since_ts, num_rec);
    }

    pub fn clear_wait_at_start(&self) {
        let mut shared = self.shared.lock().unwrap();
        shared.history_cache.clear_wait_at_start();
    }
}

fn run_worker(
    transceiver: Transceiver,
    shared: Arc<Mutex<SharedState>>,
    running: Arc<AtomicBool>,
    comm_interval: u8,
    timing: Duration,
    verbosity: Verbosity,
) {
    let mut pace = Pace::after_decode(timing);
    'outer: while running.load(Ordering::SeqCst) {
        std::thread::sleep(pace.first_sleep);
        let ready = loop {
            if !running.load(Ordering::SeqCst) {
                break 'outer;
            }
            match transceiver.get_state() {
                Ok(true) => break true,
                Ok(false) => {
                    if verbosity.logs_poll_trace() {
                        trace!("getState: not ready");
                    }
                    std::thread::sleep(pace.next_sleep);
                }
                Err(e) => {
                    warn!(error = %e, "getState failed, retrying in 5s");
                    std::thread::sleep(Duration::from_secs(5));
                }
            }
        };
        if !ready {
            continue;
        }

        let frame = match transceiver.get_frame() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "getFrame failed, retrying in 5s");
                std::thread::sleep(Duration::from_secs(5));
                continue;
            }
        };

        let now = wall_clock_now();
        let action = {
            let mut state = shared.lock().unwrap();
            generate_response(&mut state, &frame, now, comm_interval)
        };

        match action {
            ServiceAction::Reply(bytes) => {
                if let Err(e) = transceiver.set_frame(&bytes) {
                    warn!(error = %e, "setFrame failed, retrying in 5s");
                    std::thread::sleep(Duration::from_secs(5));
                    continue;
                }
                if let Err(e) = transceiver.set_tx() {
                    warn!(error = %e, "setTX failed, retrying in 5s");
                    std::thread::sleep(Duration::from_secs(5));
                    continue;
                }
                pace = Pace::AFTER_SEND;
            }
            ServiceAction::SwitchToRx => {
                let _ = transceiver.set_rx();
                pace = Pace::after_decode(timing);
            }
            ServiceAction::Retry(p) => {
                let _ = transceiver.set_rx();
                pace = p;
            }
        }
    }
}

fn wall_clock_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// The single decision function driving the state machine.
pub fn generate_response(
    state: &mut SharedState,
    inbound: &[u8],
    now: NaiveDateTime,
    comm_interval: u8,
) -> ServiceAction {
    if inbound.len() < 4 {
        return ServiceAction::Retry(Pace::UNKNOWN_DEVICE);
    }

    let buffer_id = ((inbound[0] as u16) << 8) | inbound[1] as u16;
    let logger_id = inbound[2];
    let response_type = inbound[3] & 0xF0;
    let link_quality = inbound.get(4).copied().unwrap_or(0);

    state.last_stat.mark_seen(now, link_quality);

    let pairing = PAIRING_IDS.contains(&buffer_id);
    if pairing {
        info!(buffer_id = format!("{buffer_id:#06x}"), "pairing frame received");
        // Fixed sentinel history-address the firmware recognizes as
        // "asking for config" during pairing; unrelated to any real
        // history slot.
        const PAIRING_CONFIG_REQUEST_ADDR: u32 = 0x010700;
        let _ = logger_id;
        state.command = Command::GetConfig;
        return ServiceAction::Reply(build_ack_frame(
            inbound,
            ACTION_GET_CONFIG,
            0xFFFF,
            PAIRING_CONFIG_REQUEST_ADDR,
            comm_interval,
        ));
    }

    if let Some(registered) = state.registered_device_id {
        if registered != buffer_id {
            warn!(buffer_id = format!("{buffer_id:#06x}"), "unknown device id");
            return ServiceAction::Retry(Pace::UNKNOWN_DEVICE);
        }
    } else {
        info!(buffer_id = format!("{buffer_id:#06x}"), "pairing recorded");
        state.registered_device_id = Some(buffer_id);
    }

    match response_type {
        TYPE_DATA_WRITTEN => {
            trace!("data written ack");
            ServiceAction::SwitchToRx
        }
        TYPE_CONFIG => handle_config(state, inbound, now, comm_interval),
        TYPE_CURRENT => handle_current(state, inbound, now, comm_interval),
        TYPE_HISTORY => handle_history(state, inbound, now, comm_interval),
        TYPE_REQUEST_ACTION => handle_request_for_action(state, inbound, now, comm_interval),
        _ => {
            warn!(response_type, "bad response frame");
            ServiceAction::Retry(Pace::UNKNOWN_DEVICE)
        }
    }
}

fn handle_config(
    state: &mut SharedState,
    inbound: &[u8],
    now: NaiveDateTime,
    comm_interval: u8,
) -> ServiceAction {
    match StationConfig::decode(&inbound[6..]) {
        Ok(cfg) => {
            state.last_stat.mark_config(now);
            // Seed the desired config from the station's own reading the
            // first time one arrives, so later comparisons in
            // `select_post_current_action` start from "no change
            // requested" rather than comparing against an empty default.
            if state.desired_config.is_none() {
                state.desired_config = Some(cfg.clone());
            }
            state.station_config = Some(cfg);
            state.command = Command::GetHistory;
        }
        Err(e) => {
            warn!(error = %e, "bad config frame");
            return ServiceAction::Retry(Pace::UNKNOWN_DEVICE);
        }
    }
    ack_for_command(state, inbound, now, comm_interval)
}

fn handle_current(
    state: &mut SharedState,
    inbound: &[u8],
    now: NaiveDateTime,
    comm_interval: u8,
) -> ServiceAction {
    match CurrentData::decode(&inbound[6..], inbound.get(4).copied().unwrap_or(0) & 0x7F, now) {
        Ok(data) => {
            state.last_stat.mark_weather(now);
            state.current = Some(data);
        }
        Err(e) => {
            warn!(error = %e, "bad current-data frame");
            return ServiceAction::Retry(Pace::UNKNOWN_DEVICE);
        }
    }

    state.command = select_post_current_action(state);
    ack_for_command(state, inbound, now, comm_interval)
}

/// §4.5 post-current action selection.
fn select_post_current_action(state: &mut SharedState) -> Command {
    let station = state.station_config.as_ref();
    let station_in_cs = station.map(|c| c.in_buf_cs).unwrap_or(0);
    let station_self_consistent = station.map(|c| c.in_buf_cs == c.out_buf_cs).unwrap_or(true);

    if station_in_cs == 0 || !station_self_consistent {
        return Command::GetConfig;
    }

    if let Some(desired) = state.desired_config.as_mut() {
        let changed = desired.test_config_changed();
        if station_in_cs != desired.out_buf_cs || changed {
            return Command::ReqSetConfig;
        }
    }
    Command::GetHistory
}

fn handle_history(
    state: &mut SharedState,
    inbound: &[u8],
    now: NaiveDateTime,
    comm_interval: u8,
) -> ServiceAction {
    let data = match HistoryData::decode(&inbound[6..]) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "bad history frame");
            return ServiceAction::Retry(Pace::UNKNOWN_DEVICE);
        }
    };

    let latest_index = history_cache::addr_to_index(data.latest_addr);
    let mut this_index = history_cache::addr_to_index(data.this_addr);
    // Empirical first-frame correction, preserved verbatim from the
    // original firmware quirk.
    if this_index == 6 && latest_index > 12 {
        this_index = 1;
    }

    state.last_stat.mark_history(now, this_index, latest_index);
    check_clock_drift(state, &data, now);

    if state.history_cache.start_index.is_none() {
        let arcint = state
            .station_config
            .as_ref()
            .map(|c| c.history_interval.seconds())
            .unwrap_or(crate::records::DEFAULT_ARCINT_SECS);
        state.history_cache.num_outstanding_records =
            (history_cache::get_index(latest_index - this_index)) as u32;
        state.history_cache.prime(latest_index, now, arcint);
    }

    if !state.history_cache.index_in_expected_window(this_index)
        && state.history_cache.num_outstanding_records == 0
    {
        debug!("history index mismatch with no outstanding records, skipping one position");
    } else {
        for record in &data.records {
            if let HistoryRecord::Sample(sample) = record {
                let outcome = state.history_cache.offer(sample, this_index, now);
                if outcome == AcceptOutcome::BatchFull {
                    break;
                }
            }
        }
    }
    state.history_cache.next_index = this_index;

    state.command = Command::GetHistory;
    ack_for_command(state, inbound, now, comm_interval)
}

/// §4.5 clock-drift check: positions 1 and 6 agreeing on a non-sentinel
/// timestamp that disagrees with wall clock by more than 300s arms a
/// station-side beep; within 30s, clears it.
fn check_clock_drift(state: &mut SharedState, data: &HistoryData, now: NaiveDateTime) {
    let pos1 = data.records.first();
    let pos6 = data.records.last();
    let (Some(HistoryRecord::Sample(p1)), Some(HistoryRecord::Sample(p6))) = (pos1, pos6) else {
        return;
    };
    let sentinel = chrono::NaiveDate::from_ymd_opt(1900, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    if p1.timestamp != p6.timestamp || p1.timestamp == sentinel {
        return;
    }
    let drift = (now - p1.timestamp).num_seconds().abs();
    if let Some(desired) = state.desired_config.as_mut() {
        if drift > 300 {
            desired.thresholds[0].humidity_min = codec::Humidity(99.0);
            desired.alarm_set[4] |= 0x02;
        } else if drift <= 30 {
            desired.thresholds[0].humidity_min = codec::Humidity(20.0);
            desired.alarm_set[4] &= !0x02;
        }
    }
}

fn handle_request_for_action(
    state: &mut SharedState,
    inbound: &[u8],
    now: NaiveDateTime,
    comm_interval: u8,
) -> ServiceAction {
    let subtype = inbound[3];
    match subtype {
        SUBTYPE_MEM_STATUS => ack_for_command(state, inbound, now, comm_interval),
        SUBTYPE_FIRST_CONFIG => {
            state.command = Command::GetConfig;
            ack_for_command(state, inbound, now, comm_interval)
        }
        SUBTYPE_SET_CONFIG => build_set_config_frame(state, inbound)
            .map(ServiceAction::Reply)
            .unwrap_or(ServiceAction::Retry(Pace::UNKNOWN_DEVICE)),
        SUBTYPE_SET_TIME => ServiceAction::Reply(build_set_time_frame(inbound, now)),
        _ => {
            warn!(subtype, "unrecognized request-for-action subtype");
            ServiceAction::Retry(Pace::UNKNOWN_DEVICE)
        }
    }
}

/// §4.5 ACK frame: 11 bytes, with action morphing applied when live data
/// has gone stale during a catchup.
fn ack_for_command(
    state: &mut SharedState,
    inbound: &[u8],
    now: NaiveDateTime,
    comm_interval: u8,
) -> ServiceAction {
    let mut command = state.command;

    if command == Command::GetHistory && inbound.get(1).copied().unwrap_or(0) != FIRST_CONFIG_MARKER {
        if let Some(age) = state.last_stat.weather_age_secs(now) {
            if age >= 2 * (comm_interval as i64 + 1) {
                command = Command::GetCurrent;
            }
        }
    }

    let haddr = match command {
        Command::GetHistory => {
            let idx = state.history_cache.next_index;
            history_cache::index_to_addr(idx)
        }
        _ => 0xFFFFFF,
    };

    ServiceAction::Reply(build_ack_frame(
        inbound,
        command.action_byte(),
        0xFFFF,
        haddr,
        comm_interval,
    ))
}

fn build_ack_frame(inbound: &[u8], action: u8, checksum: u16, haddr: u32, comm_interval: u8) -> Vec<u8> {
    let cs = checksum.to_be_bytes();
    let ha = haddr.to_be_bytes();
    vec![
        inbound[0],
        inbound[1],
        inbound[2],
        action & 0x0F,
        cs[0],
        cs[1],
        0x80,
        comm_interval,
        ha[1],
        ha[2],
        ha[3],
    ]
}

/// §4.5 set-config frame: a verbatim 5-byte header copy from the
/// triggering request, followed by the desired config payload (with its
/// recomputed checksum already written into bytes 123..124 by `encode`).
fn build_set_config_frame(state: &SharedState, inbound: &[u8]) -> Option<Vec<u8>> {
    let desired = state.desired_config.as_ref()?;
    if inbound.len() < 5 {
        return None;
    }
    let mut out = vec![0u8; 5];
    out.copy_from_slice(&inbound[..5]);
    out.extend_from_slice(&desired.encode());
    Some(out)
}

const ACTION_SEND_TIME: u8 = 0x60;

fn build_set_time_frame(inbound: &[u8], now: NaiveDateTime) -> Vec<u8> {
    let mut out = vec![0u8; 13];
    out[0] = inbound[0];
    out[1] = inbound[1];
    out[2] = inbound[2];
    out[3] = ACTION_SEND_TIME;
    codec::parse_0((now.format("%y").to_string()).parse().unwrap_or(0), &mut out, 4, true, 2);
    codec::parse_0(now.format("%m").to_string().parse().unwrap_or(1), &mut out, 5, true, 2);
    codec::parse_0(now.format("%d").to_string().parse().unwrap_or(1), &mut out, 6, true, 2);
    codec::parse_0(now.format("%H").to_string().parse().unwrap_or(0), &mut out, 7, true, 2);
    codec::parse_0(now.format("%M").to_string().parse().unwrap_or(0), &mut out, 8, true, 2);
    codec::parse_0(now.format("%S").to_string().parse().unwrap_or(0), &mut out, 9, true, 2);
    if inbound.len() >= 6 {
        out[11] = inbound[4];
        out[12] = inbound[5];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SampleRecord;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn scenario_pairing_from_cold() {
        let mut state = SharedState::new(1800);
        let inbound = [0xF0, 0xF0, 0x00, 0x53, 0, 0, 0];
        let action = generate_response(&mut state, &inbound, ts(0, 0, 0), 8);
        let ServiceAction::Reply(bytes) = action else {
            panic!("expected reply");
        };
        assert_eq!(bytes.len(), 11);
        assert_eq!(bytes[3] & 0x0F, ACTION_GET_CONFIG);
        assert_eq!(&bytes[4..6], &[0xFF, 0xFF]);
        assert_eq!(&bytes[8..11], &[0x01, 0x07, 0x00]);
    }

    #[test]
    fn ack_frame_is_eleven_bytes_with_fixed_byte6() {
        let bytes = build_ack_frame(&[0x12, 0x34, 0x01, 0x30], ACTION_GET_CURRENT, 0xABCD, 0x010203, 8);
        assert_eq!(bytes.len(), 11);
        assert_eq!(bytes[6], 0x80);
        assert_eq!(bytes[7], 8);
    }

    fn sample_at(ts: NaiveDateTime) -> HistoryRecord {
        HistoryRecord::Sample(SampleRecord {
            timestamp: ts,
            channels: [(codec::Temperature(20.0), codec::Humidity(50.0)); 9],
        })
    }

    #[test]
    fn scenario_clock_drift_arms_alarm_and_requests_config() {
        let mut state = SharedState::new(1800);
        state.registered_device_id = Some(0x1234);
        let drifted = ts(11, 0, 0);
        let wall_now = ts(12, 0, 0); // 3600s away, well past the 300s threshold

        let desired = StationConfig::decode(&[0u8; 125]).unwrap();
        state.desired_config = Some(desired);

        let data = HistoryData {
            checksum: 0,
            latest_addr: history_cache::index_to_addr(10),
            this_addr: history_cache::index_to_addr(5),
            records: (0..6).map(|_| sample_at(drifted)).collect(),
        };
        check_clock_drift(&mut state, &data, wall_now);

        let after = state.desired_config.as_ref().unwrap();
        assert_eq!(after.alarm_set[4] & 0x02, 0x02);
        assert_eq!(after.thresholds[0].humidity_min, codec::Humidity(99.0));

        // Agreement within 30s clears the alarm again.
        let close = HistoryData {
            records: (0..6).map(|_| sample_at(wall_now)).collect(),
            ..data
        };
        check_clock_drift(&mut state, &close, wall_now);
        let cleared = state.desired_config.as_ref().unwrap();
        assert_eq!(cleared.alarm_set[4] & 0x02, 0);
    }

    #[test]
    fn scenario_stale_data_morph_to_get_current() {
        let mut state = SharedState::new(1800);
        state.registered_device_id = Some(0x1234);
        state.command = Command::GetHistory;
        state.last_stat.mark_weather(ts(12, 0, 0));
        let inbound = {
            let mut b = vec![0x12, 0x34, 0x01, 0x30];
            b.resize(6 + crate::records::NUM_CHANNELS * 0, 0);
            b.resize(235, 0);
            b
        };
        let action = generate_response(&mut state, &inbound, ts(12, 0, 20), 8);
        let ServiceAction::Reply(bytes) = action else {
            panic!("expected reply");
        };
        assert_eq!(bytes[3] & 0x0F, ACTION_GET_CURRENT);
    }
}
