// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! History cache: ring-index arithmetic over the station's on-device
//! 51,200-slot circular buffer, plus the batched catchup accept/skip
//! rules the communication service applies to each inbound history
//! frame.

use crate::records::SampleRecord;
use chrono::{Duration, NaiveDateTime};

pub const MAX_RECORDS: i64 = 51_200;
const HISTORY_BASE_ADDR: u32 = 0x070000;
const SLOT_BYTES: u32 = 32;
const FUTURE_SLACK_SECS: i64 = 300;
const FORWARD_JUMP_LIMIT_SECS: i64 = 604_800;
const BATCH_PAUSE_SECS: u64 = 20;

/// Normalize any signed index into `[0, MAX_RECORDS)`.
pub fn get_index(i: i64) -> i64 {
    ((i % MAX_RECORDS) + MAX_RECORDS) % MAX_RECORDS
}

pub fn addr_to_index(addr: u32) -> i64 {
    ((addr - HISTORY_BASE_ADDR) / SLOT_BYTES) as i64
}

pub fn index_to_addr(index: i64) -> u32 {
    (index as u32) * SLOT_BYTES + HISTORY_BASE_ADDR
}

fn clock_rollover_guard() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2010, 7, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Outcome of offering one decoded sample record to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted,
    RejectedAlarmRecord,
    RejectedBeforeRollover,
    RejectedBeforeSince,
    RejectedFuture,
    RejectedDuplicate,
    RejectedOutOfOrder,
    RejectedImplausibleJump,
    BatchFull,
}

/// Holds the caller's requested catchup window and the records collected
/// so far. Cleared before each catchup run, per the component's
/// single-cache-per-run lifecycle.
#[derive(Debug)]
pub struct HistoryCache {
    pub since_ts: i64,
    pub num_rec: u32,
    pub start_index: Option<i64>,
    pub next_index: i64,
    pub records: Vec<SampleRecord>,
    pub num_cached_records: u32,
    pub num_outstanding_records: u32,
    pub last_ts: Option<NaiveDateTime>,
    pub wait_at_start: bool,
    pub batch_size: u32,
}

impl HistoryCache {
    pub fn new(batch_size: u32) -> Self {
        Self {
            since_ts: 0,
            num_rec: 0,
            start_index: None,
            next_index: 0,
            records: Vec::new(),
            num_cached_records: 0,
            num_outstanding_records: 0,
            last_ts: None,
            wait_at_start: true,
            batch_size,
        }
    }

    /// Reset for a new catchup run, per §4.4's cleared-before-each-run
    /// lifecycle.
    pub fn start_caching_history(&mut self, since_ts: i64, num_rec: u32) {
        self.since_ts = since_ts;
        self.num_rec = num_rec;
        self.start_index = None;
        self.next_index = 0;
        self.records.clear();
        self.num_cached_records = 0;
        self.last_ts = None;
        self.wait_at_start = true;
    }

    pub fn clear_wait_at_start(&mut self) {
        self.wait_at_start = false;
    }

    /// Called on the first history frame of a catchup run. `latest_index`
    /// is the station's reported latest slot, `now` is wall clock.
    pub fn prime(&mut self, latest_index: i64, now: NaiveDateTime, arcint_secs: u32) {
        let nreq = if self.num_rec > 0 {
            self.num_rec
        } else if self.since_ts > 0 {
            let age = (now.and_utc().timestamp() - self.since_ts).max(0);
            let arcint = arcint_secs.max(1) as i64;
            let estimate = (age + arcint - 1) / arcint + 5;
            estimate.max(0) as u32
        } else {
            0
        };
        let nreq = nreq.min(self.num_outstanding_records).min(MAX_RECORDS as u32);
        let start = get_index(latest_index - nreq as i64);
        self.start_index = Some(start);
        self.next_index = start;
    }

    /// Apply the accept/skip rules from §4.4 to one decoded sample record
    /// arriving at on-device index `this_index`.
    pub fn offer(
        &mut self,
        record: &SampleRecord,
        this_index: i64,
        now: NaiveDateTime,
    ) -> AcceptOutcome {
        let t = record.timestamp;

        if t < clock_rollover_guard() {
            return AcceptOutcome::RejectedBeforeRollover;
        }
        if t.and_utc().timestamp() < self.since_ts {
            return AcceptOutcome::RejectedBeforeSince;
        }
        if t > now + Duration::seconds(FUTURE_SLACK_SECS) {
            return AcceptOutcome::RejectedFuture;
        }
        if let Some(last) = self.last_ts {
            if t == last {
                return AcceptOutcome::RejectedDuplicate;
            }
            if t < last {
                return AcceptOutcome::RejectedOutOfOrder;
            }
            if t > last + Duration::seconds(FORWARD_JUMP_LIMIT_SECS) {
                return AcceptOutcome::RejectedImplausibleJump;
            }
        }

        if self.num_cached_records >= self.batch_size {
            return AcceptOutcome::BatchFull;
        }

        self.records.push(record.clone());
        self.num_cached_records += 1;
        self.last_ts = Some(t);
        self.next_index = this_index;
        AcceptOutcome::Accepted
    }

    /// How long the worker should pause after a full batch, before
    /// resuming catchup.
    pub fn batch_pause() -> std::time::Duration {
        std::time::Duration::from_secs(BATCH_PAUSE_SECS)
    }

    /// Validate `this_index` against the expected window
    /// `(next_index, next_index + 6]` modulo `MAX_RECORDS`.
    pub fn index_in_expected_window(&self, this_index: i64) -> bool {
        let lo = get_index(self.next_index + 1);
        let hi = get_index(self.next_index + 6);
        if lo <= hi {
            (lo..=hi).contains(&get_index(this_index))
        } else {
            get_index(this_index) >= lo || get_index(this_index) <= hi
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_index_round_trip() {
        for idx in [0_i64, 1, 5000, 51_199] {
            assert_eq!(addr_to_index(index_to_addr(idx)), idx);
        }
    }

    #[test]
    fn get_index_wraps_negative() {
        assert_eq!(get_index(-100), MAX_RECORDS - 100);
        assert_eq!(get_index(0), 0);
        assert_eq!(get_index(MAX_RECORDS), 0);
    }

    #[test]
    fn scenario_first_history_decode_fresh_device() {
        let mut cache = HistoryCache::new(1800);
        cache.start_caching_history(0, 100);
        cache.num_outstanding_records = 100;
        let now = chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        cache.prime(0, now, crate::records::DEFAULT_ARCINT_SECS);
        assert_eq!(cache.start_index, Some(get_index(0 - 100)));
        assert_eq!(cache.start_index, Some(51_100));
        assert_eq!(cache.next_index, 51_100);
        assert!(cache.records.is_empty());
    }

    #[test]
    fn scenario_duplicate_future_past_guards() {
        let mut cache = HistoryCache::new(1800);
        let now = chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let t = now - Duration::hours(1);
        let sample = |ts: NaiveDateTime| SampleRecord {
            timestamp: ts,
            channels: [(crate::codec::Temperature(20.0), crate::codec::Humidity(50.0)); 9],
        };

        let timestamps = [
            t,
            t,                          // duplicate of position 1
            t + Duration::seconds(10),  // accepted
            now + Duration::seconds(600), // future
            t - Duration::seconds(5),   // past (out of order relative to last accepted)
            t + Duration::seconds(20),  // accepted
        ];
        let outcomes: Vec<AcceptOutcome> = timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| cache.offer(&sample(ts), i as i64, now))
            .collect();

        assert_eq!(outcomes[0], AcceptOutcome::Accepted);
        assert_eq!(outcomes[1], AcceptOutcome::RejectedDuplicate);
        assert_eq!(outcomes[2], AcceptOutcome::Accepted);
        assert_eq!(outcomes[3], AcceptOutcome::RejectedFuture);
        assert_eq!(outcomes[4], AcceptOutcome::RejectedOutOfOrder);
        assert_eq!(outcomes[5], AcceptOutcome::Accepted);
    }
}
