// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `HistoryData`: the 181-byte history payload (frame type `0x40`), six
//! records per frame.

use crate::codec::{to_date_time_10, to_humidity_2_0, to_int_1, to_temperature_3_1, Cursor, Humidity, Temperature};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;

pub const PAYLOAD_LEN: usize = 181;
pub const HEADER_LEN: usize = 13;
pub const POSITIONS: usize = 6;
const ALARM_DISCRIMINATOR: u8 = 0xee;

/// A sample record: one timestamp plus T/H for all nine channels.
#[derive(Debug, Clone)]
pub struct SampleRecord {
    pub timestamp: NaiveDateTime,
    pub channels: [(Temperature, Humidity); 9],
}

/// An alarm record: a timestamp, the triggering channel, the kind of
/// alarm, and the limit/observed values that tripped it.
#[derive(Debug, Clone, Copy)]
pub struct AlarmRecord {
    pub timestamp: NaiveDateTime,
    pub channel: u8,
    pub humidity_high: bool,
    pub humidity_low: bool,
    pub temp_high: bool,
    pub temp_low: bool,
    pub limit: f32,
    pub observed: f32,
}

#[derive(Debug, Clone)]
pub enum HistoryRecord {
    Sample(SampleRecord),
    Alarm(AlarmRecord),
}

impl HistoryRecord {
    /// The record's own timestamp, used by the history cache's accept/skip
    /// rules regardless of record kind.
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Self::Sample(s) => s.timestamp,
            Self::Alarm(a) => a.timestamp,
        }
    }

    pub fn is_alarm(&self) -> bool {
        matches!(self, Self::Alarm(_))
    }
}

/// A decoded `0x40` history frame: the station's addressing for this
/// frame plus up to six records at positions 1..6.
#[derive(Debug, Clone)]
pub struct HistoryData {
    pub checksum: u16,
    pub latest_addr: u32,
    pub this_addr: u32,
    pub records: Vec<HistoryRecord>,
}

/// Per-position byte stride within the payload, after the 13-byte header.
/// The station packs a discriminator byte, a 10-nibble timestamp, and
/// nine (temperature, humidity) pairs per position.
const POSITION_STRIDE: usize = (PAYLOAD_LEN - HEADER_LEN) / POSITIONS;

impl HistoryData {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < PAYLOAD_LEN {
            return Err(Error::LengthMismatch {
                expected: PAYLOAD_LEN,
                actual: payload.len(),
            });
        }
        let checksum = u16::from_be_bytes([payload[5], payload[6]]);
        let latest_addr = be24(&payload[7..10]);
        let this_addr = be24(&payload[10..13]);

        let mut records = Vec::with_capacity(POSITIONS);
        for pos in 0..POSITIONS {
            let base = HEADER_LEN + pos * POSITION_STRIDE;
            let slice = &payload[base..base + POSITION_STRIDE];
            records.push(decode_position(slice));
        }

        Ok(Self {
            checksum,
            latest_addr,
            this_addr,
            records,
        })
    }
}

fn be24(b: &[u8]) -> u32 {
    (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32
}

fn decode_position(slice: &[u8]) -> HistoryRecord {
    if slice[0] == ALARM_DISCRIMINATOR {
        decode_alarm(slice)
    } else {
        decode_sample(slice)
    }
}

fn decode_sample(slice: &[u8]) -> HistoryRecord {
    let mut cursor = Cursor::new(1, true);
    let (b, h) = cursor.pos();
    let timestamp = to_date_time_10(slice, b, h);
    cursor.advance(10);

    let mut channels = [(Temperature(0.0), Humidity(0.0)); 9];
    for c in channels.iter_mut() {
        let (b, h) = cursor.pos();
        let temp = to_temperature_3_1(slice, b, h);
        cursor.advance(3);
        let (b, h) = cursor.pos();
        let humidity = to_humidity_2_0(slice, b, h);
        cursor.advance(2);
        *c = (temp, humidity);
    }

    HistoryRecord::Sample(SampleRecord { timestamp, channels })
}

fn decode_alarm(slice: &[u8]) -> HistoryRecord {
    let mut cursor = Cursor::new(1, true);
    let (b, h) = cursor.pos();
    let timestamp = to_date_time_10(slice, b, h);
    cursor.advance(10);

    let (b, h) = cursor.pos();
    let channel = to_int_1(slice, b, h);
    cursor.advance(1);

    let (b, h) = cursor.pos();
    let kind = to_int_1(slice, b, h);
    cursor.advance(1);

    let (b, h) = cursor.pos();
    let limit = to_temperature_3_1(slice, b, h).0;
    cursor.advance(3);
    let (b, h) = cursor.pos();
    let observed = to_temperature_3_1(slice, b, h).0;
    cursor.advance(3);

    HistoryRecord::Alarm(AlarmRecord {
        timestamp,
        channel,
        humidity_high: kind & 0x1 != 0,
        humidity_low: kind & 0x2 != 0,
        temp_high: kind & 0x4 != 0,
        temp_low: kind & 0x8 != 0,
        limit,
        observed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_short_payload() {
        let buf = [0u8; 10];
        assert!(HistoryData::decode(&buf).is_err());
    }

    #[test]
    fn decode_reads_addresses_and_checksum() {
        let mut buf = [0u8; PAYLOAD_LEN];
        buf[5] = 0x12;
        buf[6] = 0x34;
        buf[7..10].copy_from_slice(&[0x07, 0x00, 0x00]);
        buf[10..13].copy_from_slice(&[0x07, 0x00, 0x20]);
        let data = HistoryData::decode(&buf).unwrap();
        assert_eq!(data.checksum, 0x1234);
        assert_eq!(data.latest_addr, 0x070000);
        assert_eq!(data.this_addr, 0x070020);
        assert_eq!(data.records.len(), POSITIONS);
    }

    #[test]
    fn alarm_discriminator_selects_alarm_decode() {
        let mut buf = [0u8; PAYLOAD_LEN];
        buf[HEADER_LEN] = ALARM_DISCRIMINATOR;
        let data = HistoryData::decode(&buf).unwrap();
        assert!(data.records[0].is_alarm());
        assert!(!data.records[1].is_alarm());
    }
}
