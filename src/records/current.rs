// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `CurrentData`: the 229-byte current-observation payload (frame type
//! `0x30`).

use crate::codec::{
    to_date_time_8, to_humidity_2_0, to_temperature_3_1, Cursor, Humidity, Temperature,
};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;

pub const PAYLOAD_LEN: usize = 229;
pub const NUM_CHANNELS: usize = 9;

/// One channel's slice of a `CurrentData` frame: current reading, observed
/// min/max, and the (nullable) time each min/max occurred.
#[derive(Debug, Clone, Copy)]
pub struct ChannelReading {
    pub temp: Temperature,
    pub humidity: Humidity,
    pub temp_min: Temperature,
    pub temp_min_time: Option<NaiveDateTime>,
    pub temp_max: Temperature,
    pub temp_max_time: Option<NaiveDateTime>,
    pub humidity_min: Humidity,
    pub humidity_min_time: Option<NaiveDateTime>,
    pub humidity_max: Humidity,
    pub humidity_max_time: Option<NaiveDateTime>,
}

impl ChannelReading {
    fn decode(buf: &[u8], cursor: &mut Cursor) -> Self {
        let (b, h) = cursor.pos();
        let temp = to_temperature_3_1(buf, b, h);
        cursor.advance(3);

        let (b, h) = cursor.pos();
        let humidity = to_humidity_2_0(buf, b, h);
        cursor.advance(2);

        let (b, h) = cursor.pos();
        let temp_min = to_temperature_3_1(buf, b, h);
        cursor.advance(3);
        let (b, h) = cursor.pos();
        let temp_min_time = to_date_time_8(buf, b, h);
        cursor.advance(8);

        let (b, h) = cursor.pos();
        let temp_max = to_temperature_3_1(buf, b, h);
        cursor.advance(3);
        let (b, h) = cursor.pos();
        let temp_max_time = to_date_time_8(buf, b, h);
        cursor.advance(8);

        let (b, h) = cursor.pos();
        let humidity_min = to_humidity_2_0(buf, b, h);
        cursor.advance(2);
        let (b, h) = cursor.pos();
        let humidity_min_time = to_date_time_8(buf, b, h);
        cursor.advance(8);

        let (b, h) = cursor.pos();
        let humidity_max = to_humidity_2_0(buf, b, h);
        cursor.advance(2);
        let (b, h) = cursor.pos();
        let humidity_max_time = to_date_time_8(buf, b, h);
        cursor.advance(8);

        Self {
            temp,
            humidity,
            temp_min,
            temp_min_time,
            temp_max,
            temp_max_time,
            humidity_min,
            humidity_min_time,
            humidity_max,
            humidity_max_time,
        }
    }
}

/// Decoded `0x30` current-data frame.
#[derive(Debug, Clone)]
pub struct CurrentData {
    pub channels: [ChannelReading; NUM_CHANNELS],
    /// Raw trailing 12 bytes of the payload; battery bits are derived
    /// from it by [`CurrentData::battery_ok`].
    pub alarm_data: [u8; 12],
    pub signal_quality: u8,
    pub rx_timestamp: NaiveDateTime,
}

impl CurrentData {
    /// Decode a `0x30` frame. `payload` is the frame's bytes after the
    /// 6-byte header; `signal_quality` and `rx_timestamp` are supplied by
    /// the caller from the frame header and wall clock respectively.
    pub fn decode(payload: &[u8], signal_quality: u8, rx_timestamp: NaiveDateTime) -> Result<Self> {
        if payload.len() < PAYLOAD_LEN {
            return Err(Error::LengthMismatch {
                expected: PAYLOAD_LEN,
                actual: payload.len(),
            });
        }
        let mut cursor = Cursor::new(0, true);
        let channels: Vec<ChannelReading> = (0..NUM_CHANNELS)
            .map(|_| ChannelReading::decode(payload, &mut cursor))
            .collect();
        let channels: [ChannelReading; NUM_CHANNELS] = channels.try_into().unwrap();

        let mut alarm_data = [0u8; 12];
        alarm_data.copy_from_slice(&payload[PAYLOAD_LEN - 12..PAYLOAD_LEN]);

        Ok(Self {
            channels,
            alarm_data,
            signal_quality,
            rx_timestamp,
        })
    }

    /// Battery status for channel `n` (0 = base, 1..=8 = remote).
    ///
    /// Channel 0 reads bit 7 of `alarm_data[1]`, inverted (the station
    /// sets the bit when the battery is low, so XOR with `0x80` recovers
    /// an "ok" polarity). Channels 1..8 read bit `n-1` of `alarm_data[0]`
    /// directly.
    pub fn battery_ok(&self, channel: usize) -> bool {
        if channel == 0 {
            (self.alarm_data[1] & 0x80) != 0
        } else {
            (self.alarm_data[0] >> (channel - 1)) & 1 != 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_short_payload() {
        let buf = [0u8; 10];
        let err = CurrentData::decode(&buf, 80, sample_ts()).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn decode_accepts_full_payload() {
        let buf = [0u8; PAYLOAD_LEN];
        let data = CurrentData::decode(&buf, 80, sample_ts()).unwrap();
        assert_eq!(data.channels.len(), NUM_CHANNELS);
        assert_eq!(data.signal_quality, 80);
    }

    #[test]
    fn battery_ok_reads_expected_bits() {
        let mut buf = [0u8; PAYLOAD_LEN];
        buf[PAYLOAD_LEN - 12] = 0b0000_0101; // channels 1 and 3 ok
        buf[PAYLOAD_LEN - 11] = 0x80; // channel 0 ok
        let data = CurrentData::decode(&buf, 0, sample_ts()).unwrap();
        assert!(data.battery_ok(0));
        assert!(data.battery_ok(1));
        assert!(!data.battery_ok(2));
        assert!(data.battery_ok(3));
    }

    fn sample_ts() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }
}
