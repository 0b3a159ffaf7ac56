// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `StationConfig`: the 125-byte station configuration payload (frame
//! type `0x20`), plus the checksum contract that drives whether the
//! service pushes a config update.

use crate::codec::{pack_label, parse_0, parse_1, to_humidity_2_0, to_temperature_3_1, unpack_label, Cursor, Humidity, Temperature};
use crate::error::{Error, Result};

pub const PAYLOAD_LEN: usize = 125;
pub const NUM_REMOTE_CHANNELS: usize = 8;

/// No-sensor-present marker for a remote channel's label.
pub const NO_SENSOR_LABEL: &str = " E@@      ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryInterval {
    Min1 = 0,
    Min5 = 1,
    Min10 = 2,
    Min15 = 3,
    Min30 = 4,
    Min60 = 5,
    Min120 = 6,
    Min180 = 7,
    Min360 = 8,
}

/// The station's default assumption when the configured interval is not
/// yet known, used by the history cache's `nreq` estimate.
pub const DEFAULT_ARCINT_SECS: u32 = 900;

impl HistoryInterval {
    pub fn from_raw(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Min1,
            1 => Self::Min5,
            2 => Self::Min10,
            3 => Self::Min15,
            4 => Self::Min30,
            5 => Self::Min60,
            6 => Self::Min120,
            7 => Self::Min180,
            8 => Self::Min360,
            _ => return None,
        })
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Min1 => 1,
            Self::Min5 => 5,
            Self::Min10 => 10,
            Self::Min15 => 15,
            Self::Min30 => 30,
            Self::Min60 => 60,
            Self::Min120 => 120,
            Self::Min180 => 180,
            Self::Min360 => 360,
        }
    }

    pub fn seconds(self) -> u32 {
        self.minutes() * 60
    }

    /// Clamp any interval coarser than five minutes down to five minutes.
    /// Preserved verbatim from the original station firmware's behavior.
    pub fn clamped(self) -> Self {
        if (self as u8) > (Self::Min5 as u8) {
            Self::Min5
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChannelThresholds {
    pub temp_min: Temperature,
    pub temp_max: Temperature,
    pub humidity_min: Humidity,
    pub humidity_max: Humidity,
}

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub settings: u8,
    pub timezone_offset: i8,
    pub history_interval: HistoryInterval,
    pub thresholds: [ChannelThresholds; 9],
    pub alarm_set: [u8; 5],
    pub labels: [String; NUM_REMOTE_CHANNELS],
    pub reset_hi_lo: bool,
    pub in_buf_cs: u16,
    pub out_buf_cs: u16,
}

const THRESHOLDS_OFFSET: usize = 3;
const THRESHOLDS_LEN: usize = 5; // bytes per channel (10 nibbles)
const ALARM_SET_OFFSET: usize = THRESHOLDS_OFFSET + 9 * THRESHOLDS_LEN; // 48
const LABELS_OFFSET: usize = ALARM_SET_OFFSET + 5; // 53
const RESET_HI_LO_OFFSET: usize = LABELS_OFFSET + NUM_REMOTE_CHANNELS * 8; // 117
const CHECKSUM_OFFSET: usize = 123;
const CHECKSUM_SUM_START: usize = 5;
const CHECKSUM_SUM_END: usize = 122; // exclusive

fn decode_timezone(raw: u8) -> i8 {
    if raw > 12 {
        -((256 - raw as u16) as i8 as i32) as i8
    } else {
        raw as i8
    }
}

fn encode_timezone(tz: i8) -> u8 {
    if tz < 0 {
        (256 + tz as i32) as u8
    } else {
        tz as u8
    }
}

impl StationConfig {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < PAYLOAD_LEN {
            return Err(Error::LengthMismatch {
                expected: PAYLOAD_LEN,
                actual: buf.len(),
            });
        }
        let settings = buf[0];
        let timezone_offset = decode_timezone(buf[1]);
        let history_interval = HistoryInterval::from_raw(buf[2]).unwrap_or(HistoryInterval::Min15);

        let mut thresholds = [ChannelThresholds {
            temp_min: Temperature(0.0),
            temp_max: Temperature(0.0),
            humidity_min: Humidity(0.0),
            humidity_max: Humidity(0.0),
        }; 9];
        for (i, t) in thresholds.iter_mut().enumerate() {
            let base = THRESHOLDS_OFFSET + i * THRESHOLDS_LEN;
            let mut cursor = Cursor::new(base, true);
            let (b, h) = cursor.pos();
            t.temp_min = to_temperature_3_1(buf, b, h);
            cursor.advance(3);
            let (b, h) = cursor.pos();
            t.temp_max = to_temperature_3_1(buf, b, h);
            cursor.advance(3);
            let (b, h) = cursor.pos();
            t.humidity_min = to_humidity_2_0(buf, b, h);
            cursor.advance(2);
            let (b, h) = cursor.pos();
            t.humidity_max = to_humidity_2_0(buf, b, h);
            cursor.advance(2);
        }

        let mut alarm_set = [0u8; 5];
        alarm_set.copy_from_slice(&buf[ALARM_SET_OFFSET..ALARM_SET_OFFSET + 5]);

        let labels: Vec<String> = (0..NUM_REMOTE_CHANNELS)
            .map(|i| unpack_label(&buf[LABELS_OFFSET + i * 8..LABELS_OFFSET + i * 8 + 8]))
            .collect();
        let labels: [String; NUM_REMOTE_CHANNELS] = labels.try_into().unwrap();

        let reset_hi_lo = buf[RESET_HI_LO_OFFSET] != 0;
        let in_buf_cs = u16::from_be_bytes([buf[CHECKSUM_OFFSET], buf[CHECKSUM_OFFSET + 1]]);

        let mut cfg = Self {
            settings,
            timezone_offset,
            history_interval,
            thresholds,
            alarm_set,
            labels,
            reset_hi_lo,
            in_buf_cs,
            out_buf_cs: 0,
        };
        cfg.out_buf_cs = cfg.compute_checksum();
        Ok(cfg)
    }

    /// Serialize the desired configuration into a 125-byte buffer, as it
    /// would be written by `StationConfig::encode` for a set-config frame.
    /// The history interval is clamped per [`HistoryInterval::clamped`]
    /// before encoding.
    pub fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut buf = [0u8; PAYLOAD_LEN];
        buf[0] = self.settings;
        buf[1] = encode_timezone(self.timezone_offset);
        buf[2] = self.history_interval.clamped() as u8;

        for (i, t) in self.thresholds.iter().enumerate() {
            let base = THRESHOLDS_OFFSET + i * THRESHOLDS_LEN;
            let mut cursor = Cursor::new(base, true);
            let (b, h) = cursor.pos();
            parse_1(t.temp_min.0 + 40.0, &mut buf, b, h, 3);
            cursor.advance(3);
            let (b, h) = cursor.pos();
            parse_1(t.temp_max.0 + 40.0, &mut buf, b, h, 3);
            cursor.advance(3);
            let (b, h) = cursor.pos();
            parse_0(t.humidity_min.0 as u32, &mut buf, b, h, 2);
            cursor.advance(2);
            let (b, h) = cursor.pos();
            parse_0(t.humidity_max.0 as u32, &mut buf, b, h, 2);
            cursor.advance(2);
        }

        buf[ALARM_SET_OFFSET..ALARM_SET_OFFSET + 5].copy_from_slice(&self.alarm_set);

        for (i, label) in self.labels.iter().enumerate() {
            let packed = pack_label(label);
            buf[LABELS_OFFSET + i * 8..LABELS_OFFSET + i * 8 + 8].copy_from_slice(&packed);
        }

        buf[RESET_HI_LO_OFFSET] = self.reset_hi_lo as u8;

        let sum: u32 = buf[CHECKSUM_SUM_START..CHECKSUM_SUM_END]
            .iter()
            .map(|&b| b as u32)
            .sum();
        let cs = (sum + 7) as u16;
        buf[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].copy_from_slice(&cs.to_be_bytes());
        buf
    }

    fn compute_checksum(&self) -> u16 {
        let buf = self.encode();
        let sum: u32 = buf[CHECKSUM_SUM_START..CHECKSUM_SUM_END]
            .iter()
            .map(|&b| b as u32)
            .sum();
        (sum + 7) as u16
    }

    /// Recompute `out_buf_cs` from the current desired values and report
    /// whether it differs from the last-read `in_buf_cs`.
    pub fn test_config_changed(&mut self) -> bool {
        self.out_buf_cs = self.compute_checksum();
        self.out_buf_cs != self.in_buf_cs
    }

    /// Apply a caller-requested label rename. Refuses to rename a slot
    /// reporting [`NO_SENSOR_LABEL`] ("no sensor present").
    pub fn set_sensor_text(&mut self, channel: usize, text: &str) -> Result<()> {
        if channel >= NUM_REMOTE_CHANNELS {
            return Err(Error::BufferTooShort {
                needed: channel + 1,
                len: NUM_REMOTE_CHANNELS,
            });
        }
        if self.labels[channel] == NO_SENSOR_LABEL {
            return Err(Error::BadResponse);
        }
        let mut upper = text.to_uppercase();
        upper.truncate(10);
        while upper.chars().count() < 10 {
            upper.push('!');
        }
        self.labels[channel] = upper;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_formula_matches_invariant() {
        let mut buf = [0u8; PAYLOAD_LEN];
        buf[2] = HistoryInterval::Min15 as u8;
        let sum: u32 = buf[CHECKSUM_SUM_START..CHECKSUM_SUM_END]
            .iter()
            .map(|&b| b as u32)
            .sum();
        buf[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2]
            .copy_from_slice(&((sum as u16) + 7).to_be_bytes());
        let mut cfg = StationConfig::decode(&buf).unwrap();
        assert!(!cfg.test_config_changed());
    }

    #[test]
    fn interval_clamp_forces_five_minutes() {
        assert_eq!(HistoryInterval::Min30.clamped(), HistoryInterval::Min5);
        assert_eq!(HistoryInterval::Min1.clamped(), HistoryInterval::Min1);
    }

    #[test]
    fn set_sensor_text_refuses_no_sensor_slot() {
        // " E@@      ": space, E, then two out-of-alphabet codes that
        // decode to '@', then seven spaces. Written directly as 6-bit
        // codes since '@' has no `CHARSTR` entry to pack from.
        let space = crate::codec::CHARSTR.find(' ').unwrap() as u32;
        let e = crate::codec::CHARSTR.find('E').unwrap() as u32;
        let mut no_sensor = [0u8; 8];
        let values = [space, e, 63, 63, space, space, space, space, space, space];
        for (i, &v) in values.iter().enumerate() {
            let bit_offset = i * 6;
            for b in 0..6 {
                let bit = bit_offset + b;
                let byte = bit / 8;
                let shift = 7 - (bit % 8);
                if (v >> (5 - b)) & 1 == 1 {
                    no_sensor[byte] |= 1 << shift;
                }
            }
        }

        let mut buf = [0u8; PAYLOAD_LEN];
        buf[2] = HistoryInterval::Min15 as u8;
        for i in 0..NUM_REMOTE_CHANNELS {
            buf[LABELS_OFFSET + i * 8..LABELS_OFFSET + i * 8 + 8].copy_from_slice(&no_sensor);
        }
        let mut cfg = StationConfig::decode(&buf).unwrap();
        assert_eq!(cfg.labels[0], NO_SENSOR_LABEL);
        assert!(cfg.set_sensor_text(0, "KITCHEN").is_err());
    }

    #[test]
    fn nonzero_thresholds_round_trip_through_encode_decode() {
        let mut cfg = StationConfig::decode(&[0u8; PAYLOAD_LEN]).unwrap();
        for (i, t) in cfg.thresholds.iter_mut().enumerate() {
            let f = i as f32;
            t.temp_min = Temperature(-10.0 + f);
            t.temp_max = Temperature(30.0 + f);
            t.humidity_min = Humidity(20.0 + f);
            t.humidity_max = Humidity(80.0 - f);
        }
        let encoded = cfg.encode();
        let decoded = StationConfig::decode(&encoded).unwrap();
        for (i, (got, want)) in decoded.thresholds.iter().zip(cfg.thresholds.iter()).enumerate() {
            assert!(
                (got.temp_min.0 - want.temp_min.0).abs() < 0.05,
                "channel {i} temp_min"
            );
            assert!(
                (got.temp_max.0 - want.temp_max.0).abs() < 0.05,
                "channel {i} temp_max"
            );
            assert!(
                (got.humidity_min.0 - want.humidity_min.0).abs() < 0.05,
                "channel {i} humidity_min"
            );
            assert!(
                (got.humidity_max.0 - want.humidity_max.0).abs() < 0.05,
                "channel {i} humidity_max"
            );
        }
    }

    #[test]
    fn scenario_desired_interval_clamps_on_encode() {
        let mut cfg = StationConfig::decode(&[0u8; PAYLOAD_LEN]).unwrap();
        cfg.history_interval = HistoryInterval::Min30;
        let encoded = cfg.encode();
        assert_eq!(encoded[2], HistoryInterval::Min5 as u8);
    }

    #[test]
    fn timezone_round_trip() {
        assert_eq!(decode_timezone(encode_timezone(5)), 5);
        assert_eq!(decode_timezone(encode_timezone(-3)), -3);
    }
}
