// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Core error type.
//!
//! The driver's protocol engine uses a hand-rolled enum rather than
//! `thiserror` so that matching on a specific failure mode (as the
//! communication service does when deciding whether to retry) does not
//! require importing a derive macro's generated code. The config and CLI
//! layers, which only ever propagate errors upward, use `thiserror`
//! instead (see `config::ConfigError`).

use std::fmt;

#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // USB / transport errors
    // ========================================================================
    /// Underlying `rusb` call failed.
    Usb(rusb::Error),
    /// No transceiver matching the requested vendor/product/serial was found.
    DeviceNotFound,
    /// A control transfer returned fewer bytes than the operation requires.
    ShortRead { expected: usize, actual: usize },

    // ========================================================================
    // Codec / decode errors
    // ========================================================================
    /// A nibble or byte offset fell outside the supplied buffer.
    BufferTooShort { needed: usize, len: usize },
    /// A frame's declared length did not match what its type expects.
    LengthMismatch { expected: usize, actual: usize },

    // ========================================================================
    // Protocol errors
    // ========================================================================
    /// Frame length inconsistent with its type, or an unrecognized type.
    BadResponse,
    /// Buffer id is a paired device id, but not the one we registered.
    UnknownDeviceId,

    // ========================================================================
    // State errors
    // ========================================================================
    /// Operation requires a running RF worker, but none is active.
    NotRunning,
    /// Worker thread panicked or failed to join within its teardown bound.
    WorkerJoinFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usb(e) => write!(f, "usb transfer failed: {e}"),
            Self::DeviceNotFound => write!(f, "no matching transceiver found"),
            Self::ShortRead { expected, actual } => {
                write!(f, "short read: expected {expected} bytes, got {actual}")
            }
            Self::BufferTooShort { needed, len } => {
                write!(f, "buffer too short: needed {needed} bytes, have {len}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "frame length mismatch: expected {expected}, got {actual}")
            }
            Self::BadResponse => write!(f, "bad response frame"),
            Self::UnknownDeviceId => write!(f, "unknown device id"),
            Self::NotRunning => write!(f, "rf worker is not running"),
            Self::WorkerJoinFailed => write!(f, "rf worker did not join cleanly"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usb(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusb::Error> for Error {
    fn from(e: rusb::Error) -> Self {
        Self::Usb(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
