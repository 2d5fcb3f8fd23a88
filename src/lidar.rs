// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common types shared by the scan assembly pipeline.
//!
//! This module holds the crate-wide [`Error`] type, the [`ReturnIndex`]
//! selector used for dual-return sensor profiles and the per-call
//! [`CloudOptions`] policy.

use crate::scan::ChannelField;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common error type for scan assembly operations
///
/// Every fallible operation in the crate reports through this enum. Errors
/// are raised before any caller-owned output is modified, so an `Err` always
/// means "no usable output produced".
#[derive(Debug)]
pub enum Error {
    /// I/O error (file operations in the command line tool)
    Io(std::io::Error),
    /// JSON decoding error
    Json(serde_json::Error),
    /// Shape error from ndarray operations
    Shape(ndarray::ShapeError),
    /// System time error
    SystemTime(std::time::SystemTimeError),
    /// Channel field has no primary/secondary return mapping
    UnsupportedChannel(ChannelField),
    /// Return index other than 0 (first) or 1 (second)
    UnsupportedReturn(usize),
    /// Grid, scan, lookup table or image dimensions disagree as
    /// `(rows, columns)`. A row shift table is sized `(entries, 1)`.
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// Number of column timestamps differs from the scan width
    TimestampMismatch { width: usize, timestamps: usize },
}

impl Error {
    /// Shift table with `shifts` entries for a grid of `rows` rows.
    pub(crate) fn shift_table(rows: usize, shifts: usize) -> Self {
        Error::DimensionMismatch {
            expected: (rows, 1),
            actual: (shifts, 1),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "json error: {}", err),
            Error::Shape(err) => write!(f, "shape error: {}", err),
            Error::SystemTime(err) => write!(f, "system time error: {}", err),
            Error::UnsupportedChannel(field) => write!(f, "unsupported channel: {}", field),
            Error::UnsupportedReturn(index) => write!(f, "unsupported return index: {}", index),
            Error::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Error::TimestampMismatch { width, timestamps } => write!(
                f,
                "scan width does not match timestamps: {} columns, {} timestamps",
                width, timestamps
            ),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err)
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(err: std::time::SystemTimeError) -> Self {
        Error::SystemTime(err)
    }
}

/// Which return to read on dual-return sensor profiles.
///
/// Single-return profiles only populate the first return; selecting the
/// second return on such a scan yields zero-filled channels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReturnIndex {
    /// Strongest (primary) return
    #[default]
    First,
    /// Second strongest return
    Second,
}

impl ReturnIndex {
    /// True when the secondary return channels should be read.
    #[inline]
    pub fn is_second(self) -> bool {
        self == ReturnIndex::Second
    }
}

impl TryFrom<usize> for ReturnIndex {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(ReturnIndex::First),
            1 => Ok(ReturnIndex::Second),
            other => Err(Error::UnsupportedReturn(other)),
        }
    }
}

impl fmt::Display for ReturnIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReturnIndex::First => write!(f, "first"),
            ReturnIndex::Second => write!(f, "second"),
        }
    }
}

/// Per-call policy for turning a scan into a point cloud.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudOptions {
    /// Return to read on dual-return profiles.
    pub return_index: ReturnIndex,
    /// Also produce a destaggered copy of the assembled cloud.
    pub destagger: bool,
    /// Set the position of zero-range cells to NaN instead of leaving them
    /// at the lookup table offset.
    pub mark_no_return: bool,
}

/// Get current timestamp in nanoseconds.
///
/// On Linux, uses `CLOCK_REALTIME` so the value can stamp published
/// messages. On other platforms, falls back to `SystemTime`.
#[cfg(target_os = "linux")]
pub fn timestamp() -> Result<u64, Error> {
    let mut tp = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let err = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut tp) };
    if err != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(tp.tv_sec as u64 * 1_000_000_000 + tp.tv_nsec as u64)
}

#[cfg(not(target_os = "linux"))]
pub fn timestamp() -> Result<u64, Error> {
    let now = std::time::SystemTime::now();
    let duration = now.duration_since(std::time::UNIX_EPOCH)?;
    Ok(duration.as_nanos() as u64)
}
