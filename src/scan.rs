// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Lidar scan container and return-aware channel selection.
//!
//! A [`LidarScan`] is one full frame of per-pixel channel images laid out as
//! `height` beam rows by `width` measurement columns, plus one timestamp per
//! column. The channels a scan carries depend on the sensor's UDP profile:
//! dual-return profiles populate `RANGE2`/`SIGNAL2`/`REFLECTIVITY2`, low
//! bandwidth profiles may omit `SIGNAL` or `NEAR_IR` entirely.
//!
//! ```text
//!            column v (measurement id) ──►
//!          ┌────┬────┬────┬────┬─────┐
//!  row u   │    │    │    │    │ ... │   RANGE    u32
//!  (beam)  ├────┼────┼────┼────┼─────┤   SIGNAL   u16
//!    │     │    │    │    │    │ ... │   REFLECT  u8
//!    ▼     └────┴────┴────┴────┴─────┘   NEAR_IR  u16
//!           ts0  ts1  ts2  ts3  ...      timestamps[v]
//! ```

use crate::lidar::Error;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::debug;

/// Channel identifiers as reported by the sensor.
///
/// Serialized names match the sensor metadata (`RANGE2`, `NEAR_IR`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelField {
    Range,
    Range2,
    Signal,
    Signal2,
    Reflectivity,
    Reflectivity2,
    NearIr,
    Flags,
    Flags2,
    Raw32Word1,
}

impl ChannelField {
    /// Numeric width the sensor natively reports this channel in.
    pub fn native_type(self) -> FieldType {
        match self {
            ChannelField::Range | ChannelField::Range2 => FieldType::U32,
            ChannelField::Signal | ChannelField::Signal2 => FieldType::U16,
            ChannelField::Reflectivity | ChannelField::Reflectivity2 => FieldType::U8,
            ChannelField::NearIr => FieldType::U16,
            ChannelField::Flags | ChannelField::Flags2 => FieldType::U8,
            ChannelField::Raw32Word1 => FieldType::U32,
        }
    }
}

impl fmt::Display for ChannelField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ChannelField::Range => "RANGE",
            ChannelField::Range2 => "RANGE2",
            ChannelField::Signal => "SIGNAL",
            ChannelField::Signal2 => "SIGNAL2",
            ChannelField::Reflectivity => "REFLECTIVITY",
            ChannelField::Reflectivity2 => "REFLECTIVITY2",
            ChannelField::NearIr => "NEAR_IR",
            ChannelField::Flags => "FLAGS",
            ChannelField::Flags2 => "FLAGS2",
            ChannelField::Raw32Word1 => "RAW32_WORD1",
        };
        write!(f, "{}", name)
    }
}

/// Storage type of a channel image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    U8,
    U16,
    U32,
    U64,
}

/// Sample types a channel image can be read as.
///
/// Conversion follows `as` semantics: widening is lossless, narrowing keeps
/// the low bits (see [`crate::cloud::narrow`]).
pub trait ChannelValue: Copy + Default + Send + Sync + 'static {
    fn from_u64(value: u64) -> Self;
}

macro_rules! channel_value {
    ($($t:ty),*) => {
        $(impl ChannelValue for $t {
            #[inline]
            fn from_u64(value: u64) -> Self {
                value as $t
            }
        })*
    };
}

channel_value!(u8, u16, u32, u64);

/// Typed `height x width` channel image.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldImage {
    U8(Array2<u8>),
    U16(Array2<u16>),
    U32(Array2<u32>),
    U64(Array2<u64>),
}

impl FieldImage {
    /// Build an image of storage type `kind` from row-major samples.
    ///
    /// Samples are converted with [`ChannelValue::from_u64`].
    pub fn from_samples(
        kind: FieldType,
        height: usize,
        width: usize,
        samples: Vec<u64>,
    ) -> Result<Self, Error> {
        let img = Array2::from_shape_vec((height, width), samples)?;
        Ok(match kind {
            FieldType::U8 => FieldImage::U8(img.mapv(u8::from_u64)),
            FieldType::U16 => FieldImage::U16(img.mapv(u16::from_u64)),
            FieldType::U32 => FieldImage::U32(img.mapv(u32::from_u64)),
            FieldType::U64 => FieldImage::U64(img),
        })
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldImage::U8(_) => FieldType::U8,
            FieldImage::U16(_) => FieldType::U16,
            FieldImage::U32(_) => FieldType::U32,
            FieldImage::U64(_) => FieldType::U64,
        }
    }

    /// Image dimensions as `(rows, columns)`.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            FieldImage::U8(img) => img.dim(),
            FieldImage::U16(img) => img.dim(),
            FieldImage::U32(img) => img.dim(),
            FieldImage::U64(img) => img.dim(),
        }
    }

    /// Copy the image into a new array of sample type `T`.
    pub fn cast<T: ChannelValue>(&self) -> Array2<T> {
        match self {
            FieldImage::U8(img) => img.mapv(|v| T::from_u64(v as u64)),
            FieldImage::U16(img) => img.mapv(|v| T::from_u64(v as u64)),
            FieldImage::U32(img) => img.mapv(|v| T::from_u64(v as u64)),
            FieldImage::U64(img) => img.mapv(T::from_u64),
        }
    }
}

impl From<Array2<u8>> for FieldImage {
    fn from(img: Array2<u8>) -> Self {
        FieldImage::U8(img)
    }
}

impl From<Array2<u16>> for FieldImage {
    fn from(img: Array2<u16>) -> Self {
        FieldImage::U16(img)
    }
}

impl From<Array2<u32>> for FieldImage {
    fn from(img: Array2<u32>) -> Self {
        FieldImage::U32(img)
    }
}

impl From<Array2<u64>> for FieldImage {
    fn from(img: Array2<u64>) -> Self {
        FieldImage::U64(img)
    }
}

/// One frame of staggered channel data.
///
/// Invariants enforced at construction: `timestamps.len() == width` and every
/// channel image is exactly `height x width`.
#[derive(Clone, Debug, PartialEq)]
pub struct LidarScan {
    height: usize,
    width: usize,
    timestamps: Vec<u64>,
    fields: BTreeMap<ChannelField, FieldImage>,
}

impl LidarScan {
    /// Create an empty scan with one timestamp (nanoseconds) per column.
    pub fn new(height: usize, width: usize, timestamps: Vec<u64>) -> Result<Self, Error> {
        if timestamps.len() != width {
            return Err(Error::TimestampMismatch {
                width,
                timestamps: timestamps.len(),
            });
        }

        Ok(Self {
            height,
            width,
            timestamps,
            fields: BTreeMap::new(),
        })
    }

    /// Add or replace a channel image.
    pub fn insert_field(
        &mut self,
        field: ChannelField,
        image: impl Into<FieldImage>,
    ) -> Result<(), Error> {
        let image = image.into();
        if image.dim() != (self.height, self.width) {
            return Err(Error::DimensionMismatch {
                expected: (self.height, self.width),
                actual: image.dim(),
            });
        }
        self.fields.insert(field, image);
        Ok(())
    }

    /// Builder form of [`Self::insert_field`].
    pub fn with_field(
        mut self,
        field: ChannelField,
        image: impl Into<FieldImage>,
    ) -> Result<Self, Error> {
        self.insert_field(field, image)?;
        Ok(self)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Per-column measurement timestamps in nanoseconds.
    #[inline]
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Storage type of `field`, or `None` when the profile did not populate
    /// it.
    pub fn field_type(&self, field: ChannelField) -> Option<FieldType> {
        self.fields.get(&field).map(FieldImage::field_type)
    }

    pub fn field_image(&self, field: ChannelField) -> Option<&FieldImage> {
        self.fields.get(&field)
    }

    /// Read `field` as sample type `T`, or `None` when absent.
    pub fn field<T: ChannelValue>(&self, field: ChannelField) -> Option<Array2<T>> {
        self.fields.get(&field).map(FieldImage::cast)
    }

    /// Iterate the populated channels in identifier order.
    pub fn fields(&self) -> impl Iterator<Item = ChannelField> + '_ {
        self.fields.keys().copied()
    }

    /// Timestamp of the first column that carries one.
    ///
    /// Columns outside the azimuth window are reported with a zero
    /// timestamp; the first valid column is the conventional scan reference.
    /// Returns 0 when no column is valid.
    pub fn reference_timestamp(&self) -> u64 {
        self.timestamps
            .iter()
            .copied()
            .find(|&ts| ts != 0)
            .unwrap_or(0)
    }
}

/// Map a channel and return selection to the concrete channel to read.
///
/// Any member of a channel family (`RANGE`/`RANGE2`, ...) maps to the first
/// or second return variant of that family. `NEAR_IR` has no second return
/// and always maps to itself. Other channels have no such mapping and yield
/// [`Error::UnsupportedChannel`].
pub fn suitable_return(field: ChannelField, second: bool) -> Result<ChannelField, Error> {
    use ChannelField::*;

    match field {
        Range | Range2 => Ok(if second { Range2 } else { Range }),
        Signal | Signal2 => Ok(if second { Signal2 } else { Signal }),
        Reflectivity | Reflectivity2 => Ok(if second { Reflectivity2 } else { Reflectivity }),
        NearIr => Ok(NearIr),
        other => Err(Error::UnsupportedChannel(other)),
    }
}

/// Read `field` as `T`, substituting a zero image when the scan lacks it.
pub fn get_or_fill_zero<T: ChannelValue>(field: ChannelField, scan: &LidarScan) -> Array2<T> {
    match scan.field(field) {
        Some(img) => img,
        None => {
            debug!(%field, "channel absent from scan, filling with zeros");
            Array2::from_elem((scan.height(), scan.width()), T::default())
        }
    }
}
