// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Organized point cloud assembly.
//!
//! Turns a [`LidarScan`] into a `height x width` [`PointCloud`]: positions
//! come from projecting the selected range channel through the [`XyzLut`],
//! the remaining point fields are copied from the selected channels and the
//! per-column timestamps.
//!
//! The caller owns the destination cloud. [`assemble_into`] validates every
//! input before touching it, so on error the cloud is left exactly as it
//! was. Cells are independent of each other and rows are filled in
//! parallel.

use crate::{
    destagger::destagger,
    lidar::{CloudOptions, Error, ReturnIndex},
    lut::{XyzLut, cartesian},
    scan::{ChannelField, LidarScan, get_or_fill_zero, suitable_return},
};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis, parallel::prelude::*};
use tracing::{debug, instrument};

/// A single organized lidar point.
///
/// Field layout matches the point type published by the Ouster ROS driver
/// (minus its SSE padding), see [`crate::formats::ouster_point_fields`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Signal photons of the selected return.
    pub intensity: f32,
    /// Nanoseconds from the scan reference timestamp.
    pub t: u32,
    pub reflectivity: u16,
    /// Beam row the point was measured by.
    pub ring: u16,
    /// Near infrared photons (ambient light).
    pub ambient: u16,
    /// Raw range in millimeters, 0 when there was no return.
    pub range: u32,
}

/// Explicit narrowing steps from channel/projection precision to [`Point`]
/// storage.
pub mod narrow {
    /// Double to single precision, round to nearest.
    ///
    /// At 100m the f32 spacing is ~8µm in meters or ~8mm in millimeters,
    /// which bounds the precision given up for half the memory.
    #[inline]
    pub fn position(value: f64) -> f32 {
        value as f32
    }

    /// Photon count to float, nearest representable value. Exact below
    /// 2^24.
    #[inline]
    pub fn intensity(value: u32) -> f32 {
        value as f32
    }

    /// Truncates to the low 16 bits. Sensor profiles never carry more than
    /// 16 bits of calibrated reflectivity.
    #[inline]
    pub fn reflectivity(value: u32) -> u16 {
        value as u16
    }

    /// Truncates to the low 16 bits, like [`reflectivity`].
    #[inline]
    pub fn ambient(value: u32) -> u16 {
        value as u16
    }

    /// Truncates to the low 16 bits. Sensors have at most 128 beams, so a
    /// larger row index is a configuration error upstream.
    #[inline]
    pub fn ring(row: usize) -> u16 {
        row as u16
    }

    /// Two's-complement wrap into the unsigned `t` field. Negative offsets
    /// (a column stamped before the reference) come out as large values.
    #[inline]
    pub fn timestamp(offset: i64) -> u32 {
        offset as u32
    }
}

/// Column timestamp relative to the scan reference.
///
/// The offset is clamped from above by the reference itself, which bounds
/// the result when a column carries a bogus timestamp. There is no lower
/// clamp.
#[inline]
pub fn relative_timestamp(column_ts: u64, scan_ts: u64) -> i64 {
    let scan_ts = scan_ts as i64;
    (column_ts as i64).wrapping_sub(scan_ts).min(scan_ts)
}

/// Organized `height x width` point grid, row `u` is the beam and column
/// `v` the measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    points: Array2<Point>,
}

impl PointCloud {
    /// Create a zeroed cloud.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            points: Array2::default((height, width)),
        }
    }

    /// Wrap an existing point grid.
    pub fn from_points(points: Array2<Point>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.points.nrows()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.points.ncols()
    }

    /// Dimensions as `(height, width)`.
    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.points.dim()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at beam `row`, measurement `col`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&Point> {
        self.points.get((row, col))
    }

    #[inline]
    pub fn points(&self) -> ArrayView2<'_, Point> {
        self.points.view()
    }

    #[inline]
    pub fn points_mut(&mut self) -> ArrayViewMut2<'_, Point> {
        self.points.view_mut()
    }

    /// Points in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Reshape to `height x width`. Existing storage is kept when the
    /// dimensions already match, otherwise the cloud is reallocated zeroed.
    pub fn resize(&mut self, height: usize, width: usize) {
        if self.dim() != (height, width) {
            self.points = Array2::default((height, width));
        }
    }

    pub fn into_points(self) -> Array2<Point> {
        self.points
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Assemble a new cloud from `scan`.
///
/// `scan_ts` is the reference the per-point `t` field is relative to,
/// usually [`LidarScan::reference_timestamp`].
pub fn assemble(
    scan: &LidarScan,
    lut: &XyzLut,
    scan_ts: u64,
    return_index: ReturnIndex,
) -> Result<PointCloud, Error> {
    let mut cloud = PointCloud::new(scan.height(), scan.width());
    let options = CloudOptions {
        return_index,
        ..Default::default()
    };
    assemble_into(&mut cloud, scan, lut, scan_ts, &options)?;
    Ok(cloud)
}

/// Assemble `scan` into a caller-owned cloud, resizing it when its
/// dimensions differ from the scan.
///
/// Channels missing from the scan read as zero. On error `cloud` is left
/// untouched.
#[instrument(skip_all, fields(height = scan.height(), width = scan.width()))]
pub fn assemble_into(
    cloud: &mut PointCloud,
    scan: &LidarScan,
    lut: &XyzLut,
    scan_ts: u64,
    options: &CloudOptions,
) -> Result<(), Error> {
    let second = options.return_index.is_second();

    let range = get_or_fill_zero::<u32>(suitable_return(ChannelField::Range, second)?, scan);
    let signal = get_or_fill_zero::<u32>(suitable_return(ChannelField::Signal, second)?, scan);
    let reflectivity =
        get_or_fill_zero::<u32>(suitable_return(ChannelField::Reflectivity, second)?, scan);
    let near_ir = get_or_fill_zero::<u32>(suitable_return(ChannelField::NearIr, second)?, scan);

    let xyz = cartesian(range.view(), lut)?;

    if cloud.dim() != (scan.height(), scan.width()) {
        debug!(
            from = ?cloud.dim(),
            to = ?(scan.height(), scan.width()),
            "resizing point cloud"
        );
        cloud.resize(scan.height(), scan.width());
    }

    let timestamps = scan.timestamps();
    let mark_no_return = options.mark_no_return;

    cloud
        .points
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(u, mut row)| {
            for (v, pt) in row.iter_mut().enumerate() {
                let rg = range[[u, v]];
                let [x, y, z] = if mark_no_return && rg == 0 {
                    [f32::NAN; 3]
                } else {
                    xyz[[u, v]].map(narrow::position)
                };
                let t = relative_timestamp(timestamps[v], scan_ts);

                *pt = Point {
                    x,
                    y,
                    z,
                    intensity: narrow::intensity(signal[[u, v]]),
                    t: narrow::timestamp(t),
                    reflectivity: narrow::reflectivity(reflectivity[[u, v]]),
                    ring: narrow::ring(u),
                    ambient: narrow::ambient(near_ir[[u, v]]),
                    range: rg,
                };
            }
        });

    Ok(())
}

/// Assemble a cloud and, when `options.destagger` is set, its destaggered
/// copy.
///
/// The staggered cloud keeps measurement order (column = firing time), the
/// destaggered one has columns aligned in azimuth across all beams.
pub fn scan_to_cloud(
    scan: &LidarScan,
    lut: &XyzLut,
    scan_ts: u64,
    pixel_shift_by_row: &[i32],
    options: &CloudOptions,
) -> Result<(PointCloud, Option<PointCloud>), Error> {
    if options.destagger && pixel_shift_by_row.len() != scan.height() {
        return Err(Error::shift_table(scan.height(), pixel_shift_by_row.len()));
    }

    let mut cloud = PointCloud::new(scan.height(), scan.width());
    assemble_into(&mut cloud, scan, lut, scan_ts, options)?;

    let destaggered = match options.destagger {
        true => Some(destagger(&cloud, pixel_shift_by_row)?),
        false => None,
    };

    Ok((cloud, destaggered))
}
