// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Row destaggering and its consistency check.
//!
//! Beams fire in sequence and are mounted at different azimuth offsets, so
//! in measurement order the same column index points in a slightly
//! different direction for every row. The sensor metadata reports this as
//! `pixel_shift_by_row`. Destaggering rotates each row left by its shift:
//!
//! ```text
//! shift = 2    staggered  [a b c d]  ──►  [c d a b]  destaggered
//!              dst[k] = src[(shift + k) mod width]
//! ```
//!
//! Every row is an independent circular rotation: no sample is dropped or
//! duplicated and rows are processed in parallel.

use crate::{cloud::PointCloud, lidar::Error};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Zip, parallel::prelude::*};
use std::fmt;
use tracing::{instrument, warn};

/// Left rotation applied to a row of `width` columns for `shift`.
///
/// Shifts are reduced modulo the width so negative or oversized values are
/// accepted. A zero width yields zero.
#[inline]
pub fn row_offset(shift: i32, width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    (shift as i64).rem_euclid(width as i64) as usize
}

fn rotate_rows<T>(
    image: ArrayView2<'_, T>,
    pixel_shift_by_row: &[i32],
    inverse: bool,
) -> Result<Array2<T>, Error>
where
    T: Clone + Send + Sync,
{
    let (height, width) = image.dim();
    if pixel_shift_by_row.len() != height {
        return Err(Error::shift_table(height, pixel_shift_by_row.len()));
    }

    let mut out = image.to_owned();
    if width == 0 {
        return Ok(out);
    }

    Zip::from(out.rows_mut())
        .and(image.rows())
        .and(ArrayView1::from(pixel_shift_by_row))
        .par_for_each(|mut dst, src, &shift| {
            let offset = match row_offset(shift, width) {
                offset if inverse => (width - offset) % width,
                offset => offset,
            };
            for (k, d) in dst.iter_mut().enumerate() {
                *d = src[(offset + k) % width].clone();
            }
        });

    Ok(out)
}

/// Destagger a channel image (or any per-pixel grid).
pub fn destagger_image<T>(
    image: ArrayView2<'_, T>,
    pixel_shift_by_row: &[i32],
) -> Result<Array2<T>, Error>
where
    T: Clone + Send + Sync,
{
    rotate_rows(image, pixel_shift_by_row, false)
}

/// Inverse of [`destagger_image`]: restores measurement order.
pub fn stagger_image<T>(
    image: ArrayView2<'_, T>,
    pixel_shift_by_row: &[i32],
) -> Result<Array2<T>, Error>
where
    T: Clone + Send + Sync,
{
    rotate_rows(image, pixel_shift_by_row, true)
}

/// Destagger a point cloud into a new cloud of the same dimensions.
#[instrument(skip_all, fields(height = cloud.height(), width = cloud.width()))]
pub fn destagger(cloud: &PointCloud, pixel_shift_by_row: &[i32]) -> Result<PointCloud, Error> {
    destagger_image(cloud.points(), pixel_shift_by_row).map(PointCloud::from_points)
}

/// Inverse of [`destagger`].
#[instrument(skip_all, fields(height = cloud.height(), width = cloud.width()))]
pub fn stagger(cloud: &PointCloud, pixel_shift_by_row: &[i32]) -> Result<PointCloud, Error> {
    stagger_image(cloud.points(), pixel_shift_by_row).map(PointCloud::from_points)
}

/// Angle checked by the destagger validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AngleKind {
    /// `atan2(y, x)` along a row.
    Azimuth,
    /// `atan2(z, range)` down a column.
    Elevation,
}

impl fmt::Display for AngleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AngleKind::Azimuth => write!(f, "azimuth"),
            AngleKind::Elevation => write!(f, "elevation"),
        }
    }
}

/// Pair of neighbouring points whose angle increases where it should not.
///
/// `row`/`col` locate the first point of the pair; the second is one column
/// right for [`AngleKind::Azimuth`] and one row down for
/// [`AngleKind::Elevation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Violation {
    pub kind: AngleKind,
    pub row: usize,
    pub col: usize,
    pub current: f32,
    pub next: f32,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} increases at row {} col {}: {} -> {}",
            self.kind, self.row, self.col, self.current, self.next
        )
    }
}

#[inline]
fn azimuth(x: f32, y: f32) -> f32 {
    y.atan2(x)
}

#[inline]
fn elevation(z: f32, range: u32) -> f32 {
    z.atan2(range as f32)
}

/// Zero marks a missing return and is never compared. NaN compares false.
#[inline]
fn increases(current: f32, next: f32) -> bool {
    current != 0.0 && next != 0.0 && current < next
}

/// Check that a destaggered cloud is ordered in azimuth and elevation.
///
/// Walking each row left to right the azimuth must not increase, walking
/// each column top to bottom the elevation must not increase. Violations
/// are logged and returned, an empty result means the cloud is consistent.
/// Advisory only: nothing here rejects the data.
#[instrument(skip_all, fields(height = cloud.height(), width = cloud.width()))]
pub fn validate_destagger(cloud: &PointCloud) -> Vec<Violation> {
    let points = cloud.points();

    let mut violations: Vec<Violation> = points
        .axis_iter(Axis(0))
        .into_par_iter()
        .enumerate()
        .flat_map_iter(|(row, pts)| {
            pts.windows(2)
                .into_iter()
                .enumerate()
                .filter_map(move |(col, pair)| {
                    let current = azimuth(pair[0].x, pair[0].y);
                    let next = azimuth(pair[1].x, pair[1].y);
                    increases(current, next).then_some(Violation {
                        kind: AngleKind::Azimuth,
                        row,
                        col,
                        current,
                        next,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let by_column: Vec<Violation> = points
        .axis_iter(Axis(1))
        .into_par_iter()
        .enumerate()
        .flat_map_iter(|(col, pts)| {
            pts.windows(2)
                .into_iter()
                .enumerate()
                .filter_map(move |(row, pair)| {
                    let current = elevation(pair[0].z, pair[0].range);
                    let next = elevation(pair[1].z, pair[1].range);
                    increases(current, next).then_some(Violation {
                        kind: AngleKind::Elevation,
                        row,
                        col,
                        current,
                        next,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();

    violations.extend(by_column);

    for v in &violations {
        warn!(kind = %v.kind, row = v.row, col = v.col, current = v.current, next = v.next, "destagger check failed");
    }

    violations
}

/// True when [`validate_destagger`] reports nothing.
pub fn is_destaggered(cloud: &PointCloud) -> bool {
    validate_destagger(cloud).is_empty()
}
