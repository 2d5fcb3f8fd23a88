// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Range to Cartesian projection through a precomputed lookup table.
//!
//! The sensor calibration (beam altitude/azimuth angles, beam origin offset,
//! encoder layout) is folded once into a per-pixel unit direction and a
//! per-pixel offset. Projecting a range image is then a fused
//! multiply-add per axis:
//!
//! ```text
//! xyz(u, v) = direction(u, v) * range(u, v) + offset(u, v)
//! ```
//!
//! The table is immutable after construction and is shared read-only
//! between any number of concurrent assembly calls (wrap it in an `Arc`).

use crate::lidar::Error;
use ndarray::{Array2, ArrayView2, Zip};

/// Per-pixel direction and offset table for one sensor mode.
#[derive(Clone, Debug, PartialEq)]
pub struct XyzLut {
    direction: Array2<[f64; 3]>,
    offset: Array2<[f64; 3]>,
}

impl XyzLut {
    /// Build a table from `height x width` direction and offset arrays.
    pub fn new(direction: Array2<[f64; 3]>, offset: Array2<[f64; 3]>) -> Result<Self, Error> {
        if direction.dim() != offset.dim() {
            return Err(Error::DimensionMismatch {
                expected: direction.dim(),
                actual: offset.dim(),
            });
        }
        Ok(Self { direction, offset })
    }

    /// Build a table from row-major vectors of `height * width` entries.
    pub fn from_vecs(
        height: usize,
        width: usize,
        direction: Vec<[f64; 3]>,
        offset: Vec<[f64; 3]>,
    ) -> Result<Self, Error> {
        let direction = Array2::from_shape_vec((height, width), direction)?;
        let offset = Array2::from_shape_vec((height, width), offset)?;
        Self::new(direction, offset)
    }

    /// Table dimensions as `(rows, columns)`.
    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.direction.dim()
    }

    #[inline]
    pub fn direction(&self) -> ArrayView2<'_, [f64; 3]> {
        self.direction.view()
    }

    #[inline]
    pub fn offset(&self) -> ArrayView2<'_, [f64; 3]> {
        self.offset.view()
    }

    pub(crate) fn check_dim(&self, dim: (usize, usize)) -> Result<(), Error> {
        if self.dim() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: self.dim(),
            });
        }
        Ok(())
    }
}

/// Project a range image into per-pixel Cartesian coordinates.
///
/// Computed in double precision. Zero-range pixels land on their offset;
/// deciding what a missing return means is left to the caller.
pub fn cartesian(range: ArrayView2<'_, u32>, lut: &XyzLut) -> Result<Array2<[f64; 3]>, Error> {
    lut.check_dim(range.dim())?;

    let mut points = Array2::from_elem(range.dim(), [0.0f64; 3]);
    Zip::from(&mut points)
        .and(range)
        .and(&lut.direction)
        .and(&lut.offset)
        .par_for_each(|xyz, &r, dir, off| {
            let r = r as f64;
            *xyz = [
                dir[0] * r + off[0],
                dir[1] * r + off[1],
                dir[2] * r + off[2],
            ];
        });

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn lut_2x2() -> XyzLut {
        XyzLut::from_vecs(
            2,
            2,
            vec![
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.5, 0.25, 0.0],
            ],
            vec![
                [0.5, 0.0, 0.0],
                [0.0, 0.5, 0.0],
                [0.0, 0.0, 0.5],
                [1.0, 2.0, 3.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cartesian() {
        let lut = lut_2x2();
        let range = array![[10u32, 20], [30, 100]];
        let xyz = cartesian(range.view(), &lut).unwrap();

        assert_eq!(xyz[[0, 0]], [10.5, 0.0, 0.0]);
        assert_eq!(xyz[[0, 1]], [0.0, 20.5, 0.0]);
        assert_eq!(xyz[[1, 0]], [0.0, 0.0, 30.5]);
        assert_eq!(xyz[[1, 1]], [51.0, 27.0, 3.0]);
    }

    #[test]
    fn test_cartesian_zero_range_is_offset() {
        let lut = lut_2x2();
        let range = Array2::<u32>::zeros((2, 2));
        let xyz = cartesian(range.view(), &lut).unwrap();

        for (p, off) in xyz.iter().zip(lut.offset().iter()) {
            assert_eq!(p, off);
        }
    }

    #[test]
    fn test_cartesian_dimension_mismatch() {
        let lut = lut_2x2();
        let range = Array2::<u32>::zeros((2, 3));
        assert!(matches!(
            cartesian(range.view(), &lut),
            Err(Error::DimensionMismatch {
                expected: (2, 3),
                actual: (2, 2)
            })
        ));
    }

    #[test]
    fn test_lut_from_vecs() {
        let lut = XyzLut::from_vecs(1, 2, vec![[1.0; 3]; 2], vec![[0.0; 3]; 2]).unwrap();
        assert_eq!(lut.dim(), (1, 2));
        assert!(matches!(
            XyzLut::from_vecs(1, 2, vec![[1.0; 3]; 3], vec![[0.0; 3]; 2]),
            Err(Error::Shape(_))
        ));
        assert!(matches!(
            XyzLut::new(Array2::from_elem((1, 2), [0.0; 3]), Array2::from_elem((2, 1), [0.0; 3])),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
