// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Point cloud serialization into ROS `sensor_msgs/PointCloud2`.
//!
//! Organized clouds keep their grid shape: `height` is the number of beams
//! and `width` the number of columns, points are packed row-major.
//!
//! # Format
//!
//! ## 32-byte Ouster point
//! ```text
//! ┌───────┬───────┬───────┬───────────┬───────┬─────────┬────────┬─────────┬─────────┐
//! │ x:f32 │ y:f32 │ z:f32 │ intensity │ t:u32 │ reflect │ ring   │ ambient │ range   │
//! │ 4B    │ 4B    │ 4B    │ f32 4B    │ 4B    │ u16 2B  │ u16 2B │ u16 2B  │ u32 4B  │
//! └───────┴───────┴───────┴───────────┴───────┴─────────┴────────┴─────────┴─────────┘
//! ```

use crate::cloud::{Point, PointCloud};
use edgefirst_schemas::{
    builtin_interfaces::Time,
    sensor_msgs::{PointCloud2, PointField},
    std_msgs::Header,
};

/// Point field data types for PointCloud2 messages.
///
/// These values correspond to the ROS sensor_msgs/PointField datatype field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(dead_code)]
pub enum PointFieldType {
    INT8 = 1,
    UINT8 = 2,
    INT16 = 3,
    UINT16 = 4,
    INT32 = 5,
    UINT32 = 6,
    FLOAT32 = 7,
    FLOAT64 = 8,
}

/// Bytes per packed [`Point`].
pub const POINT_STEP: usize = 32;

fn field(name: &str, offset: u32, datatype: PointFieldType) -> PointField {
    PointField {
        name: String::from(name),
        offset,
        datatype: datatype as u8,
        count: 1,
    }
}

/// Build the point fields for the packed Ouster point (32-byte stride).
pub fn ouster_point_fields() -> Vec<PointField> {
    vec![
        field("x", 0, PointFieldType::FLOAT32),
        field("y", 4, PointFieldType::FLOAT32),
        field("z", 8, PointFieldType::FLOAT32),
        field("intensity", 12, PointFieldType::FLOAT32),
        field("t", 16, PointFieldType::UINT32),
        field("reflectivity", 20, PointFieldType::UINT16),
        field("ring", 22, PointFieldType::UINT16),
        field("ambient", 24, PointFieldType::UINT16),
        field("range", 28, PointFieldType::UINT32),
    ]
}

#[inline]
fn write_point(out: &mut [u8], pt: &Point) {
    out[0..4].copy_from_slice(&pt.x.to_le_bytes());
    out[4..8].copy_from_slice(&pt.y.to_le_bytes());
    out[8..12].copy_from_slice(&pt.z.to_le_bytes());
    out[12..16].copy_from_slice(&pt.intensity.to_le_bytes());
    out[16..20].copy_from_slice(&pt.t.to_le_bytes());
    out[20..22].copy_from_slice(&pt.reflectivity.to_le_bytes());
    out[22..24].copy_from_slice(&pt.ring.to_le_bytes());
    out[24..26].copy_from_slice(&pt.ambient.to_le_bytes());
    out[28..32].copy_from_slice(&pt.range.to_le_bytes());
}

/// Format a cloud into a pre-allocated buffer, row-major.
///
/// # Panics
///
/// Panics if `out` is shorter than `POINT_STEP * cloud.len()`.
pub fn format_cloud_into(cloud: &PointCloud, out: &mut [u8]) {
    assert!(out.len() >= POINT_STEP * cloud.len());

    for (pt, chunk) in cloud.iter().zip(out.chunks_exact_mut(POINT_STEP)) {
        write_point(chunk, pt);
    }
}

/// Format a cloud into a new packed buffer.
pub fn format_cloud(cloud: &PointCloud) -> Vec<u8> {
    let mut data = vec![0u8; POINT_STEP * cloud.len()];
    format_cloud_into(cloud, &mut data);
    data
}

/// Split a nanosecond timestamp into a ROS time.
///
/// Seconds past `i32::MAX` (January 2038) are clamped to `i32::MAX`.
pub fn time_from_nanos(ns: u64) -> Time {
    Time {
        sec: i32::try_from(ns / 1_000_000_000).unwrap_or(i32::MAX),
        nanosec: (ns % 1_000_000_000) as u32,
    }
}

/// Build an organized PointCloud2 message for `cloud`.
///
/// `is_dense` is false: zero-range cells are kept in place.
pub fn cloud_to_msg(cloud: &PointCloud, timestamp: u64, frame_id: &str) -> PointCloud2 {
    PointCloud2 {
        header: Header {
            stamp: time_from_nanos(timestamp),
            frame_id: frame_id.to_string(),
        },
        height: cloud.height() as u32,
        width: cloud.width() as u32,
        fields: ouster_point_fields(),
        is_bigendian: false,
        point_step: POINT_STEP as u32,
        row_step: (POINT_STEP * cloud.width()) as u32,
        data: format_cloud(cloud),
        is_dense: false,
    }
}

/// Consumer of completed clouds.
///
/// Publishing or storing the cloud is entirely up to the implementation.
pub trait CloudSink {
    type Error;

    fn send(&mut self, cloud: &PointCloud, timestamp: u64, frame_id: &str)
    -> Result<(), Self::Error>;
}

/// Sink collecting PointCloud2 messages in memory.
#[derive(Debug, Default)]
pub struct MessageSink {
    pub messages: Vec<PointCloud2>,
}

impl CloudSink for MessageSink {
    type Error = std::convert::Infallible;

    fn send(
        &mut self,
        cloud: &PointCloud,
        timestamp: u64,
        frame_id: &str,
    ) -> Result<(), Self::Error> {
        self.messages.push(cloud_to_msg(cloud, timestamp, frame_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn cloud_2x3() -> PointCloud {
        PointCloud::from_points(Array2::from_shape_fn((2, 3), |(u, v)| Point {
            x: v as f32,
            y: 10.0 + v as f32,
            z: 100.0 + u as f32,
            intensity: 0.5,
            t: (v * 1000) as u32,
            reflectivity: 65_535,
            ring: u as u16,
            ambient: 7,
            range: 123_456,
        }))
    }

    #[test]
    fn test_point_fields() {
        let fields = ouster_point_fields();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0].name, "x");
        assert_eq!(fields[4].name, "t");
        assert_eq!(fields[4].datatype, PointFieldType::UINT32 as u8);
        assert_eq!(fields[8].name, "range");
        assert_eq!(fields[8].offset as usize + 4, POINT_STEP);
    }

    #[test]
    fn test_time_from_nanos() {
        let t = time_from_nanos(1_700_000_000_123_456_789);
        assert_eq!((t.sec, t.nanosec), (1_700_000_000, 123_456_789));

        let t = time_from_nanos(i32::MAX as u64 * 1_000_000_000 + 5);
        assert_eq!((t.sec, t.nanosec), (i32::MAX, 5));

        // 2106, past the end of the signed 32-bit range
        let t = time_from_nanos(4_300_000_000 * 1_000_000_000);
        assert_eq!((t.sec, t.nanosec), (i32::MAX, 0));
    }

    #[test]
    fn test_format_cloud() {
        let cloud = cloud_2x3();
        let data = format_cloud(&cloud);
        assert_eq!(data.len(), 6 * POINT_STEP);

        // Row 1, column 2 is the last point
        let offset = 5 * POINT_STEP;
        let p = &data[offset..offset + POINT_STEP];
        assert_eq!(f32::from_le_bytes([p[0], p[1], p[2], p[3]]), 2.0);
        assert_eq!(f32::from_le_bytes([p[8], p[9], p[10], p[11]]), 101.0);
        assert_eq!(u32::from_le_bytes([p[16], p[17], p[18], p[19]]), 2000);
        assert_eq!(u16::from_le_bytes([p[20], p[21]]), 65_535);
        assert_eq!(u16::from_le_bytes([p[22], p[23]]), 1);
        assert_eq!(u32::from_le_bytes([p[28], p[29], p[30], p[31]]), 123_456);
        assert_eq!(&p[26..28], &[0, 0]);
    }

    #[test]
    fn test_cloud_to_msg() {
        let cloud = cloud_2x3();
        let msg = cloud_to_msg(&cloud, 1_700_000_000_123_456_789, "os_lidar");

        assert_eq!(msg.header.frame_id, "os_lidar");
        assert_eq!(msg.header.stamp.sec, 1_700_000_000);
        assert_eq!(msg.header.stamp.nanosec, 123_456_789);
        assert_eq!((msg.height, msg.width), (2, 3));
        assert_eq!(msg.row_step, 3 * POINT_STEP as u32);
        assert_eq!(msg.data.len(), 6 * POINT_STEP);
        assert!(!msg.is_dense);
    }

    #[test]
    fn test_message_sink() {
        let mut sink = MessageSink::default();
        sink.send(&cloud_2x3(), 5, "lidar").unwrap();
        sink.send(&PointCloud::default(), 6, "lidar").unwrap();

        assert_eq!(sink.messages.len(), 2);
        assert_eq!(sink.messages[1].width, 0);
        assert!(sink.messages[1].data.is_empty());
    }
}
