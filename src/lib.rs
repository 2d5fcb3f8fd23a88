// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! EdgeFirst Scan to Point Cloud Library
//!
//! This library turns a staggered multi-channel lidar scan into an organized,
//! time-annotated 3D point cloud and realigns its rows in azimuth.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  LidarScan  │ ─►│ suitable_return  │ ─►│  cartesian   │ ─►│  assemble   │
//! │ (channels)  │   │ get_or_fill_zero │   │  (XyzLut)    │   │ PointCloud  │
//! └─────────────┘   └──────────────────┘   └──────────────┘   └─────────────┘
//!                                                                    │
//!                            ┌────────────────────┐   ┌──────────────▼──────┐
//!                            │ validate_destagger │ ◄─│     destagger       │
//!                            │   (advisory)       │   │ (pixel_shift_by_row)│
//!                            └────────────────────┘   └─────────────────────┘
//! ```
//!
//! The client owns every cloud. [`cloud::assemble_into`] fills a cloud the
//! client provides and only reallocates it when the scan dimensions change.
//! The lookup table and the shift table are read-only and can be shared
//! between threads assembling different scans.
//!
//! # Modules
//!
//! - [`scan`]: Scan container and return-aware channel selection
//! - [`lut`]: Lookup table and Cartesian projection
//! - [`cloud`]: Point type, narrowing steps and point assembly
//! - [`destagger`]: Row destaggering and ordering validation
//! - [`formats`]: PointCloud2 serialization and the sink interface
//! - [`lidar`]: Error type and per-call options
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_scan2cloud::{
//!     cloud::assemble, destagger::{destagger, validate_destagger}, ReturnIndex,
//! };
//!
//! let cloud = assemble(&scan, &lut, scan.reference_timestamp(), ReturnIndex::First)?;
//! let cloud = destagger(&cloud, &pixel_shift_by_row)?;
//! assert!(validate_destagger(&cloud).is_empty());
//! ```

pub mod cloud;
pub mod destagger;
pub mod formats;
pub mod lidar;
pub mod lut;
pub mod scan;

// Re-exports for convenience
pub use cloud::{Point, PointCloud, assemble, assemble_into};
pub use destagger::{Violation, destagger, validate_destagger};
pub use formats::CloudSink;
pub use lidar::{CloudOptions, Error, ReturnIndex};
pub use lut::XyzLut;
pub use scan::{ChannelField, FieldImage, LidarScan};
