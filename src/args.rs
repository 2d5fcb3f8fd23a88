// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_scan2cloud::{CloudOptions, ReturnIndex};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Scan JSON: height, width, per-column timestamps and row-major channel
    /// samples keyed by channel name (RANGE, SIGNAL, ...).
    #[arg(long, env)]
    pub scan: PathBuf,

    /// Lookup table JSON: height, width and row-major direction and offset
    /// vectors.
    #[arg(long, env)]
    pub lut: PathBuf,

    /// Sensor lidar_data_format JSON providing pixel_shift_by_row.  Required
    /// when destaggering.
    #[arg(long, env)]
    pub metadata: Option<PathBuf>,

    /// Which return to read on dual-return profiles.
    #[arg(long, env, default_value = "first")]
    pub return_index: ReturnIndex,

    /// Destagger the assembled point cloud.
    #[arg(long, env)]
    pub destagger: bool,

    /// Set zero-range points to NaN instead of the beam origin.
    #[arg(long, env)]
    pub mark_no_return: bool,

    /// Check azimuth and elevation ordering of the output cloud.
    #[arg(long, env)]
    pub validate: bool,

    /// The name of the lidar frame
    #[arg(long, env, default_value = "lidar")]
    pub frame_id: String,

    /// Write the CDR encoded PointCloud2 message to this file.
    #[arg(long, env)]
    pub output: Option<PathBuf>,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}

impl From<&Args> for CloudOptions {
    fn from(args: &Args) -> Self {
        CloudOptions {
            return_index: args.return_index,
            destagger: args.destagger,
            mark_no_return: args.mark_no_return,
        }
    }
}
