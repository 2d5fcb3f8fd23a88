// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use cdr::{CdrLe, Infinite};
use clap::Parser as _;
use edgefirst_scan2cloud::{
    ChannelField, CloudOptions, FieldImage, LidarScan, XyzLut,
    cloud::scan_to_cloud,
    destagger::validate_destagger,
    formats::cloud_to_msg,
    lidar::{Error, timestamp},
};
use serde::Deserialize;
use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Scan as written by the capture tooling: row-major samples per channel.
#[derive(Deserialize)]
struct ScanFile {
    height: usize,
    width: usize,
    timestamps: Vec<u64>,
    fields: BTreeMap<ChannelField, Vec<u64>>,
}

#[derive(Deserialize)]
struct LutFile {
    height: usize,
    width: usize,
    direction: Vec<[f64; 3]>,
    offset: Vec<[f64; 3]>,
}

/// Subset of the sensor's lidar_data_format metadata.
#[derive(Deserialize)]
struct LidarDataFormat {
    pixel_shift_by_row: Vec<i32>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, Error> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn load_scan(path: &Path) -> Result<LidarScan, Error> {
    let file: ScanFile = read_json(path)?;
    let mut scan = LidarScan::new(file.height, file.width, file.timestamps)?;
    for (field, samples) in file.fields {
        let image = FieldImage::from_samples(field.native_type(), file.height, file.width, samples)?;
        scan.insert_field(field, image)?;
    }
    Ok(scan)
}

fn load_lut(path: &Path) -> Result<XyzLut, Error> {
    let file: LutFile = read_json(path)?;
    XyzLut::from_vecs(file.height, file.width, file.direction, file.offset)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(args.rust_log.into())
                .from_env_lossy(),
        )
        .init();

    let scan = load_scan(&args.scan)?;
    let lut = load_lut(&args.lut)?;
    info!(
        height = scan.height(),
        width = scan.width(),
        fields = ?scan.fields().collect::<Vec<_>>(),
        "loaded scan"
    );

    // Without metadata the shift table is empty, which destaggering rejects.
    let pixel_shift_by_row = match &args.metadata {
        Some(path) => read_json::<LidarDataFormat>(path)?.pixel_shift_by_row,
        None => Vec::new(),
    };

    let scan_ts = match scan.reference_timestamp() {
        0 => {
            warn!("scan has no valid column timestamps, using the system clock");
            timestamp()?
        }
        ts => ts,
    };
    debug!(scan_ts, "reference timestamp");

    let options = CloudOptions::from(&args);
    let (cloud, destaggered) = scan_to_cloud(&scan, &lut, scan_ts, &pixel_shift_by_row, &options)?;
    let output = destaggered.as_ref().unwrap_or(&cloud);

    if args.validate {
        let violations = validate_destagger(output);
        match violations.is_empty() {
            true => info!("destagger check passed"),
            false => warn!(count = violations.len(), "destagger check failed"),
        }
    }

    if let Some(path) = &args.output {
        let msg = cloud_to_msg(output, scan_ts, &args.frame_id);
        let data = cdr::serialize::<_, _, CdrLe>(&msg, Infinite)?;
        std::fs::write(path, &data)?;
        info!(path = %path.display(), bytes = data.len(), "wrote point cloud");
    }

    Ok(())
}
