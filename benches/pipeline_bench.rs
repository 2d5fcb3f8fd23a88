// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Benchmarks for scan assembly and destaggering.
//!
//! Measures:
//! - Point assembly (channel selection, projection, field narrowing)
//! - Row destaggering of an assembled cloud
//! - Destagger validation
//!
//! Run with: cargo bench --bench pipeline_bench
//!
//! For on-target profiling, cross-compile and run:
//!   cargo bench --bench pipeline_bench --target aarch64-unknown-linux-gnu

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use edgefirst_scan2cloud::{
    ChannelField, CloudOptions, LidarScan, PointCloud, XyzLut,
    cloud::assemble_into,
    destagger::{destagger, validate_destagger},
};
use ndarray::Array2;
use std::{f64::consts::PI, hint::black_box};

/// Sensor modes as (beams, columns).
const MODES: [(usize, usize); 3] = [(32, 1024), (64, 1024), (128, 2048)];

fn make_lut(height: usize, width: usize) -> XyzLut {
    let direction = Array2::from_shape_fn((height, width), |(u, v)| {
        let az = PI - 2.0 * PI * (v as f64 + 0.5) / width as f64;
        let el = 0.4 - 0.8 * u as f64 / height as f64;
        [el.cos() * az.cos(), el.cos() * az.sin(), el.sin()]
    });
    XyzLut::new(direction, Array2::from_elem((height, width), [0.0, 0.0, 36.18])).unwrap()
}

fn make_scan(height: usize, width: usize) -> LidarScan {
    let timestamps = (0..width as u64).map(|v| 1_000_000 + v * 48_828).collect();
    LidarScan::new(height, width, timestamps)
        .unwrap()
        .with_field(
            ChannelField::Range,
            Array2::from_shape_fn((height, width), |(u, v)| (1_000 + u * 7 + v) as u32),
        )
        .unwrap()
        .with_field(
            ChannelField::Signal,
            Array2::from_shape_fn((height, width), |(u, v)| ((u + v) % 1024) as u16),
        )
        .unwrap()
        .with_field(
            ChannelField::Reflectivity,
            Array2::from_shape_fn((height, width), |(_, v)| (v % 256) as u8),
        )
        .unwrap()
        .with_field(ChannelField::NearIr, Array2::from_elem((height, width), 300u16))
        .unwrap()
}

fn make_shifts(height: usize) -> Vec<i32> {
    (0..height).map(|u| [18, 12, 6, 0][u % 4]).collect()
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for (height, width) in MODES {
        let lut = make_lut(height, width);
        let scan = make_scan(height, width);
        let mut cloud = PointCloud::new(height, width);
        let options = CloudOptions::default();

        group.throughput(Throughput::Elements((height * width) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", height, width)),
            &scan,
            |b, scan| {
                b.iter(|| {
                    assemble_into(&mut cloud, black_box(scan), &lut, 1_000_000, &options).unwrap();
                })
            },
        );
    }

    group.finish();
}

fn bench_destagger(c: &mut Criterion) {
    let mut group = c.benchmark_group("destagger");

    for (height, width) in MODES {
        let lut = make_lut(height, width);
        let scan = make_scan(height, width);
        let mut cloud = PointCloud::new(height, width);
        assemble_into(&mut cloud, &scan, &lut, 1_000_000, &CloudOptions::default()).unwrap();
        let shifts = make_shifts(height);

        group.throughput(Throughput::Elements((height * width) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", height, width)),
            &cloud,
            |b, cloud| b.iter(|| destagger(black_box(cloud), &shifts).unwrap()),
        );
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let (height, width) = (128, 2048);
    let lut = make_lut(height, width);
    let scan = make_scan(height, width);
    let mut cloud = PointCloud::new(height, width);
    assemble_into(&mut cloud, &scan, &lut, 1_000_000, &CloudOptions::default()).unwrap();

    c.bench_function("validate_destagger/128x2048", |b| {
        b.iter(|| validate_destagger(black_box(&cloud)))
    });
}

criterion_group!(benches, bench_assemble, bench_destagger, bench_validate);
criterion_main!(benches);
