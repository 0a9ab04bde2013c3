//! Benchmarks for hull construction and whole-grid extraction.
//!
//! 1. **`ConvexHullEngine::compute`**: incremental and external paths on
//!    points in convex position
//! 2. **`extract_boundary`**: sequential versus parallel extraction with both
//!    vertex strategies

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use multilabel_boundary::prelude::*;
use std::hint::black_box;

/// Deterministic seed for jittered benchmark grids.
const BENCH_SEED: u64 = 0xB0DA;

#[expect(clippy::cast_precision_loss)]
fn moment_curve<const D: usize>(n: usize) -> Vec<Point<D>> {
    (0..n)
        .map(|k| {
            let t = k as f64 / n as f64 * 2.0 - 1.0;
            let mut coords = [0.0; D];
            let mut power = 1.0;
            for c in &mut coords {
                power *= t;
                *c = power;
            }
            Point::new(coords)
        })
        .collect()
}

#[expect(clippy::cast_precision_loss)]
fn label_grid(n: usize, labels: usize) -> Grid<2> {
    let mut grid = Grid::from_fn([n, n], labels, |[i, j], label| {
        let angle = label as f64 * std::f64::consts::TAU / labels as f64;
        let (sx, sy) = (
            (n as f64 / 2.0) * (1.0 + 0.6 * angle.cos()),
            (n as f64 / 2.0) * (1.0 + 0.6 * angle.sin()),
        );
        -((i as f64 - sx).powi(2) + (j as f64 - sy).powi(2))
    })
    .expect("benchmark grid is valid");
    grid.jitter(1e-4, BENCH_SEED).expect("finite jitter");
    grid
}

macro_rules! generate_hull_benchmarks {
    ($dim:literal) => {
        pastey::paste! {
            fn [<benchmark_hull_ $dim d>](c: &mut Criterion) {
                let mut group = c.benchmark_group(concat!("hull_", stringify!($dim), "d"));
                for &n in &[8usize, 16, 32] {
                    let points = moment_curve::<$dim>(n);
                    group.throughput(Throughput::Elements(n as u64));
                    for (name, general_position) in [("incremental", true), ("external", false)] {
                        let engine = ConvexHullEngine::<$dim>::new(HullOptions {
                            general_position,
                            ..HullOptions::default()
                        })
                        .expect("supported dimension");
                        let mut scratch = ConvexHullScratch::new();
                        group.bench_with_input(BenchmarkId::new(name, n), &points, |b, points| {
                            b.iter(|| black_box(engine.compute(points, &mut scratch)));
                        });
                    }
                }
                group.finish();
            }
        }
    };
}

generate_hull_benchmarks!(2);
generate_hull_benchmarks!(3);

fn benchmark_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_boundary");
    let grid = label_grid(48, 6);
    for strategy in [VertexStrategy::Hull, VertexStrategy::BruteForce] {
        for parallel in [false, true] {
            let options = ExtractionOptions {
                strategy,
                parallel,
                ..ExtractionOptions::default()
            };
            let id = BenchmarkId::new(format!("{strategy:?}"), if parallel { "parallel" } else { "sequential" });
            group.bench_function(id, |b| {
                b.iter(|| black_box(extract_boundary(&grid, &options)));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, benchmark_hull_2d, benchmark_hull_3d, benchmark_extraction);
criterion_main!(benches);
