//! Benchmarks for gap detection and display-map rebuilds.
//!
//! Run with: cargo bench -p gutter-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gutter_core::PercentRect;
use gutter_layout::gaps::{GapConfig, GapDetector};
use gutter_layout::model::{
    ArtworkRef, ComputedRegion, PageId, Panel, PanelId, PanelStyle, RegionId, RegionSet,
};
use gutter_layout::reconcile::build_display_map;
use std::hint::black_box;

/// `n` panels scattered over the page with a fixed LCG.
fn scattered(n: usize) -> Vec<PercentRect> {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    let mut next = move |range: f64| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (state >> 11) as f64 / (1u64 << 53) as f64 * range
    };
    (0..n)
        .map(|_| PercentRect::new(next(90.0), next(90.0), 10.0 + next(30.0), 10.0 + next(30.0)))
        .collect()
}

fn grid_panels(side: usize) -> Vec<Panel> {
    let cell = 100.0 / side as f64;
    (0..side * side)
        .map(|i| Panel {
            id: PanelId::new(i as u64 + 1),
            page_id: PageId::new(1),
            rect: PercentRect::new(
                (i % side) as f64 * cell + 0.5,
                (i / side) as f64 * cell + 0.5,
                cell - 1.0,
                cell - 1.0,
            ),
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            z_index: 0,
            order: i as u32,
            style: PanelStyle::default(),
            artwork: Some(ArtworkRef::new(format!("art-{i}.png"))),
        })
        .collect()
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaps/detect");
    let detector = GapDetector::default();

    for n in [0, 4, 16, 64] {
        let panels = scattered(n);
        group.bench_with_input(BenchmarkId::new("panels", n), &panels, |b, panels| {
            b.iter(|| black_box(detector.detect(panels.iter().copied())))
        });
    }

    group.finish();
}

fn bench_grid_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaps/grid_cells");
    let panels = scattered(16);

    for cells in [10, 20, 50, 100] {
        let detector = GapDetector::new(GapConfig {
            grid_cells: cells,
            ..GapConfig::default()
        });
        group.bench_with_input(BenchmarkId::new("cells", cells), &panels, |b, panels| {
            b.iter(|| black_box(detector.detect(panels.iter().copied())))
        });
    }

    group.finish();
}

fn bench_display_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile/display_map");

    for side in [2, 4, 8] {
        let panels = grid_panels(side);
        let cell = 100.0 / side as f64;
        let regions = RegionSet::new(
            PageId::new(1),
            1,
            (0..side * side)
                .map(|i| {
                    ComputedRegion::rect(
                        RegionId::new(format!("r{i}")),
                        PercentRect::new((i % side) as f64 * cell, (i / side) as f64 * cell, cell, cell),
                    )
                })
                .collect(),
        );
        group.bench_with_input(
            BenchmarkId::new("panels", side * side),
            &(panels, regions),
            |b, (panels, regions)| b.iter(|| black_box(build_display_map(panels, regions, 0.05))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_detect, bench_grid_resolution, bench_display_map);

criterion_main!(benches);
