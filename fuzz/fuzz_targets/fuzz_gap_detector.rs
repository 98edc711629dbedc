#![no_main]

use gutter_core::PercentRect;
use gutter_layout::gaps::{GapConfig, GapDetector};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the grid resolution (1..=64); the rest are panels,
    // four bytes each, mapped onto [-50, 150) for position and [0, 100) for size.
    let Some((&resolution, payload)) = data.split_first() else {
        return;
    };
    let config = GapConfig {
        grid_cells: usize::from(resolution % 64) + 1,
        ..GapConfig::default()
    };
    let panels: Vec<PercentRect> = payload
        .chunks_exact(4)
        .take(32)
        .map(|c| {
            PercentRect::new(
                f64::from(c[0]) / 255.0 * 200.0 - 50.0,
                f64::from(c[1]) / 255.0 * 200.0 - 50.0,
                f64::from(c[2]) / 255.0 * 100.0,
                f64::from(c[3]) / 255.0 * 100.0,
            )
        })
        .collect();

    let detector = GapDetector::new(config);
    let gaps = detector.detect(panels.iter().copied());

    assert!(gaps.len() <= config.max_gaps, "too many gaps");
    for (i, a) in gaps.iter().enumerate() {
        assert!(a.rect.x >= 0.0 && a.rect.y >= 0.0, "gap starts off page");
        assert!(a.rect.right() <= 100.0 + 1e-9, "gap ends off page");
        assert!(a.rect.bottom() <= 100.0 + 1e-9, "gap ends off page");
        for b in &gaps[i + 1..] {
            assert!(!a.rect.overlaps(&b.rect), "gaps overlap");
            assert!(a.area >= b.area, "gaps not sorted");
        }
        for panel in &panels {
            assert!(!a.rect.overlaps(panel), "gap covers a panel");
        }
    }
});
