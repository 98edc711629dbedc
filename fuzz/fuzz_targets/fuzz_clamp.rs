#![no_main]

use arbitrary::Arbitrary;
use gutter_core::normalize::{rect_to_percent, snap_rect};
use gutter_core::{PercentRect, PixelRect, PixelSize};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Drag {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    canvas_width: f64,
    canvas_height: f64,
    snap: bool,
}

fuzz_target!(|drag: Drag| {
    let canvas = PixelSize::new(drag.canvas_width, drag.canvas_height);
    let pixels = PixelRect::new(drag.x, drag.y, drag.width, drag.height);

    // Raw values straight into the clamps: any f64, NaN included.
    let raw = PercentRect::new(drag.x, drag.y, drag.width, drag.height);
    let panel = raw.clamp_panel();
    assert!(panel.is_finite(), "panel clamp produced {panel:?}");
    assert_eq!(panel.clamp_panel(), panel);
    let bubble = raw.clamp_bubble();
    assert!(bubble.is_finite(), "bubble clamp produced {bubble:?}");
    assert_eq!(bubble.clamp_bubble(), bubble);

    // Non-finite input must be rejected, never clamped into a value.
    let Some(mut rect) = rect_to_percent(pixels, canvas) else {
        return;
    };
    assert!(rect.is_finite());
    if drag.snap {
        rect = snap_rect(rect, 5.0);
    }

    let panel = rect.clamp_panel().rounded();
    assert!(panel.is_finite());
    assert!((10.0..=100.0).contains(&panel.width));
    assert!((10.0..=100.0).contains(&panel.height));
    assert!(panel.x >= -50.0 && panel.right() <= 150.0 + 1e-6);
    assert!(panel.y >= -50.0 && panel.bottom() <= 150.0 + 1e-6);

    let bubble = rect.clamp_bubble();
    assert_eq!(bubble.clamp_bubble(), bubble);
    assert!((0.0..=100.0).contains(&bubble.x) && (0.0..=100.0).contains(&bubble.y));
    assert!(bubble.width >= 5.0 && bubble.height >= 5.0);
    assert_eq!(bubble.clamp_panel(), bubble.clamp_panel().clamp_panel());
});
