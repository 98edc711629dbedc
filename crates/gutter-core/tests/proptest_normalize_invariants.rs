//! Property tests for the clamp policies, snapping and IoU.

use gutter_core::PercentRect;
use gutter_core::normalize::{
    PANEL_MAX_EXTENT, PANEL_MIN_EXTENT, PANEL_POSITION_MAX, PANEL_POSITION_MIN, round2,
    snap_to_grid, to_percent,
};
use proptest::prelude::*;

fn any_rect() -> impl Strategy<Value = PercentRect> {
    (-500.0f64..500.0, -500.0f64..500.0, -50.0f64..400.0, -50.0f64..400.0)
        .prop_map(|(x, y, w, h)| PercentRect::new(x, y, w, h))
}

/// Mostly ordinary values, with NaN and both infinities mixed in.
fn any_component() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -500.0f64..500.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

fn hostile_rect() -> impl Strategy<Value = PercentRect> {
    (any_component(), any_component(), any_component(), any_component())
        .prop_map(|(x, y, w, h)| PercentRect::new(x, y, w, h))
}

fn page_rect() -> impl Strategy<Value = PercentRect> {
    (0.0f64..90.0, 0.0f64..90.0, 1.0f64..100.0, 1.0f64..100.0)
        .prop_map(|(x, y, w, h)| PercentRect::new(x, y, w, h))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn clamp_panel_is_idempotent(rect in any_rect()) {
        let once = rect.clamp_panel();
        prop_assert_eq!(once.clamp_panel(), once);
    }

    #[test]
    fn clamp_panel_respects_bounds(rect in any_rect()) {
        let r = rect.clamp_panel();
        prop_assert!(r.width >= PANEL_MIN_EXTENT && r.width <= PANEL_MAX_EXTENT);
        prop_assert!(r.height >= PANEL_MIN_EXTENT && r.height <= PANEL_MAX_EXTENT);
        prop_assert!(r.x >= PANEL_POSITION_MIN && r.right() <= PANEL_POSITION_MAX + 1e-9);
        prop_assert!(r.y >= PANEL_POSITION_MIN && r.bottom() <= PANEL_POSITION_MAX + 1e-9);
    }

    #[test]
    fn clamp_bubble_is_idempotent(rect in any_rect()) {
        let once = rect.clamp_bubble();
        prop_assert_eq!(once.clamp_bubble(), once);
        prop_assert!((0.0..=100.0).contains(&once.x));
        prop_assert!((0.0..=100.0).contains(&once.y));
        prop_assert!(once.width >= 5.0 && once.height >= 5.0);
    }

    #[test]
    fn clamps_stay_finite_on_non_finite_input(rect in hostile_rect()) {
        let panel = rect.clamp_panel();
        prop_assert!(panel.is_finite());
        prop_assert!(panel.width >= PANEL_MIN_EXTENT && panel.width <= PANEL_MAX_EXTENT);
        prop_assert!(panel.x >= PANEL_POSITION_MIN && panel.right() <= PANEL_POSITION_MAX + 1e-9);
        prop_assert_eq!(panel.clamp_panel(), panel);

        let bubble = rect.clamp_bubble();
        prop_assert!(bubble.is_finite());
        prop_assert!((0.0..=100.0).contains(&bubble.x) && (0.0..=100.0).contains(&bubble.y));
        prop_assert_eq!(bubble.clamp_bubble(), bubble);
    }

    #[test]
    fn iou_is_symmetric_and_bounded(a in page_rect(), b in page_rect()) {
        let ab = a.iou(&b);
        let ba = b.iou(&a);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - ba).abs() < 1e-12);
        if !a.overlaps(&b) {
            prop_assert_eq!(ab, 0.0);
        }
    }

    #[test]
    fn iou_with_self_is_one(a in page_rect()) {
        prop_assert!((a.iou(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn snapped_values_are_grid_multiples(value in -200.0f64..200.0) {
        let snapped = snap_to_grid(value, 5.0);
        prop_assert!((snapped / 5.0 - (snapped / 5.0).round()).abs() < 1e-9);
        prop_assert!((snapped - value).abs() <= 2.5 + 1e-9);
    }

    #[test]
    fn to_percent_has_two_decimals(pixel in -5000.0f64..5000.0, extent in 1.0f64..5000.0) {
        let percent = to_percent(pixel, extent);
        prop_assert!(percent.is_some());
        let percent = percent.unwrap_or_default();
        prop_assert_eq!(round2(percent), percent);
    }
}

#[test]
fn non_finite_measurements_are_dropped() {
    assert_eq!(to_percent(f64::NAN, 100.0), None);
    assert_eq!(to_percent(10.0, f64::INFINITY), None);
    assert_eq!(to_percent(10.0, 0.0), None);
}
