//! Property tests for the gap detector and region reconciliation.
//!
//! Random panel layouts (including off-page bleed) are fed to the detector;
//! every result must be a disjoint, largest-first set of free rectangles.

use gutter_core::PercentRect;
use gutter_layout::gaps::{GapConfig, GapDetector};
use gutter_layout::model::{ComputedRegion, PageId, Panel, PanelId, PanelStyle, RegionId};
use gutter_layout::reconcile::{RegionTarget, resolve_region_target};
use proptest::prelude::*;

fn panel_rect() -> impl Strategy<Value = PercentRect> {
    (-50.0f64..120.0, -50.0f64..120.0, 10.0f64..100.0, 10.0f64..100.0)
        .prop_map(|(x, y, w, h)| PercentRect::new(x, y, w, h).clamp_panel())
}

fn panels(rects: &[PercentRect]) -> Vec<Panel> {
    rects
        .iter()
        .enumerate()
        .map(|(i, rect)| Panel {
            id: PanelId::new(i as u64 + 1),
            page_id: PageId::new(1),
            rect: *rect,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            z_index: 0,
            order: i as u32,
            style: PanelStyle::default(),
            artwork: None,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn gaps_are_disjoint_sorted_and_bounded(rects in prop::collection::vec(panel_rect(), 0..8)) {
        let detector = GapDetector::default();
        let gaps = detector.detect(rects.iter().copied());

        prop_assert!(gaps.len() <= GapConfig::default().max_gaps);
        for (i, a) in gaps.iter().enumerate() {
            prop_assert!(a.rect.x >= 0.0 && a.rect.y >= 0.0);
            prop_assert!(a.rect.right() <= 100.0 && a.rect.bottom() <= 100.0);
            // 4 cells of 5% × 5%.
            prop_assert!(a.area >= 100.0);
            for b in &gaps[i + 1..] {
                prop_assert!(!a.rect.overlaps(&b.rect));
                prop_assert!(a.area >= b.area);
            }
        }
    }

    #[test]
    fn gaps_never_cover_panels(rects in prop::collection::vec(panel_rect(), 1..6)) {
        let gaps = GapDetector::default().detect(rects.iter().copied());
        for gap in &gaps {
            for rect in &rects {
                prop_assert!(!gap.rect.overlaps(rect), "gap {:?} covers panel {:?}", gap, rect);
            }
        }
    }

    #[test]
    fn top_gap_is_the_largest_candidate(rects in prop::collection::vec(panel_rect(), 0..6)) {
        let detector = GapDetector::default();
        let candidates = detector.candidates(rects.iter().copied());
        let gaps = detector.detect(rects.iter().copied());
        match (candidates.first(), gaps.first()) {
            (Some(best), Some(top)) => prop_assert_eq!(best.area, top.area),
            (None, None) => {}
            other => prop_assert!(false, "mismatch {:?}", other),
        }
    }

    #[test]
    fn reuse_threshold_is_monotonic(
        rects in prop::collection::vec(panel_rect(), 0..6),
        region in panel_rect(),
    ) {
        let panels = panels(&rects);
        let region = ComputedRegion::rect(RegionId::new("r"), region);

        let always_create = resolve_region_target(&region, &panels, 1.01);
        let is_create = matches!(always_create, RegionTarget::Create { .. });
        prop_assert!(is_create);

        let any_overlap = panels.iter().any(|p| p.rect.iou(&region.bounds) > 0.0);
        let loose = resolve_region_target(&region, &panels, 0.0);
        prop_assert_eq!(matches!(loose, RegionTarget::Reuse { .. }), any_overlap);
    }
}
