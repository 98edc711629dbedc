//! Coordinate normalization between pixel and percent space.
//!
//! All functions are pure. Anything that reaches the backing store has been
//! through [`round2`], which keeps every persisted value within 2 decimals.
//!
//! Measurement input is treated as untrusted: resize observers can emit a
//! transient `NaN` or `inf` mid-reflow. [`to_percent`] turns those into
//! `None` so the caller skips the update instead of persisting garbage.

use crate::geometry::{PercentPoint, PercentRect, PixelPoint, PixelRect, PixelSize};

/// Minimum panel width/height in percent.
pub const PANEL_MIN_EXTENT: f64 = 10.0;
/// Maximum panel width/height in percent.
pub const PANEL_MAX_EXTENT: f64 = 100.0;
/// Panels may start up to half a page before the canvas.
pub const PANEL_POSITION_MIN: f64 = -50.0;
/// Panels may end up to half a page past the canvas.
pub const PANEL_POSITION_MAX: f64 = 150.0;

/// Minimum bubble width/height in percent.
pub const BUBBLE_MIN_EXTENT: f64 = 5.0;
/// Maximum bubble width/height in percent.
pub const BUBBLE_MAX_EXTENT: f64 = 100.0;
/// Bubble positions stay on the canvas.
pub const BUBBLE_POSITION_MIN: f64 = 0.0;
/// Bubble positions stay on the canvas.
pub const BUBBLE_POSITION_MAX: f64 = 100.0;

/// Default snapping interval in percent.
pub const DEFAULT_SNAP_GRID: f64 = 5.0;

/// Round to 2 decimal places (half away from zero).
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert one pixel value into percent of `axis_extent`, at 2-decimal precision.
///
/// Returns `None` when either input or the result is not finite, including a
/// zero extent.
pub fn to_percent(pixel_value: f64, axis_extent: f64) -> Option<f64> {
    if !pixel_value.is_finite() || !axis_extent.is_finite() {
        crate::debug!(
            pixel_value,
            axis_extent,
            "discarding non-finite measurement"
        );
        return None;
    }
    let percent = (pixel_value / axis_extent * 10_000.0).round() / 100.0;
    if !percent.is_finite() {
        crate::debug!(pixel_value, axis_extent, "discarding degenerate axis extent");
        return None;
    }
    Some(percent)
}

/// Convert a percent value back to pixels along an axis.
#[inline]
pub fn to_pixels(percent: f64, axis_extent: f64) -> f64 {
    percent / 100.0 * axis_extent
}

/// Convert a pixel rectangle into percent space.
///
/// `None` if any of the four components fails [`to_percent`]; partial
/// updates are never produced.
pub fn rect_to_percent(rect: PixelRect, canvas: PixelSize) -> Option<PercentRect> {
    Some(PercentRect::new(
        to_percent(rect.x, canvas.width)?,
        to_percent(rect.y, canvas.height)?,
        to_percent(rect.width, canvas.width)?,
        to_percent(rect.height, canvas.height)?,
    ))
}

/// Convert a percent rectangle to canvas pixels.
pub fn rect_to_pixels(rect: PercentRect, canvas: PixelSize) -> PixelRect {
    PixelRect::new(
        to_pixels(rect.x, canvas.width),
        to_pixels(rect.y, canvas.height),
        to_pixels(rect.width, canvas.width),
        to_pixels(rect.height, canvas.height),
    )
}

/// Convert a percent point to canvas pixels. Points outside the page map
/// outside the canvas.
pub fn point_to_pixels(point: PercentPoint, canvas: PixelSize) -> PixelPoint {
    PixelPoint::new(
        to_pixels(point.x, canvas.width),
        to_pixels(point.y, canvas.height),
    )
}

/// Snap to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid leaves the value untouched.
pub fn snap_to_grid(percent: f64, grid_size: f64) -> f64 {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return percent;
    }
    (percent / grid_size).round() * grid_size
}

/// Snap all four components of a rectangle.
pub fn snap_rect(rect: PercentRect, grid_size: f64) -> PercentRect {
    PercentRect::new(
        snap_to_grid(rect.x, grid_size),
        snap_to_grid(rect.y, grid_size),
        snap_to_grid(rect.width, grid_size),
        snap_to_grid(rect.height, grid_size),
    )
}

/// Clamp that never panics: NaN falls back to `min`.
#[inline]
fn clamp_or_min(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

/// Apply the panel placement policy.
///
/// Width and height are clamped to `[10, 100]` first. Position bounds then
/// depend on the clamped size: `x ∈ [-50, 150 - w]`, `y ∈ [-50, 150 - h]`,
/// so a panel can bleed half a page past either edge but never further.
///
/// The result is always finite. Infinities clamp to the nearest bound and
/// NaN components take the lower bound; callers that must discard
/// non-finite input check [`PercentRect::is_finite`] first.
pub fn clamp_panel_rect(x: f64, y: f64, width: f64, height: f64) -> PercentRect {
    let width = clamp_or_min(width, PANEL_MIN_EXTENT, PANEL_MAX_EXTENT);
    let height = clamp_or_min(height, PANEL_MIN_EXTENT, PANEL_MAX_EXTENT);
    let x = clamp_or_min(x, PANEL_POSITION_MIN, PANEL_POSITION_MAX - width);
    let y = clamp_or_min(y, PANEL_POSITION_MIN, PANEL_POSITION_MAX - height);
    PercentRect::new(x, y, width, height)
}

/// Apply the bubble placement policy: extents in `[5, 100]`, position in
/// `[0, 100]`. Tail endpoints are not covered by this clamp. Non-finite
/// components are handled as in [`clamp_panel_rect`].
pub fn clamp_bubble_rect(x: f64, y: f64, width: f64, height: f64) -> PercentRect {
    let width = clamp_or_min(width, BUBBLE_MIN_EXTENT, BUBBLE_MAX_EXTENT);
    let height = clamp_or_min(height, BUBBLE_MIN_EXTENT, BUBBLE_MAX_EXTENT);
    let x = clamp_or_min(x, BUBBLE_POSITION_MIN, BUBBLE_POSITION_MAX);
    let y = clamp_or_min(y, BUBBLE_POSITION_MIN, BUBBLE_POSITION_MAX);
    PercentRect::new(x, y, width, height)
}

impl PercentRect {
    /// [`clamp_panel_rect`] applied to this rectangle.
    #[must_use]
    pub fn clamp_panel(&self) -> Self {
        clamp_panel_rect(self.x, self.y, self.width, self.height)
    }

    /// [`clamp_bubble_rect`] applied to this rectangle.
    #[must_use]
    pub fn clamp_bubble(&self) -> Self {
        clamp_bubble_rect(self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_percent_rounds_to_two_decimals() {
        assert_eq!(to_percent(100.0, 300.0), Some(33.33));
        assert_eq!(to_percent(200.0, 300.0), Some(66.67));
        assert_eq!(to_percent(400.0, 800.0), Some(50.0));
    }

    #[test]
    fn to_percent_skips_non_finite_input() {
        assert_eq!(to_percent(f64::NAN, 800.0), None);
        assert_eq!(to_percent(10.0, f64::INFINITY), None);
        assert_eq!(to_percent(10.0, 0.0), None);
    }

    #[test]
    fn to_percent_allows_off_canvas_values() {
        assert_eq!(to_percent(-80.0, 800.0), Some(-10.0));
        assert_eq!(to_percent(960.0, 800.0), Some(120.0));
    }

    #[test]
    fn rect_to_percent_is_all_or_nothing() {
        let canvas = PixelSize::new(800.0, 1200.0);
        let ok = rect_to_percent(PixelRect::new(80.0, 120.0, 400.0, 600.0), canvas);
        assert_eq!(ok, Some(PercentRect::new(10.0, 10.0, 50.0, 50.0)));
        let bad = rect_to_percent(PixelRect::new(80.0, f64::NAN, 400.0, 600.0), canvas);
        assert_eq!(bad, None);
    }

    #[test]
    fn pixels_round_trip_through_percent() {
        let canvas = PixelSize::new(1000.0, 500.0);
        let rect = PercentRect::new(10.0, 20.0, 30.0, 40.0);
        let px = rect_to_pixels(rect, canvas);
        assert_eq!(px, PixelRect::new(100.0, 100.0, 300.0, 200.0));
        assert_eq!(rect_to_percent(px, canvas), Some(rect));
    }

    #[test]
    fn snap_to_nearest_multiple() {
        assert_eq!(snap_to_grid(12.4, 5.0), 10.0);
        assert_eq!(snap_to_grid(12.6, 5.0), 15.0);
        assert_eq!(snap_to_grid(-7.6, 5.0), -10.0);
        assert_eq!(snap_to_grid(12.6, 0.0), 12.6);
    }

    #[test]
    fn panel_clamp_floors_extent() {
        let r = clamp_panel_rect(20.0, 20.0, 2.0, 250.0);
        assert_eq!(r.width, 10.0);
        assert_eq!(r.height, 100.0);
    }

    #[test]
    fn panel_clamp_position_depends_on_clamped_extent() {
        let r = clamp_panel_rect(140.0, -90.0, 30.0, 20.0);
        assert_eq!(r.x, 120.0);
        assert_eq!(r.y, -50.0);

        // Width clamps to 100 first, so x can reach at most 50.
        let r = clamp_panel_rect(90.0, 0.0, 400.0, 20.0);
        assert_eq!(r, PercentRect::new(50.0, 0.0, 100.0, 20.0));
    }

    #[test]
    fn panel_clamp_is_idempotent() {
        let once = clamp_panel_rect(-70.0, 149.0, 3.0, 55.5);
        let twice = once.clamp_panel();
        assert_eq!(once, twice);
    }

    #[test]
    fn bubble_clamp_keeps_position_on_canvas() {
        let r = clamp_bubble_rect(-5.0, 130.0, 2.0, 20.0);
        assert_eq!(r, PercentRect::new(0.0, 100.0, 5.0, 20.0));
    }

    #[test]
    fn panel_clamp_never_panics_on_non_finite() {
        let r = clamp_panel_rect(10.0, 10.0, f64::NAN, 20.0);
        assert_eq!(r, PercentRect::new(10.0, 10.0, 10.0, 20.0));
        let r = clamp_panel_rect(f64::NAN, f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        assert_eq!(r, PercentRect::new(-50.0, 140.0, 100.0, 10.0));
    }

    #[test]
    fn bubble_clamp_never_panics_on_non_finite() {
        let r = clamp_bubble_rect(f64::NAN, f64::NEG_INFINITY, f64::INFINITY, f64::NAN);
        assert_eq!(r, PercentRect::new(0.0, 0.0, 100.0, 5.0));
    }

    #[test]
    fn round2_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-2.5), -2.5);
        assert_eq!(round2(12.344), 12.34);
    }
}
