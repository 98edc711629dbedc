#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Two coordinate spaces exist side by side:
//!
//! - **Percent space**: the page's logical `[0, 100] × [0, 100]` canvas.
//!   Everything persisted or matched lives here.
//! - **Pixel space**: whatever size the page is currently rendered at. Only
//!   the interaction surface and the shape provider speak pixels.
//!
//! Rotation and skew are visual only; every rectangle here is the unrotated
//! axis-aligned bounding box.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in page-relative percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in percent of the page width.
    pub width: f64,
    /// Height in percent of the page height.
    pub height: f64,
}

impl PercentRect {
    /// The whole page.
    pub const PAGE: Self = Self::new(0.0, 0.0, 100.0, 100.0);

    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area in percent².
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Check if the rectangle has no positive area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// True when every component is a finite number.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> PercentPoint {
        PercentPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Standard open-interval overlap test; touching edges do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &PercentRect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    pub fn intersection_opt(&self, other: &PercentRect) -> Option<PercentRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return None;
        }
        Some(PercentRect::new(x, y, right - x, bottom - y))
    }

    /// Intersection-over-Union of the two bounding boxes.
    ///
    /// Returns `0.0` for disjoint rectangles and whenever the union has no
    /// positive area, so degenerate input never divides by zero.
    pub fn iou(&self, other: &PercentRect) -> f64 {
        let Some(overlap) = self.intersection_opt(other) else {
            return 0.0;
        };
        let intersection = overlap.area();
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            (intersection / union).min(1.0)
        } else {
            0.0
        }
    }

    /// Copy with every component rounded to 2 decimals.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::new(
            crate::normalize::round2(self.x),
            crate::normalize::round2(self.y),
            crate::normalize::round2(self.width),
            crate::normalize::round2(self.height),
        )
    }
}

/// A point in page-relative percent. Not bounded to the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Rendered canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both extents finite and strictly positive.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A rectangle in canvas pixels, as reported by the interaction surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    /// Create a new pixel rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    /// Create a new pixel point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::{PercentRect, PixelRect, PixelSize};

    #[test]
    fn rect_edges_and_area() {
        let rect = PercentRect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.area(), 1200.0);
        assert!(!rect.is_empty());
        assert!(PercentRect::new(0.0, 0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = PercentRect::new(0.0, 0.0, 50.0, 50.0);
        let b = PercentRect::new(50.0, 0.0, 50.0, 50.0);
        assert!(!a.overlaps(&b));
        assert_eq!(a.intersection_opt(&b), None);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn intersection_overlaps() {
        let a = PercentRect::new(0.0, 0.0, 40.0, 40.0);
        let b = PercentRect::new(20.0, 20.0, 40.0, 40.0);
        assert_eq!(
            a.intersection_opt(&b),
            Some(PercentRect::new(20.0, 20.0, 20.0, 20.0))
        );
    }

    #[test]
    fn iou_of_self_is_one() {
        let a = PercentRect::new(3.0, 7.0, 21.5, 12.25);
        assert!((a.iou(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn iou_of_shifted_panel_and_region() {
        let panel = PercentRect::new(48.0, 2.0, 50.0, 50.0);
        let region = PercentRect::new(50.0, 0.0, 50.0, 50.0);
        let iou = panel.iou(&region);
        // 48×48 overlap over a 2696 union.
        assert!((iou - 0.8546).abs() < 1e-3, "iou={iou}");
    }

    #[test]
    fn iou_of_degenerate_rects_is_zero() {
        let a = PercentRect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn rounded_keeps_two_decimals() {
        let rect = PercentRect::new(1.23456, 2.0, 33.333333, 49.995);
        let r = rect.rounded();
        assert_eq!(r.x, 1.23);
        assert_eq!(r.width, 33.33);
    }

    #[test]
    fn pixel_helpers() {
        assert!(PixelSize::new(800.0, 600.0).is_usable());
        assert!(!PixelSize::new(0.0, 600.0).is_usable());
        assert!(!PixelSize::new(f64::NAN, 600.0).is_usable());
        let c = PixelRect::new(10.0, 20.0, 100.0, 40.0).center();
        assert_eq!((c.x, c.y), (60.0, 40.0));
    }
}
