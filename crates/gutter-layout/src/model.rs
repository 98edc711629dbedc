//! Page, panel, bubble, divider-line and region records.
//!
//! Panels and bubbles are persisted by the backing store and identified by
//! stable numeric ids. Computed regions are ephemeral: they are regenerated
//! by the line-layout collaborator every time divider lines change and carry
//! a content-derived id plus the generation they were computed for.

use std::fmt;

use gutter_core::normalize::round2;
use gutter_core::{PercentPoint, PercentRect};
use serde::{Deserialize, Serialize};

use crate::bubble::{BubbleKind, BubbleStyle, TailType};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw store id.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Stable identifier of a comic page.
    PageId
);
record_id!(
    /// Stable identifier of a persisted panel.
    PanelId
);
record_id!(
    /// Stable identifier of a persisted speech bubble.
    BubbleId
);
record_id!(
    /// Stable identifier of a persisted divider line.
    LineId
);

/// Content-derived identifier of a computed region.
///
/// Not stable across layout changes; only meaningful within one
/// [`RegionSet`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artwork attached to a panel, as delivered by a drop or upload payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRef {
    /// Library asset id, when the artwork came from the library.
    #[serde(default)]
    pub artwork_id: Option<u64>,
    pub file_url: String,
}

impl ArtworkRef {
    #[must_use]
    pub fn new(file_url: impl Into<String>) -> Self {
        Self {
            artwork_id: None,
            file_url: file_url.into(),
        }
    }

    #[must_use]
    pub fn with_artwork_id(mut self, artwork_id: u64) -> Self {
        self.artwork_id = Some(artwork_id);
        self
    }
}

/// Panel border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

/// Visual border settings of a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelStyle {
    pub border_style: BorderStyle,
    pub border_width: f64,
    pub border_color: String,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            border_style: BorderStyle::Solid,
            border_width: 2.0,
            border_color: "#000000".to_string(),
        }
    }
}

/// A persisted rectangular panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: PanelId,
    pub page_id: PageId,
    /// Unrotated bounding box in percent.
    pub rect: PercentRect,
    /// Degrees; visual only.
    pub rotation: f64,
    /// Degrees; visual only.
    pub skew_x: f64,
    /// Degrees; visual only.
    pub skew_y: f64,
    pub z_index: i32,
    /// Position in the page's panel ordering.
    pub order: u32,
    pub style: PanelStyle,
    pub artwork: Option<ArtworkRef>,
}

impl Panel {
    /// True if any of rotation, skew-x or skew-y exceeds `tolerance_deg` in magnitude.
    #[must_use]
    pub fn is_transformed(&self, tolerance_deg: f64) -> bool {
        self.rotation.abs() > tolerance_deg
            || self.skew_x.abs() > tolerance_deg
            || self.skew_y.abs() > tolerance_deg
    }
}

/// Persisted panel as it arrives over the wire.
///
/// Decimal columns may be serialized as strings; every bound is parsed
/// leniently and a non-numeric value reads as `0`.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelRecord {
    pub id: PanelId,
    #[serde(rename = "page")]
    pub page_id: PageId,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub x_percent: f64,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub y_percent: f64,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub width_percent: f64,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub height_percent: f64,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub rotation: f64,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub skew_x: f64,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub skew_y: f64,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub border_style: BorderStyle,
    #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64", default)]
    pub border_width: f64,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default)]
    pub artwork_id: Option<u64>,
}

impl From<PanelRecord> for Panel {
    fn from(record: PanelRecord) -> Self {
        let defaults = PanelStyle::default();
        Self {
            id: record.id,
            page_id: record.page_id,
            rect: PercentRect::new(
                record.x_percent,
                record.y_percent,
                record.width_percent,
                record.height_percent,
            ),
            rotation: record.rotation,
            skew_x: record.skew_x,
            skew_y: record.skew_y,
            z_index: record.z_index,
            order: record.order,
            style: PanelStyle {
                border_style: record.border_style,
                border_width: record.border_width,
                border_color: record.border_color.unwrap_or(defaults.border_color),
            },
            artwork: record
                .artwork
                .filter(|url| !url.is_empty())
                .map(|file_url| ArtworkRef {
                    artwork_id: record.artwork_id,
                    file_url,
                }),
        }
    }
}

/// A persisted speech bubble.
///
/// `rect` is canvas-relative percent even though the bubble visually sits
/// inside its panel. `tail_end` is unbounded and may point off-canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechBubble {
    pub id: BubbleId,
    pub panel_id: PanelId,
    pub rect: PercentRect,
    pub tail_end: PercentPoint,
    pub tail_type: TailType,
    pub kind: BubbleKind,
    pub style: BubbleStyle,
    pub text: String,
    pub z_index: i32,
    /// Position in the panel's bubble ordering.
    pub order: u32,
}

/// Divider line geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "line_type", rename_all = "snake_case")]
pub enum LineShape {
    Straight,
    Bezier {
        control1: PercentPoint,
        control2: PercentPoint,
    },
}

/// A persisted divider line. Regions are derived from these by the
/// line-layout collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividerLine {
    pub id: LineId,
    pub page_id: PageId,
    #[serde(flatten)]
    pub shape: LineShape,
    pub start: PercentPoint,
    pub end: PercentPoint,
    pub thickness: f64,
    pub color: String,
    pub order: u32,
}

/// An ephemeral polygon region derived from divider lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedRegion {
    pub id: RegionId,
    pub vertices: Vec<PercentPoint>,
    pub bounds: PercentRect,
    pub centroid: PercentPoint,
}

impl ComputedRegion {
    /// Build a region from its polygon, deriving bounds and centroid.
    ///
    /// Degenerate polygons (zero area) use the vertex average as centroid.
    #[must_use]
    pub fn from_vertices(id: RegionId, vertices: Vec<PercentPoint>) -> Self {
        let bounds = polygon_bounds(&vertices);
        let centroid = polygon_centroid(&vertices);
        Self {
            id,
            vertices,
            bounds,
            centroid,
        }
    }

    /// Axis-aligned rectangular region.
    #[must_use]
    pub fn rect(id: RegionId, rect: PercentRect) -> Self {
        Self::from_vertices(
            id,
            vec![
                PercentPoint::new(rect.x, rect.y),
                PercentPoint::new(rect.right(), rect.y),
                PercentPoint::new(rect.right(), rect.bottom()),
                PercentPoint::new(rect.x, rect.bottom()),
            ],
        )
    }
}

fn polygon_bounds(vertices: &[PercentPoint]) -> PercentRect {
    let Some(first) = vertices.first() else {
        return PercentRect::default();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for v in &vertices[1..] {
        min_x = min_x.min(v.x);
        min_y = min_y.min(v.y);
        max_x = max_x.max(v.x);
        max_y = max_y.max(v.y);
    }
    PercentRect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

fn polygon_centroid(vertices: &[PercentPoint]) -> PercentPoint {
    let n = vertices.len();
    if n == 0 {
        return PercentPoint::default();
    }
    let (mut cx, mut cy, mut twice_area) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        twice_area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    if twice_area.abs() < 1e-9 {
        let sx: f64 = vertices.iter().map(|v| v.x).sum();
        let sy: f64 = vertices.iter().map(|v| v.y).sum();
        return PercentPoint::new(sx / n as f64, sy / n as f64);
    }
    PercentPoint::new(cx / (3.0 * twice_area), cy / (3.0 * twice_area))
}

/// One generation of computed regions for a page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionSet {
    pub page_id: PageId,
    /// Divider-line generation the regions were computed from.
    pub generation: u64,
    pub regions: Vec<ComputedRegion>,
}

impl RegionSet {
    #[must_use]
    pub fn new(page_id: PageId, generation: u64, regions: Vec<ComputedRegion>) -> Self {
        Self {
            page_id,
            generation,
            regions,
        }
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&ComputedRegion> {
        self.regions.iter().find(|region| &region.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Fields for a new panel. The store assigns id and order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDraft {
    pub rect: PercentRect,
    pub rotation: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub z_index: i32,
    pub style: PanelStyle,
    pub artwork: Option<ArtworkRef>,
}

impl PanelDraft {
    /// Draft at `rect` with default style and no transform.
    #[must_use]
    pub fn new(rect: PercentRect) -> Self {
        Self {
            rect,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            z_index: 0,
            style: PanelStyle::default(),
            artwork: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: PanelStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_skew(mut self, skew_x: f64, skew_y: f64) -> Self {
        self.skew_x = skew_x;
        self.skew_y = skew_y;
        self
    }

    #[must_use]
    pub fn with_artwork(mut self, artwork: ArtworkRef) -> Self {
        self.artwork = Some(artwork);
        self
    }

    /// Every number in the draft is finite.
    pub fn is_finite(&self) -> bool {
        self.rect.is_finite()
            && self.rotation.is_finite()
            && self.skew_x.is_finite()
            && self.skew_y.is_finite()
    }

    /// Apply the panel clamp policy and 2-decimal rounding.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.rect = self.rect.clamp_panel().rounded();
        self.rotation = round2(self.rotation);
        self.skew_x = round2(self.skew_x);
        self.skew_y = round2(self.skew_y);
        self
    }
}

/// Partial panel update. `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelPatch {
    pub rect: Option<PercentRect>,
    pub rotation: Option<f64>,
    pub skew_x: Option<f64>,
    pub skew_y: Option<f64>,
    pub z_index: Option<i32>,
    pub style: Option<PanelStyle>,
    /// `Some(None)` clears the artwork.
    pub artwork: Option<Option<ArtworkRef>>,
}

impl PanelPatch {
    #[must_use]
    pub fn rect(rect: PercentRect) -> Self {
        Self {
            rect: Some(rect),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn artwork(artwork: ArtworkRef) -> Self {
        Self {
            artwork: Some(Some(artwork)),
            ..Self::default()
        }
    }

    /// Every number the patch sets is finite.
    pub fn is_finite(&self) -> bool {
        self.rect.is_none_or(|rect| rect.is_finite())
            && [self.rotation, self.skew_x, self.skew_y]
                .into_iter()
                .flatten()
                .all(f64::is_finite)
    }

    /// Write the patched fields into `panel`.
    pub fn apply_to(&self, panel: &mut Panel) {
        if let Some(rect) = self.rect {
            panel.rect = rect;
        }
        if let Some(rotation) = self.rotation {
            panel.rotation = rotation;
        }
        if let Some(skew_x) = self.skew_x {
            panel.skew_x = skew_x;
        }
        if let Some(skew_y) = self.skew_y {
            panel.skew_y = skew_y;
        }
        if let Some(z_index) = self.z_index {
            panel.z_index = z_index;
        }
        if let Some(style) = &self.style {
            panel.style = style.clone();
        }
        if let Some(artwork) = &self.artwork {
            panel.artwork = artwork.clone();
        }
    }
}

/// Fields for a new speech bubble. The store assigns id and order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleDraft {
    pub rect: PercentRect,
    pub tail_end: PercentPoint,
    pub tail_type: TailType,
    pub kind: BubbleKind,
    pub style: BubbleStyle,
    pub text: String,
    pub z_index: i32,
}

impl BubbleDraft {
    /// A default speech bubble at `rect` whose tail points just below it.
    #[must_use]
    pub fn new(rect: PercentRect, text: impl Into<String>) -> Self {
        let kind = BubbleKind::default();
        Self {
            rect,
            tail_end: PercentPoint::new(rect.center().x, rect.bottom() + 5.0),
            tail_type: kind.default_tail(),
            kind,
            style: kind.default_style(),
            text: text.into(),
            z_index: 0,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: BubbleKind, style: BubbleStyle) -> Self {
        self.kind = kind;
        self.style = style;
        self.tail_type = kind.default_tail();
        self
    }

    #[must_use]
    pub fn with_tail(mut self, tail_end: PercentPoint) -> Self {
        self.tail_end = tail_end;
        self
    }

    pub fn is_finite(&self) -> bool {
        self.rect.is_finite() && self.tail_end.is_finite()
    }

    /// Clamp the rectangle, round everything; the tail is rounded but never clamped.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.rect = self.rect.clamp_bubble().rounded();
        self.tail_end = PercentPoint::new(round2(self.tail_end.x), round2(self.tail_end.y));
        self
    }
}

/// Partial speech bubble update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BubblePatch {
    pub rect: Option<PercentRect>,
    pub tail_end: Option<PercentPoint>,
    pub tail_type: Option<TailType>,
    pub kind: Option<BubbleKind>,
    pub style: Option<BubbleStyle>,
    pub text: Option<String>,
    pub z_index: Option<i32>,
}

impl BubblePatch {
    pub fn is_finite(&self) -> bool {
        self.rect.is_none_or(|rect| rect.is_finite())
            && self.tail_end.is_none_or(|tail| tail.is_finite())
    }

    /// Write the patched fields into `bubble`.
    pub fn apply_to(&self, bubble: &mut SpeechBubble) {
        if let Some(rect) = self.rect {
            bubble.rect = rect;
        }
        if let Some(tail_end) = self.tail_end {
            bubble.tail_end = tail_end;
        }
        if let Some(tail_type) = self.tail_type {
            bubble.tail_type = tail_type;
        }
        if let Some(kind) = self.kind {
            bubble.kind = kind;
        }
        if let Some(style) = self.style {
            bubble.style = style;
        }
        if let Some(text) = &self.text {
            bubble.text = text.clone();
        }
        if let Some(z_index) = self.z_index {
            bubble.z_index = z_index;
        }
    }
}

/// One entry of a batch panel position update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelPositionUpdate {
    pub id: PanelId,
    pub rect: PercentRect,
    #[serde(default)]
    pub z_index: Option<i32>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

/// One entry of a batch bubble position update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubblePositionUpdate {
    pub id: BubbleId,
    pub rect: PercentRect,
    #[serde(default)]
    pub z_index: Option<i32>,
}

/// Everything the store holds for one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub panels: Vec<Panel>,
    pub bubbles: Vec<SpeechBubble>,
    pub lines: Vec<DividerLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_record_parses_decimal_strings() {
        let json = r#"{
            "id": 4, "page": 1,
            "x_percent": "2.00", "y_percent": 2, "width_percent": "47.50",
            "height_percent": "oops", "artwork": "https://cdn/a.png"
        }"#;
        let panel: Panel = serde_json::from_str::<PanelRecord>(json)
            .expect("record parses")
            .into();
        assert_eq!(panel.rect, PercentRect::new(2.0, 2.0, 47.5, 0.0));
        assert_eq!(
            panel.artwork.as_ref().map(|a| a.file_url.as_str()),
            Some("https://cdn/a.png")
        );
        assert_eq!(panel.style.border_color, "#000000");
    }

    #[test]
    fn empty_artwork_url_means_no_artwork() {
        let json = r#"{"id": 1, "page": 1, "artwork": ""}"#;
        let panel: Panel = serde_json::from_str::<PanelRecord>(json)
            .expect("record parses")
            .into();
        assert!(panel.artwork.is_none());
    }

    #[test]
    fn region_from_vertices_derives_bounds_and_centroid() {
        let region = ComputedRegion::rect(RegionId::new("r0"), PercentRect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(region.bounds, PercentRect::new(10.0, 20.0, 40.0, 60.0));
        assert!((region.centroid.x - 30.0).abs() < 1e-9);
        assert!((region.centroid.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn triangle_region_bounds() {
        let region = ComputedRegion::from_vertices(
            RegionId::new("tri"),
            vec![
                PercentPoint::new(0.0, 0.0),
                PercentPoint::new(60.0, 0.0),
                PercentPoint::new(0.0, 30.0),
            ],
        );
        assert_eq!(region.bounds, PercentRect::new(0.0, 0.0, 60.0, 30.0));
        assert!((region.centroid.x - 20.0).abs() < 1e-9);
        assert!((region.centroid.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn draft_normalization_rounds_and_clamps() {
        let draft = PanelDraft::new(PercentRect::new(12.3456, -80.0, 4.0, 33.333)).normalized();
        assert_eq!(draft.rect, PercentRect::new(12.35, -50.0, 10.0, 33.33));
    }

    #[test]
    fn bubble_draft_keeps_tail_off_canvas() {
        let draft = BubbleDraft::new(PercentRect::new(-3.0, 10.0, 20.0, 10.0), "hi")
            .with_tail(PercentPoint::new(120.004, 50.0))
            .normalized();
        assert_eq!(draft.rect.x, 0.0);
        assert_eq!(draft.tail_end, PercentPoint::new(120.0, 50.0));
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut panel = Panel {
            id: PanelId::new(1),
            page_id: PageId::new(1),
            rect: PercentRect::new(0.0, 0.0, 50.0, 50.0),
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            z_index: 0,
            order: 0,
            style: PanelStyle::default(),
            artwork: None,
        };
        PanelPatch {
            z_index: Some(3),
            artwork: Some(Some(ArtworkRef::new("u"))),
            ..PanelPatch::default()
        }
        .apply_to(&mut panel);
        assert_eq!(panel.z_index, 3);
        assert_eq!(panel.rect, PercentRect::new(0.0, 0.0, 50.0, 50.0));
        assert!(panel.artwork.is_some());
    }

    #[test]
    fn transformed_panel_detection() {
        let mut panel = Panel {
            id: PanelId::new(1),
            page_id: PageId::new(1),
            rect: PercentRect::PAGE,
            rotation: 0.0,
            skew_x: -6.0,
            skew_y: 0.0,
            z_index: 0,
            order: 0,
            style: PanelStyle::default(),
            artwork: None,
        };
        assert!(panel.is_transformed(5.0));
        panel.skew_x = 5.0;
        assert!(!panel.is_transformed(5.0));
    }

    #[test]
    fn patches_report_non_finite_fields() {
        assert!(PanelPatch::default().is_finite());
        assert!(!PanelPatch::rect(PercentRect::new(0.0, 0.0, f64::NAN, 10.0)).is_finite());
        let patch = PanelPatch {
            skew_y: Some(f64::INFINITY),
            ..PanelPatch::default()
        };
        assert!(!patch.is_finite());

        let patch = BubblePatch {
            tail_end: Some(PercentPoint::new(f64::NEG_INFINITY, 0.0)),
            ..BubblePatch::default()
        };
        assert!(!patch.is_finite());
        assert!(!PanelDraft::new(PercentRect::new(f64::NAN, 0.0, 10.0, 10.0)).is_finite());
    }
}
