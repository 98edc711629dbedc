//! Speech bubble geometry adapter.
//!
//! Turns a stored bubble (canvas-relative percent rectangle plus an unbounded
//! tail endpoint) into the pixel geometry the external shape provider needs.
//! Path generation itself is the provider's job.
//!
//! Canvas measurements are routed through [`StableCanvasSize`]: reflow can
//! report sizes that wobble by a fraction of a pixel, and feeding those
//! straight into bubble placement makes bubbles jitter.

use gutter_core::normalize::{point_to_pixels, rect_to_pixels};
use gutter_core::{PercentPoint, PercentRect, PixelPoint, PixelRect, PixelSize};
use serde::{Deserialize, Serialize};

use crate::model::SpeechBubble;

/// What a bubble means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleKind {
    #[default]
    Speech,
    Thought,
    Shout,
    Whisper,
    Narration,
}

/// How a bubble's outline is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleStyle {
    #[default]
    Oval,
    Rounded,
    Cloud,
    Burst,
    Dashed,
    Box,
}

/// Tail rendering kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailType {
    #[default]
    Pointer,
    Curved,
    /// Trail of small circles, used by thought bubbles.
    Dots,
    None,
}

impl BubbleKind {
    /// Outline used when only the kind is known.
    #[must_use]
    pub const fn default_style(self) -> BubbleStyle {
        match self {
            Self::Speech => BubbleStyle::Oval,
            Self::Thought => BubbleStyle::Cloud,
            Self::Shout => BubbleStyle::Burst,
            Self::Whisper => BubbleStyle::Dashed,
            Self::Narration => BubbleStyle::Box,
        }
    }

    /// Tail used when only the kind is known.
    #[must_use]
    pub const fn default_tail(self) -> TailType {
        match self {
            Self::Thought => TailType::Dots,
            Self::Narration => TailType::None,
            Self::Speech | Self::Shout | Self::Whisper => TailType::Pointer,
        }
    }
}

impl BubbleStyle {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "oval" | "ellipse" => Some(Self::Oval),
            "rounded" | "rectangle" | "rect" => Some(Self::Rounded),
            "cloud" => Some(Self::Cloud),
            "burst" | "jagged" | "spiky" => Some(Self::Burst),
            "dashed" => Some(Self::Dashed),
            "box" | "caption" => Some(Self::Box),
            _ => None,
        }
    }
}

/// Map legacy loosely-typed `bubble_type`/`bubble_style` strings onto the
/// closed `(kind, style)` pair.
///
/// Legacy records stored a single `bubble_type` that mixed meaning and
/// outline (`"oval"`, `"thought"`, `"rectangle"`...). An explicit, parsable
/// `bubble_style` overrides the outline implied by the type. Unknown types
/// become a default speech bubble.
#[must_use]
pub fn bubble_kind_from_legacy(bubble_type: &str, bubble_style: Option<&str>) -> (BubbleKind, BubbleStyle) {
    let (kind, implied_style) = match bubble_type.trim().to_ascii_lowercase().as_str() {
        "oval" | "speech" => (BubbleKind::Speech, BubbleStyle::Oval),
        "rectangle" | "rounded" => (BubbleKind::Speech, BubbleStyle::Rounded),
        "thought" | "cloud" => (BubbleKind::Thought, BubbleStyle::Cloud),
        "shout" | "burst" | "scream" => (BubbleKind::Shout, BubbleStyle::Burst),
        "whisper" => (BubbleKind::Whisper, BubbleStyle::Dashed),
        "narrative" | "narration" | "caption" => (BubbleKind::Narration, BubbleStyle::Box),
        _ => (BubbleKind::Speech, BubbleStyle::Oval),
    };
    let style = bubble_style.and_then(BubbleStyle::parse).unwrap_or(implied_style);
    (kind, style)
}

/// Canvas size that only moves on changes larger than the jitter threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableCanvasSize {
    current: Option<PixelSize>,
    jitter_px: f64,
}

impl StableCanvasSize {
    /// Create an unmeasured canvas with the given jitter threshold.
    #[must_use]
    pub fn new(jitter_px: f64) -> Self {
        Self {
            current: None,
            jitter_px: jitter_px.max(0.0),
        }
    }

    /// Feed a new measurement. Returns `true` if the stable size changed.
    ///
    /// Unusable measurements (zero, negative, non-finite) are ignored.
    pub fn observe(&mut self, measured: PixelSize) -> bool {
        if !measured.is_usable() {
            crate::debug!(
                width = measured.width,
                height = measured.height,
                "ignoring unusable canvas measurement"
            );
            return false;
        }
        match self.current {
            Some(current)
                if (measured.width - current.width).abs() <= self.jitter_px
                    && (measured.height - current.height).abs() <= self.jitter_px =>
            {
                false
            }
            _ => {
                self.current = Some(measured);
                true
            }
        }
    }

    /// The last accepted size, if any.
    #[must_use]
    pub fn get(&self) -> Option<PixelSize> {
        self.current
    }
}

impl Default for StableCanvasSize {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Pixel geometry of one bubble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleGeometry {
    pub center: PixelPoint,
    pub tail_end: PixelPoint,
    pub bounds: PixelRect,
}

/// Project a bubble rectangle and tail endpoint onto the canvas.
#[must_use]
pub fn bubble_geometry(rect: PercentRect, tail_end: PercentPoint, canvas: PixelSize) -> BubbleGeometry {
    let bounds = rect_to_pixels(rect, canvas);
    BubbleGeometry {
        center: bounds.center(),
        tail_end: point_to_pixels(tail_end, canvas),
        bounds,
    }
}

/// Input handed to the shape provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeRequest {
    pub kind: BubbleKind,
    pub style: BubbleStyle,
    pub tail_type: TailType,
    pub geometry: BubbleGeometry,
}

/// Rendered tail primitives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailGeometry {
    pub base_left: PixelPoint,
    pub base_right: PixelPoint,
    pub tip: PixelPoint,
}

/// Provider output: an SVG-style path plus tail primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleShape {
    pub path: String,
    pub tail: Option<TailGeometry>,
}

/// External bubble outline generator.
pub trait ShapeProvider {
    fn bubble_shape(&self, request: &ShapeRequest) -> BubbleShape;
}

/// Builds shape requests for bubbles against a stable canvas size.
#[derive(Debug, Clone, Default)]
pub struct BubbleAdapter {
    canvas: StableCanvasSize,
}

impl BubbleAdapter {
    #[must_use]
    pub fn new(jitter_px: f64) -> Self {
        Self {
            canvas: StableCanvasSize::new(jitter_px),
        }
    }

    /// Forward a canvas measurement; see [`StableCanvasSize::observe`].
    pub fn observe_canvas(&mut self, measured: PixelSize) -> bool {
        self.canvas.observe(measured)
    }

    #[must_use]
    pub fn canvas(&self) -> Option<PixelSize> {
        self.canvas.get()
    }

    /// Shape request for `bubble`, or `None` before the canvas is measured.
    #[must_use]
    pub fn request_for(&self, bubble: &SpeechBubble) -> Option<ShapeRequest> {
        let canvas = self.canvas.get()?;
        Some(ShapeRequest {
            kind: bubble.kind,
            style: bubble.style,
            tail_type: bubble.tail_type,
            geometry: bubble_geometry(bubble.rect, bubble.tail_end, canvas),
        })
    }

    /// Ask `provider` for the bubble's outline.
    pub fn shape_for<P: ShapeProvider + ?Sized>(
        &self,
        bubble: &SpeechBubble,
        provider: &P,
    ) -> Option<BubbleShape> {
        self.request_for(bubble)
            .map(|request| provider.bubble_shape(&request))
    }
}
