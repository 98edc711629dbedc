#![forbid(unsafe_code)]

//! Panel layout engine: gaps, templates, region reconciliation and bubbles.
//!
//! The modules are usable on their own (pure functions over geometry) or
//! through [`PageEditor`](editor::PageEditor), which keeps one page in memory
//! and drives a [`BackingStore`](store::BackingStore).

pub mod bubble;
pub mod config;
pub mod editor;
pub mod error;
pub mod gaps;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod template;

#[allow(unused_imports)]
pub(crate) use gutter_core::{debug, info, warn};

pub use bubble::{
    BubbleAdapter, BubbleGeometry, BubbleKind, BubbleShape, BubbleStyle, ShapeProvider,
    ShapeRequest, StableCanvasSize, TailGeometry, TailType, bubble_kind_from_legacy,
};
pub use config::{ConfigError, EngineConfig};
pub use editor::{
    Confirm, ConfirmPrompt, FillGapOutcome, InitOutcome, MoveOutcome, PageEditor,
    RegionAttachment, TemplateOutcome,
};
pub use error::{EditError, StoreError, StoreOp};
pub use gaps::{Gap, GapConfig, GapDetector, find_gaps};
pub use model::{
    ArtworkRef, BorderStyle, BubbleDraft, BubbleId, BubblePatch, BubblePositionUpdate,
    ComputedRegion, DividerLine, LineId, LineShape, PageId, PageSnapshot, Panel, PanelDraft,
    PanelId, PanelPatch, PanelPositionUpdate, PanelRecord, PanelStyle, RegionId, RegionSet,
    SpeechBubble,
};
pub use reconcile::{
    DisplayMap, LineLayout, LoadDeduplicator, RebuildDecision, RebuildGate, RegionTarget,
    build_display_map, iou, resolve_region_target,
};
pub use store::{BackingStore, MemoryStore};
pub use template::{PanelTemplate, TEMPLATES, TemplateSlot, template};
