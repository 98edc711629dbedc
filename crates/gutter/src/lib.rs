#![forbid(unsafe_code)]

//! Gutter public facade crate.
//!
//! Re-exports the stable surface of the panel geometry engine and offers a
//! prelude for editor integrations.
//!
//! ```
//! use gutter::prelude::*;
//!
//! let mut editor = PageEditor::new(MemoryStore::new(), EngineConfig::from_env());
//! editor.initialize(PageId::new(1))?;
//! editor.apply_template("L-Shape", &mut true)?;
//! assert_eq!(editor.panels().len(), 3);
//! # Ok::<(), gutter::Error>(())
//! ```

use std::fmt;

// --- Geometry re-exports ---------------------------------------------------

pub use gutter_core::normalize::{
    clamp_bubble_rect, clamp_panel_rect, rect_to_percent, round2, snap_to_grid, to_percent,
};
pub use gutter_core::{PercentPoint, PercentRect, PixelPoint, PixelRect, PixelSize};

// --- Engine re-exports -----------------------------------------------------

pub use gutter_layout::{
    ArtworkRef, BackingStore, BubbleAdapter, BubbleDraft, BubbleKind, BubblePatch, BubbleShape,
    BubbleStyle, ComputedRegion, ConfigError, Confirm, ConfirmPrompt, DisplayMap, DividerLine,
    EditError, EngineConfig, FillGapOutcome, Gap, GapConfig, GapDetector, LineLayout, MemoryStore,
    MoveOutcome, PageEditor, PageId, Panel, PanelDraft, PanelId, PanelPatch, PanelStyle,
    RebuildDecision, RegionId, RegionSet, RegionTarget, ShapeProvider, ShapeRequest, SpeechBubble,
    StoreError, TailType, TemplateOutcome, bubble_kind_from_legacy, find_gaps, iou,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Gutter integrations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An editor operation failed.
    Edit(EditError),
    /// Configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edit(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Edit(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<EditError> for Error {
    fn from(err: EditError) -> Self {
        Self::Edit(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for Gutter APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ArtworkRef, BackingStore, BubbleDraft, Confirm, ConfirmPrompt, EngineConfig, Error,
        FillGapOutcome, LineLayout, MemoryStore, PageEditor, PageId, PanelDraft, PercentPoint,
        PercentRect, PixelRect, PixelSize, RegionId, Result, ShapeProvider, TemplateOutcome,
    };

    pub use crate::{core, layout};
}

pub use gutter_core as core;
pub use gutter_layout as layout;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn edit_errors_convert_and_chain() {
        let err: Error = EditError::UnknownTemplate("Zig".into()).into();
        assert_eq!(err.to_string(), "unknown panel template \"Zig\"");
        assert!(err.source().is_some());
    }

    #[test]
    fn config_errors_surface_through_result() {
        fn load() -> Result<EngineConfig> {
            let config = EngineConfig {
                reuse_iou_threshold: 2.0,
                ..EngineConfig::default()
            };
            config.try_validate()?;
            Ok(config)
        }
        assert!(matches!(load(), Err(Error::Config(_))));
    }
}
