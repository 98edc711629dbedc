//! Error types for store calls and editor operations.
//!
//! Only real failures are errors. Discarded measurements, declined
//! confirmations and "no gap available" are ordinary outcomes and show up as
//! variants of each operation's outcome type instead.

use std::fmt;

use crate::model::{BubbleId, PageId, PanelId, RegionId};

/// Backing-store call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    LoadPage,
    CreatePanel,
    UpdatePanel,
    DeletePanel,
    CreateBubble,
    UpdateBubble,
    DeleteBubble,
    BatchPanelPositions,
    BatchBubblePositions,
}

impl StoreOp {
    /// Stable name for logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadPage => "load_page",
            Self::CreatePanel => "create_panel",
            Self::UpdatePanel => "update_panel",
            Self::DeletePanel => "delete_panel",
            Self::CreateBubble => "create_speech_bubble",
            Self::UpdateBubble => "update_speech_bubble",
            Self::DeleteBubble => "delete_speech_bubble",
            Self::BatchPanelPositions => "batch_update_panel_positions",
            Self::BatchBubblePositions => "batch_update_bubble_positions",
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a [`BackingStore`](crate::store::BackingStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced record does not exist.
    NotFound { entity: &'static str, id: u64 },
    /// The store refused the write (validation, permissions).
    Rejected { reason: String },
    /// The store could not be reached.
    Unavailable { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::Rejected { reason } => write!(f, "store rejected write: {reason}"),
            Self::Unavailable { reason } => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Editor operation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    /// A backing-store call failed. Local state is not rolled back.
    Store { op: StoreOp, source: StoreError },
    /// Template application stopped at a failed delete; nothing was created.
    TemplateAborted {
        failed_panel: PanelId,
        deleted: usize,
        source: StoreError,
    },
    /// No page has been loaded into the editor.
    NoPage,
    UnknownPanel(PanelId),
    UnknownBubble(BubbleId),
    UnknownTemplate(String),
    UnknownRegion(RegionId),
    /// Regions were computed for a different page or divider-line generation.
    StaleRegions {
        page: PageId,
        generation: u64,
        expected_page: PageId,
        expected_generation: u64,
    },
}

impl EditError {
    pub(crate) fn store(op: StoreOp, source: StoreError) -> Self {
        crate::warn!(op = op.as_str(), error = %source, "backing store call failed");
        Self::Store { op, source }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { op, source } => write!(f, "{op} failed: {source}"),
            Self::TemplateAborted {
                failed_panel,
                deleted,
                source,
            } => write!(
                f,
                "template aborted: could not delete panel {failed_panel} after deleting {deleted}: {source}"
            ),
            Self::NoPage => f.write_str("no page loaded"),
            Self::UnknownPanel(id) => write!(f, "unknown panel {id}"),
            Self::UnknownBubble(id) => write!(f, "unknown speech bubble {id}"),
            Self::UnknownTemplate(name) => write!(f, "unknown panel template {name:?}"),
            Self::UnknownRegion(id) => write!(f, "unknown region {id}"),
            Self::StaleRegions {
                page,
                generation,
                expected_page,
                expected_generation,
            } => write!(
                f,
                "regions for page {page} generation {generation} are stale \
                 (current page {expected_page} generation {expected_generation})"
            ),
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store { source, .. } | Self::TemplateAborted { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn store_error_chains_as_source() {
        let err = EditError::Store {
            op: StoreOp::UpdatePanel,
            source: StoreError::Unavailable {
                reason: "timeout".into(),
            },
        };
        assert_eq!(err.to_string(), "update_panel failed: store unavailable: timeout");
        assert!(err.source().is_some());
    }

    #[test]
    fn unknown_panel_has_no_source() {
        let err = EditError::UnknownPanel(PanelId::new(7));
        assert_eq!(err.to_string(), "unknown panel 7");
        assert!(err.source().is_none());
    }
}
