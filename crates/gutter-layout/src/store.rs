//! Backing-store contract and an in-memory implementation.
//!
//! The editor never persists anything itself; it hands already-normalized
//! drafts and patches to a [`BackingStore`]. Every percent value crossing
//! this boundary has been rounded to 2 decimals.

use std::collections::BTreeMap;

use crate::error::{StoreError, StoreOp};
use crate::model::{
    BubbleDraft, BubbleId, BubblePatch, BubblePositionUpdate, DividerLine, LineId, PageId,
    PageSnapshot, Panel, PanelDraft, PanelId, PanelPatch, PanelPositionUpdate, SpeechBubble,
};

/// Persistence collaborator for panels and speech bubbles.
pub trait BackingStore {
    /// Everything stored for `page`, panels and bubbles in order.
    fn load_page(&mut self, page: PageId) -> Result<PageSnapshot, StoreError>;

    /// Create a panel; the store assigns the id and the next order.
    fn create_panel(&mut self, page: PageId, draft: &PanelDraft) -> Result<Panel, StoreError>;

    fn update_panel(&mut self, id: PanelId, patch: &PanelPatch) -> Result<Panel, StoreError>;

    /// Delete a panel and every bubble attached to it.
    fn delete_panel(&mut self, id: PanelId) -> Result<(), StoreError>;

    /// Create a bubble; the store assigns the id and the next order within
    /// the panel.
    fn create_speech_bubble(
        &mut self,
        panel: PanelId,
        draft: &BubbleDraft,
    ) -> Result<SpeechBubble, StoreError>;

    fn update_speech_bubble(
        &mut self,
        id: BubbleId,
        patch: &BubblePatch,
    ) -> Result<SpeechBubble, StoreError>;

    fn delete_speech_bubble(&mut self, id: BubbleId) -> Result<(), StoreError>;

    /// Apply several panel position updates. Unknown ids are skipped; the
    /// ids actually updated are returned.
    fn batch_update_panel_positions(
        &mut self,
        updates: &[PanelPositionUpdate],
    ) -> Result<Vec<PanelId>, StoreError>;

    /// Apply several bubble position updates. Unknown ids are skipped; the
    /// ids actually updated are returned.
    fn batch_update_bubble_positions(
        &mut self,
        updates: &[BubblePositionUpdate],
    ) -> Result<Vec<BubbleId>, StoreError>;
}

/// In-memory [`BackingStore`] with failure injection.
///
/// Ids are allocated from one counter per record kind, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    panels: BTreeMap<PanelId, Panel>,
    bubbles: BTreeMap<BubbleId, SpeechBubble>,
    lines: BTreeMap<LineId, DividerLine>,
    next_panel: u64,
    next_bubble: u64,
    next_line: u64,
    failures: Vec<(StoreOp, StoreError)>,
    calls: Vec<StoreOp>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `error`. Queued failures for the
    /// same op fire in order.
    pub fn fail_next(&mut self, op: StoreOp, error: StoreError) {
        self.failures.push((op, error));
    }

    /// Every call made so far, in order, including failed ones.
    #[must_use]
    pub fn calls(&self) -> &[StoreOp] {
        &self.calls
    }

    /// Seed a divider line for `page`. The id is assigned here.
    pub fn insert_line(&mut self, mut line: DividerLine) -> LineId {
        self.next_line += 1;
        line.id = LineId::new(self.next_line);
        let id = line.id;
        self.lines.insert(id, line);
        id
    }

    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.get(&id)
    }

    #[must_use]
    pub fn bubble(&self, id: BubbleId) -> Option<&SpeechBubble> {
        self.bubbles.get(&id)
    }

    /// Panels of `page` in order.
    #[must_use]
    pub fn panels_on(&self, page: PageId) -> Vec<&Panel> {
        let mut panels: Vec<&Panel> = self.panels.values().filter(|p| p.page_id == page).collect();
        panels.sort_by_key(|p| (p.order, p.id));
        panels
    }

    /// Bubbles attached to `panel` in order.
    #[must_use]
    pub fn bubbles_in(&self, panel: PanelId) -> Vec<&SpeechBubble> {
        let mut bubbles: Vec<&SpeechBubble> =
            self.bubbles.values().filter(|b| b.panel_id == panel).collect();
        bubbles.sort_by_key(|b| (b.order, b.id));
        bubbles
    }

    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        self.calls.push(op);
        match self.failures.iter().position(|(failing, _)| *failing == op) {
            Some(index) => Err(self.failures.remove(index).1),
            None => Ok(()),
        }
    }

    fn next_panel_order(&self, page: PageId) -> u32 {
        self.panels
            .values()
            .filter(|p| p.page_id == page)
            .map(|p| p.order + 1)
            .max()
            .unwrap_or(0)
    }

    fn next_bubble_order(&self, panel: PanelId) -> u32 {
        self.bubbles
            .values()
            .filter(|b| b.panel_id == panel)
            .map(|b| b.order + 1)
            .max()
            .unwrap_or(0)
    }
}

fn panel_not_found(id: PanelId) -> StoreError {
    StoreError::NotFound {
        entity: "panel",
        id: id.get(),
    }
}

fn bubble_not_found(id: BubbleId) -> StoreError {
    StoreError::NotFound {
        entity: "speech bubble",
        id: id.get(),
    }
}

impl BackingStore for MemoryStore {
    fn load_page(&mut self, page: PageId) -> Result<PageSnapshot, StoreError> {
        self.enter(StoreOp::LoadPage)?;
        let panels: Vec<Panel> = self.panels_on(page).into_iter().cloned().collect();
        let bubbles = panels
            .iter()
            .flat_map(|panel| self.bubbles_in(panel.id))
            .cloned()
            .collect();
        let mut lines: Vec<DividerLine> = self
            .lines
            .values()
            .filter(|line| line.page_id == page)
            .cloned()
            .collect();
        lines.sort_by_key(|line| (line.order, line.id));
        Ok(PageSnapshot {
            panels,
            bubbles,
            lines,
        })
    }

    fn create_panel(&mut self, page: PageId, draft: &PanelDraft) -> Result<Panel, StoreError> {
        self.enter(StoreOp::CreatePanel)?;
        self.next_panel += 1;
        let panel = Panel {
            id: PanelId::new(self.next_panel),
            page_id: page,
            rect: draft.rect,
            rotation: draft.rotation,
            skew_x: draft.skew_x,
            skew_y: draft.skew_y,
            z_index: draft.z_index,
            order: self.next_panel_order(page),
            style: draft.style.clone(),
            artwork: draft.artwork.clone(),
        };
        self.panels.insert(panel.id, panel.clone());
        Ok(panel)
    }

    fn update_panel(&mut self, id: PanelId, patch: &PanelPatch) -> Result<Panel, StoreError> {
        self.enter(StoreOp::UpdatePanel)?;
        let panel = self.panels.get_mut(&id).ok_or_else(|| panel_not_found(id))?;
        patch.apply_to(panel);
        Ok(panel.clone())
    }

    fn delete_panel(&mut self, id: PanelId) -> Result<(), StoreError> {
        self.enter(StoreOp::DeletePanel)?;
        self.panels.remove(&id).ok_or_else(|| panel_not_found(id))?;
        self.bubbles.retain(|_, bubble| bubble.panel_id != id);
        Ok(())
    }

    fn create_speech_bubble(
        &mut self,
        panel: PanelId,
        draft: &BubbleDraft,
    ) -> Result<SpeechBubble, StoreError> {
        self.enter(StoreOp::CreateBubble)?;
        if !self.panels.contains_key(&panel) {
            return Err(panel_not_found(panel));
        }
        self.next_bubble += 1;
        let bubble = SpeechBubble {
            id: BubbleId::new(self.next_bubble),
            panel_id: panel,
            rect: draft.rect,
            tail_end: draft.tail_end,
            tail_type: draft.tail_type,
            kind: draft.kind,
            style: draft.style,
            text: draft.text.clone(),
            z_index: draft.z_index,
            order: self.next_bubble_order(panel),
        };
        self.bubbles.insert(bubble.id, bubble.clone());
        Ok(bubble)
    }

    fn update_speech_bubble(
        &mut self,
        id: BubbleId,
        patch: &BubblePatch,
    ) -> Result<SpeechBubble, StoreError> {
        self.enter(StoreOp::UpdateBubble)?;
        let bubble = self.bubbles.get_mut(&id).ok_or_else(|| bubble_not_found(id))?;
        patch.apply_to(bubble);
        Ok(bubble.clone())
    }

    fn delete_speech_bubble(&mut self, id: BubbleId) -> Result<(), StoreError> {
        self.enter(StoreOp::DeleteBubble)?;
        self.bubbles.remove(&id).map(|_| ()).ok_or_else(|| bubble_not_found(id))
    }

    fn batch_update_panel_positions(
        &mut self,
        updates: &[PanelPositionUpdate],
    ) -> Result<Vec<PanelId>, StoreError> {
        self.enter(StoreOp::BatchPanelPositions)?;
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            let Some(panel) = self.panels.get_mut(&update.id) else {
                continue;
            };
            panel.rect = update.rect;
            if let Some(z_index) = update.z_index {
                panel.z_index = z_index;
            }
            if let Some(rotation) = update.rotation {
                panel.rotation = rotation;
            }
            updated.push(update.id);
        }
        Ok(updated)
    }

    fn batch_update_bubble_positions(
        &mut self,
        updates: &[BubblePositionUpdate],
    ) -> Result<Vec<BubbleId>, StoreError> {
        self.enter(StoreOp::BatchBubblePositions)?;
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            let Some(bubble) = self.bubbles.get_mut(&update.id) else {
                continue;
            };
            bubble.rect = update.rect;
            if let Some(z_index) = update.z_index {
                bubble.z_index = z_index;
            }
            updated.push(update.id);
        }
        Ok(updated)
    }
}
