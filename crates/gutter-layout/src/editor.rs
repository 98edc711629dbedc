//! Page editor: applies geometry decisions to a page and its backing store.
//!
//! [`PageEditor`] owns the in-memory copy of one page (panels, bubbles,
//! divider lines, the current region generation and the artwork display
//! map) and drives a [`BackingStore`]. It applies position changes to local
//! state before the store call and does not roll them back when the store
//! fails; the failure is returned to the caller instead.
//!
//! Geometry with a NaN or infinite component is dropped before anything is
//! touched. Pixel drags report [`MoveOutcome::Skipped`]; the percent-space
//! calls return `Ok(None)`.
//!
//! # Example
//!
//! ```
//! use gutter_layout::config::EngineConfig;
//! use gutter_layout::editor::{PageEditor, TemplateOutcome};
//! use gutter_layout::model::PageId;
//! use gutter_layout::store::MemoryStore;
//!
//! let mut editor = PageEditor::new(MemoryStore::new(), EngineConfig::default());
//! editor.initialize(PageId::new(1)).unwrap();
//! let outcome = editor.apply_template("4 Grid", &mut true).unwrap();
//! assert!(matches!(outcome, TemplateOutcome::Applied(ref panels) if panels.len() == 4));
//! assert!(editor.gaps().is_empty());
//! ```

use gutter_core::normalize::{rect_to_percent, round2, snap_rect};
use gutter_core::{PercentRect, PixelRect, PixelSize};

use crate::bubble::{BubbleAdapter, BubbleShape, ShapeProvider};
use crate::config::EngineConfig;
use crate::error::{EditError, StoreOp};
use crate::gaps::{Gap, GapDetector};
use crate::model::{
    ArtworkRef, BubbleDraft, BubbleId, BubblePatch, BubblePositionUpdate, DividerLine, PageId,
    Panel, PanelDraft, PanelId, PanelPatch, PanelPositionUpdate, PanelStyle, RegionId, RegionSet,
    SpeechBubble,
};
use crate::reconcile::{
    DisplayMap, LineLayout, LoadDeduplicator, LoadTicket, RebuildDecision, RebuildGate,
    RegionTarget, build_display_map, resolve_region_target,
};
use crate::store::BackingStore;
use crate::template::plan_template;

/// A destructive or lossy step awaiting user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPrompt {
    /// Applying `template` deletes `existing` panels.
    ReplacePanels {
        template: &'static str,
        existing: usize,
    },
    /// Gap filling treats panels as axis-aligned, but these are rotated or
    /// skewed.
    SkewedGapFill { transformed: Vec<PanelId> },
}

/// Answers confirmation prompts.
pub trait Confirm {
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&ConfirmPrompt) -> bool,
{
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> bool {
        self(prompt)
    }
}

/// A fixed answer.
impl Confirm for bool {
    fn confirm(&mut self, _prompt: &ConfirmPrompt) -> bool {
        *self
    }
}

/// Result of [`PageEditor::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Loaded,
    AlreadyLoaded,
    InFlight,
}

/// Result of [`PageEditor::fill_gap`].
#[derive(Debug, Clone, PartialEq)]
pub enum FillGapOutcome {
    Filled(Panel),
    /// No gap of the minimum size exists.
    NoGap,
    Declined,
}

/// Result of [`PageEditor::apply_template`].
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateOutcome {
    /// The new panels, in template order.
    Applied(Vec<Panel>),
    Declined,
}

/// Result of a drag or resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// The rectangle that was applied and sent to the store.
    Moved(PercentRect),
    /// The measurement was not finite; nothing changed.
    Skipped,
}

/// Panel an interaction on a region resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAttachment {
    pub panel: Panel,
    /// Whether the panel was materialized for this interaction.
    pub created: bool,
}

/// Rectangle used by "add panel": `scale` of the top gap, centered in it,
/// at least `min_extent` per side. Falls back to `fallback` without a gap.
#[must_use]
pub fn add_panel_rect(gap: Option<&Gap>, config: &EngineConfig) -> PercentRect {
    let Some(gap) = gap else {
        return config.fallback_panel;
    };
    let g = gap.rect;
    let width = (g.width * config.add_panel_scale).max(config.add_panel_min_extent);
    let height = (g.height * config.add_panel_scale).max(config.add_panel_min_extent);
    PercentRect::new(
        g.x + (g.width - width) / 2.0,
        g.y + (g.height - height) / 2.0,
        width,
        height,
    )
}

/// Editing session over one page at a time.
#[derive(Debug)]
pub struct PageEditor<S> {
    store: S,
    config: EngineConfig,
    detector: GapDetector,
    page: Option<PageId>,
    panels: Vec<Panel>,
    bubbles: Vec<SpeechBubble>,
    lines: Vec<DividerLine>,
    regions: Option<RegionSet>,
    gate: RebuildGate,
    loads: LoadDeduplicator<PageId>,
    display: DisplayMap,
    adapter: BubbleAdapter,
}

impl<S: BackingStore> PageEditor<S> {
    #[must_use]
    pub fn new(store: S, config: EngineConfig) -> Self {
        let config = config.validated();
        Self {
            store,
            detector: GapDetector::new(config.gap),
            gate: RebuildGate::new(config.region_retry_delay()),
            adapter: BubbleAdapter::new(config.canvas_jitter_px),
            config,
            page: None,
            panels: Vec::new(),
            bubbles: Vec::new(),
            lines: Vec::new(),
            regions: None,
            loads: LoadDeduplicator::new(),
            display: DisplayMap::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn page(&self) -> Option<PageId> {
        self.page
    }

    /// Panels of the current page, in page order.
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.id == id)
    }

    #[must_use]
    pub fn bubbles(&self) -> &[SpeechBubble] {
        &self.bubbles
    }

    #[must_use]
    pub fn bubble(&self, id: BubbleId) -> Option<&SpeechBubble> {
        self.bubbles.iter().find(|bubble| bubble.id == id)
    }

    #[must_use]
    pub fn lines(&self) -> &[DividerLine] {
        &self.lines
    }

    /// Current divider-line generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.gate.generation()
    }

    fn require_page(&self) -> Result<PageId, EditError> {
        self.page.ok_or(EditError::NoPage)
    }

    fn panel_index(&self, id: PanelId) -> Result<usize, EditError> {
        self.panels
            .iter()
            .position(|panel| panel.id == id)
            .ok_or(EditError::UnknownPanel(id))
    }

    fn bubble_index(&self, id: BubbleId) -> Result<usize, EditError> {
        self.bubbles
            .iter()
            .position(|bubble| bubble.id == id)
            .ok_or(EditError::UnknownBubble(id))
    }

    // --- loading -----------------------------------------------------------

    /// Load `page` once. Repeated calls for an already loaded (or loading)
    /// page do nothing.
    pub fn initialize(&mut self, page: PageId) -> Result<InitOutcome, EditError> {
        match self.loads.begin(page) {
            LoadTicket::Loaded if self.page == Some(page) => Ok(InitOutcome::AlreadyLoaded),
            LoadTicket::InFlight => Ok(InitOutcome::InFlight),
            _ => {
                self.load(page)?;
                Ok(InitOutcome::Loaded)
            }
        }
    }

    /// Reload the current page from the store.
    ///
    /// The display map is not rebuilt while the reload runs, and regions
    /// supplied for the previous state become stale.
    pub fn reload(&mut self) -> Result<(), EditError> {
        let page = self.require_page()?;
        self.loads.invalidate(&page);
        self.loads.begin(page);
        self.load(page)
    }

    fn load(&mut self, page: PageId) -> Result<(), EditError> {
        self.gate.begin_reload();
        let snapshot = match self.store.load_page(page) {
            Ok(snapshot) => snapshot,
            Err(source) => {
                self.gate.finish_reload();
                self.loads.fail(&page);
                return Err(EditError::store(StoreOp::LoadPage, source));
            }
        };

        self.page = Some(page);
        self.panels = snapshot.panels;
        self.bubbles = snapshot.bubbles;
        self.lines = snapshot.lines;
        self.regions = None;
        self.display = DisplayMap::default();
        self.gate.set_page(page);
        self.gate.set_lines(self.lines.len());
        self.gate.finish_reload();
        self.loads.complete(page);

        crate::info!(
            page = page.get(),
            panels = self.panels.len(),
            bubbles = self.bubbles.len(),
            lines = self.lines.len(),
            "page loaded"
        );
        Ok(())
    }

    // --- gaps --------------------------------------------------------------

    /// Disjoint gaps on the current page, largest first.
    #[must_use]
    pub fn gaps(&self) -> Vec<Gap> {
        self.detector.detect(self.panels.iter().map(|panel| panel.rect))
    }

    /// Create a panel in the largest gap, with a margin, or at the fallback
    /// rectangle when the page has no gap.
    pub fn add_panel(&mut self) -> Result<Panel, EditError> {
        let gaps = self.gaps();
        let rect = add_panel_rect(gaps.first(), &self.config);
        self.insert_panel(PanelDraft::new(rect))
    }

    /// Create a panel covering the largest gap exactly.
    ///
    /// When any panel is rotated or skewed past the warning angle, `confirm`
    /// is asked first since gaps are computed on unrotated boxes.
    pub fn fill_gap<C>(&mut self, confirm: &mut C) -> Result<FillGapOutcome, EditError>
    where
        C: Confirm + ?Sized,
    {
        self.require_page()?;
        let Some(gap) = self.gaps().into_iter().next() else {
            return Ok(FillGapOutcome::NoGap);
        };

        let transformed: Vec<PanelId> = self
            .panels
            .iter()
            .filter(|panel| panel.is_transformed(self.config.skew_warning_degrees))
            .map(|panel| panel.id)
            .collect();
        if !transformed.is_empty() && !confirm.confirm(&ConfirmPrompt::SkewedGapFill { transformed }) {
            return Ok(FillGapOutcome::Declined);
        }

        let panel = self.insert_panel(PanelDraft::new(gap.rect))?;
        Ok(FillGapOutcome::Filled(panel))
    }

    // --- templates ---------------------------------------------------------

    /// Replace every panel on the page with the named template.
    ///
    /// Existing panels are deleted first; a failed delete aborts before
    /// anything is created.
    pub fn apply_template<C>(&mut self, name: &str, confirm: &mut C) -> Result<TemplateOutcome, EditError>
    where
        C: Confirm + ?Sized,
    {
        let page = self.require_page()?;
        let template =
            crate::template::template(name).ok_or_else(|| EditError::UnknownTemplate(name.to_string()))?;
        let plan = plan_template(template, &self.panels);

        if plan.needs_confirmation()
            && !confirm.confirm(&ConfirmPrompt::ReplacePanels {
                template: template.name,
                existing: plan.delete.len(),
            })
        {
            return Ok(TemplateOutcome::Declined);
        }

        for (deleted, &id) in plan.delete.iter().enumerate() {
            if let Err(source) = self.store.delete_panel(id) {
                crate::warn!(
                    template = template.name,
                    panel = id.get(),
                    deleted,
                    error = %source,
                    "template aborted on failed delete"
                );
                return Err(EditError::TemplateAborted {
                    failed_panel: id,
                    deleted,
                    source,
                });
            }
            self.forget_panel(id);
        }

        let mut created = Vec::with_capacity(plan.create.len());
        for draft in &plan.create {
            let panel = self
                .store
                .create_panel(page, draft)
                .map_err(|source| EditError::store(StoreOp::CreatePanel, source))?;
            self.panels.push(panel.clone());
            created.push(panel);
        }

        crate::info!(
            page = page.get(),
            template = template.name,
            replaced = plan.delete.len(),
            created = created.len(),
            "template applied"
        );
        Ok(TemplateOutcome::Applied(created))
    }

    /// Delete every panel on the page. Stops at the first failure.
    pub fn clear_page(&mut self) -> Result<usize, EditError> {
        self.require_page()?;
        let ids: Vec<PanelId> = self.panels.iter().map(|panel| panel.id).collect();
        for id in &ids {
            self.delete_panel(*id)?;
        }
        Ok(ids.len())
    }

    // --- panels ------------------------------------------------------------

    /// Create a panel from `draft` after normalizing it.
    ///
    /// Returns `Ok(None)` without touching the store when the draft holds a
    /// non-finite number.
    pub fn create_panel(&mut self, draft: PanelDraft) -> Result<Option<Panel>, EditError> {
        self.require_page()?;
        if !draft.is_finite() {
            crate::debug!(rect = ?draft.rect, "discarding non-finite panel draft");
            return Ok(None);
        }
        self.insert_panel(draft).map(Some)
    }

    fn insert_panel(&mut self, draft: PanelDraft) -> Result<Panel, EditError> {
        let page = self.require_page()?;
        let panel = self
            .store
            .create_panel(page, &draft.normalized())
            .map_err(|source| EditError::store(StoreOp::CreatePanel, source))?;
        self.panels.push(panel.clone());
        Ok(panel)
    }

    /// Commit a finished drag or resize reported in canvas pixels.
    ///
    /// Non-finite measurements are skipped. Otherwise the rectangle is
    /// optionally snapped, clamped and rounded, applied locally, then sent.
    pub fn move_panel(
        &mut self,
        id: PanelId,
        pixels: PixelRect,
        canvas: PixelSize,
        snap: bool,
    ) -> Result<MoveOutcome, EditError> {
        let index = self.panel_index(id)?;
        let Some(mut rect) = rect_to_percent(pixels, canvas) else {
            return Ok(MoveOutcome::Skipped);
        };
        if snap {
            rect = snap_rect(rect, self.config.snap_grid);
        }
        let rect = rect.clamp_panel().rounded();

        self.panels[index].rect = rect;
        self.store
            .update_panel(id, &PanelPatch::rect(rect))
            .map_err(|source| EditError::store(StoreOp::UpdatePanel, source))?;
        Ok(MoveOutcome::Moved(rect))
    }

    /// Apply a partial update. Rectangles are clamped and every number is
    /// rounded before the patch is applied locally and sent.
    ///
    /// A patch carrying a non-finite number is discarded: `Ok(None)`, no
    /// local change and no store call.
    pub fn update_panel(&mut self, id: PanelId, patch: PanelPatch) -> Result<Option<Panel>, EditError> {
        self.panel_index(id)?;
        if !patch.is_finite() {
            crate::debug!(panel = id.get(), "discarding non-finite panel patch");
            return Ok(None);
        }
        self.patch_panel(id, patch).map(Some)
    }

    fn patch_panel(&mut self, id: PanelId, patch: PanelPatch) -> Result<Panel, EditError> {
        let index = self.panel_index(id)?;
        let patch = PanelPatch {
            rect: patch.rect.map(|rect| rect.clamp_panel().rounded()),
            rotation: patch.rotation.map(round2),
            skew_x: patch.skew_x.map(round2),
            skew_y: patch.skew_y.map(round2),
            ..patch
        };
        patch.apply_to(&mut self.panels[index]);
        let stored = self
            .store
            .update_panel(id, &patch)
            .map_err(|source| EditError::store(StoreOp::UpdatePanel, source))?;
        self.panels[index] = stored.clone();
        Ok(stored)
    }

    pub fn set_panel_style(&mut self, id: PanelId, style: PanelStyle) -> Result<Panel, EditError> {
        self.patch_panel(
            id,
            PanelPatch {
                style: Some(style),
                ..PanelPatch::default()
            },
        )
    }

    /// Set rotation and skew in degrees. Non-finite angles are discarded as
    /// in [`update_panel`](Self::update_panel).
    pub fn set_panel_transform(
        &mut self,
        id: PanelId,
        rotation: f64,
        skew_x: f64,
        skew_y: f64,
    ) -> Result<Option<Panel>, EditError> {
        self.update_panel(
            id,
            PanelPatch {
                rotation: Some(rotation),
                skew_x: Some(skew_x),
                skew_y: Some(skew_y),
                ..PanelPatch::default()
            },
        )
    }

    /// Delete a panel and its bubbles.
    pub fn delete_panel(&mut self, id: PanelId) -> Result<(), EditError> {
        self.panel_index(id)?;
        self.store
            .delete_panel(id)
            .map_err(|source| EditError::store(StoreOp::DeletePanel, source))?;
        self.forget_panel(id);
        Ok(())
    }

    fn forget_panel(&mut self, id: PanelId) {
        self.panels.retain(|panel| panel.id != id);
        self.bubbles.retain(|bubble| bubble.panel_id != id);
    }

    /// Move several panels at once. Entries for panels not on this page are
    /// dropped; the ids the store updated are returned.
    pub fn batch_move_panels(
        &mut self,
        updates: &[PanelPositionUpdate],
    ) -> Result<Vec<PanelId>, EditError> {
        let mut normalized = Vec::with_capacity(updates.len());
        for update in updates {
            let Ok(index) = self.panel_index(update.id) else {
                continue;
            };
            if !update.rect.is_finite() || update.rotation.is_some_and(|r| !r.is_finite()) {
                crate::debug!(panel = update.id.get(), "skipping non-finite batch entry");
                continue;
            }
            let entry = PanelPositionUpdate {
                id: update.id,
                rect: update.rect.clamp_panel().rounded(),
                z_index: update.z_index,
                rotation: update.rotation.map(round2),
            };
            let panel = &mut self.panels[index];
            panel.rect = entry.rect;
            if let Some(z_index) = entry.z_index {
                panel.z_index = z_index;
            }
            if let Some(rotation) = entry.rotation {
                panel.rotation = rotation;
            }
            normalized.push(entry);
        }
        self.store
            .batch_update_panel_positions(&normalized)
            .map_err(|source| EditError::store(StoreOp::BatchPanelPositions, source))
    }

    // --- regions -----------------------------------------------------------

    /// Replace the page's divider lines. Regions supplied so far become
    /// stale. Returns the new generation.
    pub fn set_divider_lines(&mut self, lines: Vec<DividerLine>) -> u64 {
        self.lines = lines;
        self.regions = None;
        self.gate.set_lines(self.lines.len())
    }

    /// Accept regions computed elsewhere. Stale sets are ignored and `false`
    /// is returned.
    pub fn supply_regions(&mut self, regions: RegionSet) -> bool {
        if !self.gate.is_current(&regions) {
            crate::debug!(
                generation = regions.generation,
                current = self.gate.generation(),
                "dropping stale region set"
            );
            return false;
        }
        self.regions = Some(regions);
        true
    }

    /// Compute regions for the current lines with `layout` and take the
    /// canvas size it reports.
    pub fn recompute_regions<L>(&mut self, layout: &L) -> Result<&RegionSet, EditError>
    where
        L: LineLayout + ?Sized,
    {
        let page = self.require_page()?;
        self.adapter.observe_canvas(layout.canvas_size());
        let regions = layout.compute_regions(page, &self.lines);
        let generation = self.gate.generation();
        let set = self.regions.insert(RegionSet::new(page, generation, regions));
        Ok(&*set)
    }

    #[must_use]
    pub fn regions(&self) -> Option<&RegionSet> {
        self.regions.as_ref()
    }

    /// Rebuild the artwork display map if regions allow it.
    ///
    /// On [`RebuildDecision::Defer`] the caller schedules another attempt
    /// after `retry_after`; the previous map stays in place meanwhile.
    pub fn rebuild_display_map(&mut self) -> RebuildDecision {
        let decision = self.gate.evaluate(self.regions.as_ref());
        if decision == RebuildDecision::Rebuild {
            let threshold = self.config.display_iou_threshold;
            self.display = match &self.regions {
                Some(regions) => build_display_map(&self.panels, regions, threshold),
                None => build_display_map(
                    &self.panels,
                    &RegionSet::new(self.page.unwrap_or_default(), self.gate.generation(), Vec::new()),
                    threshold,
                ),
            };
        }
        decision
    }

    #[must_use]
    pub fn display_map(&self) -> &DisplayMap {
        &self.display
    }

    fn check_regions(&self, regions: &RegionSet) -> Result<(), EditError> {
        if self.gate.is_current(regions) {
            return Ok(());
        }
        Err(EditError::StaleRegions {
            page: regions.page_id,
            generation: regions.generation,
            expected_page: self.page.unwrap_or_default(),
            expected_generation: self.gate.generation(),
        })
    }

    /// How an interaction on `region` would resolve, without side effects.
    pub fn resolve_region(&self, regions: &RegionSet, region: &RegionId) -> Result<RegionTarget, EditError> {
        self.require_page()?;
        self.check_regions(regions)?;
        let computed = regions
            .get(region)
            .ok_or_else(|| EditError::UnknownRegion(region.clone()))?;
        Ok(resolve_region_target(
            computed,
            &self.panels,
            self.config.reuse_iou_threshold,
        ))
    }

    fn panel_for_region(
        &mut self,
        regions: &RegionSet,
        region: &RegionId,
        artwork: Option<ArtworkRef>,
    ) -> Result<RegionAttachment, EditError> {
        match self.resolve_region(regions, region)? {
            RegionTarget::Reuse { panel, .. } => {
                let panel = match artwork {
                    Some(artwork) => self.patch_panel(panel, PanelPatch::artwork(artwork))?,
                    None => self.panels[self.panel_index(panel)?].clone(),
                };
                Ok(RegionAttachment {
                    panel,
                    created: false,
                })
            }
            RegionTarget::Create { rect } => {
                let mut draft = PanelDraft::new(rect);
                draft.artwork = artwork;
                let panel = self.insert_panel(draft)?;
                crate::info!(
                    region = %region,
                    panel = panel.id.get(),
                    "materialized panel for region"
                );
                Ok(RegionAttachment {
                    panel,
                    created: true,
                })
            }
        }
    }

    /// Attach dropped or uploaded artwork to the panel behind `region`,
    /// creating the panel when none matches, then refresh the display map.
    pub fn attach_artwork(
        &mut self,
        regions: &RegionSet,
        region: &RegionId,
        artwork: ArtworkRef,
    ) -> Result<RegionAttachment, EditError> {
        let attachment = self.panel_for_region(regions, region, Some(artwork))?;
        self.rebuild_display_map();
        Ok(attachment)
    }

    // --- bubbles -----------------------------------------------------------

    /// Create a bubble on `panel`. A draft with a non-finite rectangle or
    /// tail is discarded and `Ok(None)` returned.
    pub fn add_bubble(&mut self, panel: PanelId, draft: BubbleDraft) -> Result<Option<SpeechBubble>, EditError> {
        self.panel_index(panel)?;
        if !draft.is_finite() {
            crate::debug!(panel = panel.get(), "discarding non-finite bubble draft");
            return Ok(None);
        }
        self.insert_bubble(panel, draft).map(Some)
    }

    fn insert_bubble(&mut self, panel: PanelId, draft: BubbleDraft) -> Result<SpeechBubble, EditError> {
        let bubble = self
            .store
            .create_speech_bubble(panel, &draft.normalized())
            .map_err(|source| EditError::store(StoreOp::CreateBubble, source))?;
        self.bubbles.push(bubble.clone());
        Ok(bubble)
    }

    /// Create a bubble on the panel behind `region`, materializing the panel
    /// first when none matches. A non-finite draft is discarded before any
    /// panel is created.
    pub fn add_bubble_to_region(
        &mut self,
        regions: &RegionSet,
        region: &RegionId,
        draft: BubbleDraft,
    ) -> Result<Option<(RegionAttachment, SpeechBubble)>, EditError> {
        if !draft.is_finite() {
            crate::debug!(region = %region, "discarding non-finite bubble draft");
            return Ok(None);
        }
        let attachment = self.panel_for_region(regions, region, None)?;
        let bubble = self.insert_bubble(attachment.panel.id, draft)?;
        Ok(Some((attachment, bubble)))
    }

    /// Apply a partial bubble update. The rectangle is clamped to the
    /// canvas; the tail endpoint is rounded but may point anywhere. A
    /// non-finite rectangle or tail discards the whole patch (`Ok(None)`).
    pub fn update_bubble(&mut self, id: BubbleId, patch: BubblePatch) -> Result<Option<SpeechBubble>, EditError> {
        let index = self.bubble_index(id)?;
        if !patch.is_finite() {
            crate::debug!(bubble = id.get(), "discarding non-finite bubble patch");
            return Ok(None);
        }
        let patch = BubblePatch {
            rect: patch.rect.map(|rect| rect.clamp_bubble().rounded()),
            tail_end: patch
                .tail_end
                .map(|tail| gutter_core::PercentPoint::new(round2(tail.x), round2(tail.y))),
            ..patch
        };
        patch.apply_to(&mut self.bubbles[index]);
        let stored = self
            .store
            .update_speech_bubble(id, &patch)
            .map_err(|source| EditError::store(StoreOp::UpdateBubble, source))?;
        self.bubbles[index] = stored.clone();
        Ok(Some(stored))
    }

    /// Commit a finished bubble drag or resize reported in canvas pixels.
    pub fn move_bubble(
        &mut self,
        id: BubbleId,
        pixels: PixelRect,
        canvas: PixelSize,
    ) -> Result<MoveOutcome, EditError> {
        self.bubble_index(id)?;
        let Some(rect) = rect_to_percent(pixels, canvas) else {
            return Ok(MoveOutcome::Skipped);
        };
        let stored = self.update_bubble(
            id,
            BubblePatch {
                rect: Some(rect),
                ..BubblePatch::default()
            },
        )?;
        Ok(stored.map_or(MoveOutcome::Skipped, |bubble| MoveOutcome::Moved(bubble.rect)))
    }

    /// Move several bubbles at once; see [`batch_move_panels`](Self::batch_move_panels).
    pub fn batch_move_bubbles(
        &mut self,
        updates: &[BubblePositionUpdate],
    ) -> Result<Vec<BubbleId>, EditError> {
        let mut normalized = Vec::with_capacity(updates.len());
        for update in updates {
            let Ok(index) = self.bubble_index(update.id) else {
                continue;
            };
            if !update.rect.is_finite() {
                crate::debug!(bubble = update.id.get(), "skipping non-finite batch entry");
                continue;
            }
            let entry = BubblePositionUpdate {
                id: update.id,
                rect: update.rect.clamp_bubble().rounded(),
                z_index: update.z_index,
            };
            let bubble = &mut self.bubbles[index];
            bubble.rect = entry.rect;
            if let Some(z_index) = entry.z_index {
                bubble.z_index = z_index;
            }
            normalized.push(entry);
        }
        self.store
            .batch_update_bubble_positions(&normalized)
            .map_err(|source| EditError::store(StoreOp::BatchBubblePositions, source))
    }

    pub fn delete_bubble(&mut self, id: BubbleId) -> Result<(), EditError> {
        self.bubble_index(id)?;
        self.store
            .delete_speech_bubble(id)
            .map_err(|source| EditError::store(StoreOp::DeleteBubble, source))?;
        self.bubbles.retain(|bubble| bubble.id != id);
        Ok(())
    }

    /// Feed a canvas measurement to the bubble adapter. Returns whether the
    /// stable size changed.
    pub fn observe_canvas(&mut self, measured: PixelSize) -> bool {
        self.adapter.observe_canvas(measured)
    }

    /// Outline for a bubble, or `None` before the canvas has been measured.
    pub fn bubble_shape<P>(&self, id: BubbleId, provider: &P) -> Result<Option<BubbleShape>, EditError>
    where
        P: ShapeProvider + ?Sized,
    {
        let bubble = &self.bubbles[self.bubble_index(id)?];
        Ok(self.adapter.shape_for(bubble, provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::gaps::find_gaps;
    use crate::store::MemoryStore;

    fn editor() -> PageEditor<MemoryStore> {
        let mut editor = PageEditor::new(MemoryStore::new(), EngineConfig::default());
        editor.initialize(PageId::new(1)).expect("load page");
        editor
    }

    #[test]
    fn add_panel_rect_leaves_a_margin() {
        let config = EngineConfig::default();
        let gap = find_gaps(&[])[0];
        assert_eq!(
            add_panel_rect(Some(&gap), &config),
            PercentRect::new(10.0, 10.0, 80.0, 80.0)
        );

        let narrow = Gap {
            rect: PercentRect::new(90.0, 0.0, 10.0, 100.0),
            area: 1_000.0,
        };
        let rect = add_panel_rect(Some(&narrow), &config);
        assert_eq!(rect.width, 20.0);
        assert_eq!(rect.x, 85.0);

        assert_eq!(add_panel_rect(None, &config), config.fallback_panel);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut editor = editor();
        assert_eq!(
            editor.initialize(PageId::new(1)),
            Ok(InitOutcome::AlreadyLoaded)
        );
        assert_eq!(
            editor.store().calls().iter().filter(|op| **op == StoreOp::LoadPage).count(),
            1
        );
    }

    #[test]
    fn operations_need_a_page() {
        let mut editor = PageEditor::new(MemoryStore::new(), EngineConfig::default());
        assert_eq!(editor.add_panel(), Err(EditError::NoPage));
    }

    #[test]
    fn add_panel_on_full_page_uses_fallback() {
        let mut editor = editor();
        editor
            .create_panel(PanelDraft::new(PercentRect::PAGE))
            .expect("full page panel");
        let panel = editor.add_panel().expect("add");
        assert_eq!(panel.rect, PercentRect::new(10.0, 10.0, 40.0, 40.0));
    }

    #[test]
    fn nan_drag_is_skipped() {
        let mut editor = editor();
        let panel = editor.add_panel().expect("add");
        let outcome = editor
            .move_panel(
                panel.id,
                PixelRect::new(f64::NAN, 0.0, 100.0, 100.0),
                PixelSize::new(1000.0, 1000.0),
                false,
            )
            .expect("move");
        assert_eq!(outcome, MoveOutcome::Skipped);
        assert_eq!(editor.panel(panel.id).map(|p| p.rect), Some(panel.rect));
        assert!(!editor.store().calls().contains(&StoreOp::UpdatePanel));
    }

    #[test]
    fn failed_update_keeps_local_position() {
        let mut editor = editor();
        let panel = editor.add_panel().expect("add");
        editor.store_mut().fail_next(
            StoreOp::UpdatePanel,
            StoreError::Unavailable {
                reason: "timeout".into(),
            },
        );
        let err = editor
            .move_panel(
                panel.id,
                PixelRect::new(100.0, 100.0, 300.0, 300.0),
                PixelSize::new(1000.0, 1000.0),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, EditError::Store { op: StoreOp::UpdatePanel, .. }));
        assert_eq!(
            editor.panel(panel.id).map(|p| p.rect),
            Some(PercentRect::new(10.0, 10.0, 30.0, 30.0))
        );
    }

    #[test]
    fn closures_and_bools_confirm() {
        let mut asked = Vec::new();
        let mut record = |prompt: &ConfirmPrompt| {
            asked.push(prompt.clone());
            false
        };
        let prompt = ConfirmPrompt::SkewedGapFill {
            transformed: vec![PanelId::new(1)],
        };
        assert!(!record.confirm(&prompt));
        assert!(true.confirm(&prompt));
        assert_eq!(asked.len(), 1);
    }
}
