//! Region reconciliation between persisted panels and computed regions.
//!
//! Two geometric models describe the same page: panels persisted as
//! rectangles, and polygon regions recomputed from divider lines. They drift
//! apart through rounding and re-layout, so identity is decided by
//! intersection-over-union of bounding boxes, with two separate thresholds:
//!
//! - **reuse** (strict, 0.30 by default): whether an interaction on a region
//!   targets an existing panel or materializes a new one.
//! - **display** (loose, 0.05 by default): whether a panel's artwork is shown
//!   on a region.
//!
//! Regions carry the page and divider-line generation they were computed
//! for. [`RebuildGate`] tracks the current generation and refuses to match
//! against stale or not-yet-computed regions.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::time::Duration;

use gutter_core::{PercentRect, PixelSize};
use rustc_hash::FxHashMap;

use crate::model::{
    ArtworkRef, ComputedRegion, DividerLine, PageId, Panel, PanelId, RegionId, RegionSet,
};

/// Intersection-over-union of two rectangles, in `[0, 1]`.
#[inline]
#[must_use]
pub fn iou(a: &PercentRect, b: &PercentRect) -> f64 {
    a.iou(b)
}

/// Best overlap found for a rectangle.
#[derive(Debug)]
pub struct Match<'a, T> {
    pub item: &'a T,
    pub iou: f64,
}

impl<T> Clone for Match<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Match<'_, T> {}

fn best_match<'a, T>(
    bounds: &PercentRect,
    items: &'a [T],
    rect_of: impl Fn(&T) -> PercentRect,
) -> Option<Match<'a, T>> {
    let mut best: Option<Match<'a, T>> = None;
    for item in items {
        let score = iou(bounds, &rect_of(item));
        // Strict comparison: the first item wins exact ties.
        if score > best.map_or(0.0, |m| m.iou) {
            best = Some(Match { item, iou: score });
        }
    }
    best
}

/// The panel overlapping `bounds` the most, if any overlaps at all.
#[must_use]
pub fn best_panel_match<'a>(bounds: &PercentRect, panels: &'a [Panel]) -> Option<Match<'a, Panel>> {
    best_match(bounds, panels, |panel| panel.rect)
}

/// The region overlapping `bounds` the most, if any overlaps at all.
#[must_use]
pub fn best_region_match<'a>(
    bounds: &PercentRect,
    regions: &'a [ComputedRegion],
) -> Option<Match<'a, ComputedRegion>> {
    best_match(bounds, regions, |region| region.bounds)
}

/// What an interaction on a region should act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionTarget {
    /// An existing panel matches the region well enough.
    Reuse { panel: PanelId, iou: f64 },
    /// No panel matches; create one at `rect` (the region bounds, rounded).
    Create { rect: PercentRect },
}

/// Decide whether `region` maps to an existing panel.
///
/// Reuses the best-overlapping panel when its IoU is strictly above
/// `threshold`. A threshold above 1 always creates; a threshold of 0 reuses
/// whenever any panel overlaps.
#[must_use]
pub fn resolve_region_target(region: &ComputedRegion, panels: &[Panel], threshold: f64) -> RegionTarget {
    match best_panel_match(&region.bounds, panels) {
        Some(found) if found.iou > threshold => RegionTarget::Reuse {
            panel: found.item.id,
            iou: found.iou,
        },
        _ => RegionTarget::Create {
            rect: region.bounds.rounded(),
        },
    }
}

/// Artwork shown on one region.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub panel: PanelId,
    pub artwork: ArtworkRef,
    pub iou: f64,
}

/// Region id to artwork mapping for one region generation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayMap {
    page_id: PageId,
    generation: u64,
    entries: BTreeMap<RegionId, DisplayEntry>,
}

impl DisplayMap {
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn get(&self, region: &RegionId) -> Option<&DisplayEntry> {
        self.entries.get(region)
    }

    /// Artwork to render on `region`.
    #[must_use]
    pub fn artwork_for(&self, region: &RegionId) -> Option<&ArtworkRef> {
        self.entries.get(region).map(|entry| &entry.artwork)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &DisplayEntry)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Match every artwork-bearing panel to its best region.
///
/// A panel is shown on the region with the highest IoU above `threshold`;
/// exact ties go to the region listed first. When two panels pick the same
/// region the higher IoU keeps it, and on a tie the panel listed first does.
#[must_use]
pub fn build_display_map(panels: &[Panel], regions: &RegionSet, threshold: f64) -> DisplayMap {
    let mut entries: BTreeMap<RegionId, DisplayEntry> = BTreeMap::new();
    for panel in panels {
        let Some(artwork) = &panel.artwork else {
            continue;
        };
        let Some(found) = best_region_match(&panel.rect, &regions.regions) else {
            continue;
        };
        if found.iou <= threshold {
            continue;
        }
        let replace = entries
            .get(&found.item.id)
            .is_none_or(|existing| found.iou > existing.iou);
        if replace {
            entries.insert(
                found.item.id.clone(),
                DisplayEntry {
                    panel: panel.id,
                    artwork: artwork.clone(),
                    iou: found.iou,
                },
            );
        }
    }
    DisplayMap {
        page_id: regions.page_id,
        generation: regions.generation,
        entries,
    }
}

/// Derives regions from divider lines and reports the canvas size.
pub trait LineLayout {
    /// Regions for `lines` on `page`, in a stable order.
    fn compute_regions(&self, page: PageId, lines: &[DividerLine]) -> Vec<ComputedRegion>;

    /// Current canvas size in pixels.
    fn canvas_size(&self) -> PixelSize;
}

/// Result of [`RebuildGate::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildDecision {
    /// Regions are current; rebuild the display map now.
    Rebuild,
    /// The page has divider lines but no regions yet; try again later.
    Defer { retry_after: Duration, attempt: u32 },
    /// A reload is in progress, or no page is loaded.
    Suppressed,
    /// Regions belong to another page or an older line generation.
    Stale,
}

/// Decides when the display map may be rebuilt.
///
/// Every page switch and divider-line change bumps the generation. Region
/// sets stamped with an older generation are never matched.
#[derive(Debug, Clone)]
pub struct RebuildGate {
    page: Option<PageId>,
    generation: u64,
    line_count: usize,
    reloading: bool,
    deferrals: u32,
    retry_delay: Duration,
}

impl RebuildGate {
    #[must_use]
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            page: None,
            generation: 0,
            line_count: 0,
            reloading: false,
            deferrals: 0,
            retry_delay,
        }
    }

    /// Switch to `page`. Returns the new generation.
    pub fn set_page(&mut self, page: PageId) -> u64 {
        self.page = Some(page);
        self.line_count = 0;
        self.deferrals = 0;
        self.bump()
    }

    /// Record a new divider-line set for the current page. Returns the new
    /// generation.
    pub fn set_lines(&mut self, line_count: usize) -> u64 {
        self.line_count = line_count;
        self.deferrals = 0;
        self.bump()
    }

    fn bump(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    #[must_use]
    pub fn page(&self) -> Option<PageId> {
        self.page
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `regions` were computed for the current page and generation.
    #[must_use]
    pub fn is_current(&self, regions: &RegionSet) -> bool {
        self.page == Some(regions.page_id) && regions.generation == self.generation
    }

    pub fn begin_reload(&mut self) {
        self.reloading = true;
    }

    pub fn finish_reload(&mut self) {
        self.reloading = false;
    }

    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// Decide whether to rebuild against `regions`.
    ///
    /// A page with no divider lines rebuilds against an empty region set.
    pub fn evaluate(&mut self, regions: Option<&RegionSet>) -> RebuildDecision {
        if self.reloading || self.page.is_none() {
            crate::debug!(reloading = self.reloading, "display map rebuild suppressed");
            return RebuildDecision::Suppressed;
        }
        if let Some(set) = regions.filter(|set| !self.is_current(set)) {
            crate::debug!(
                page = set.page_id.get(),
                generation = set.generation,
                current = self.generation,
                "ignoring stale regions"
            );
            return RebuildDecision::Stale;
        }
        let missing = regions.is_none_or(RegionSet::is_empty);
        if missing && self.line_count > 0 {
            self.deferrals = self.deferrals.saturating_add(1);
            crate::debug!(attempt = self.deferrals, "regions not computed yet, deferring");
            return RebuildDecision::Defer {
                retry_after: self.retry_delay,
                attempt: self.deferrals,
            };
        }
        self.deferrals = 0;
        RebuildDecision::Rebuild
    }
}

impl Default for RebuildGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

/// State of a keyed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTicket {
    /// No load was running; the caller must perform it.
    Start,
    /// A load for this key is already running.
    InFlight,
    /// The key has already been loaded.
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    InFlight,
    Loaded,
}

/// Idempotent initialization keyed by resource id.
///
/// Repeated initialization requests for the same key collapse into one
/// load. A failed load is forgotten so the next request retries it.
#[derive(Debug, Clone)]
pub struct LoadDeduplicator<K> {
    states: FxHashMap<K, LoadState>,
}

impl<K: Hash + Eq> LoadDeduplicator<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: FxHashMap::default(),
        }
    }

    /// Ask to load `key`.
    pub fn begin(&mut self, key: K) -> LoadTicket {
        match self.states.get(&key) {
            Some(LoadState::InFlight) => LoadTicket::InFlight,
            Some(LoadState::Loaded) => LoadTicket::Loaded,
            None => {
                self.states.insert(key, LoadState::InFlight);
                LoadTicket::Start
            }
        }
    }

    pub fn complete(&mut self, key: K) {
        self.states.insert(key, LoadState::Loaded);
    }

    pub fn fail(&mut self, key: &K) {
        self.states.remove(key);
    }

    /// Forget `key` so the next [`begin`](Self::begin) loads it again.
    pub fn invalidate(&mut self, key: &K) {
        self.states.remove(key);
    }

    #[must_use]
    pub fn is_loaded(&self, key: &K) -> bool {
        self.states.get(key) == Some(&LoadState::Loaded)
    }
}

impl<K: Hash + Eq> Default for LoadDeduplicator<K> {
    fn default() -> Self {
        Self::new()
    }
}
