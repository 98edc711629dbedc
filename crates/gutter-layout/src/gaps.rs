//! Gap detection: the largest unoccupied rectangles on a page.
//!
//! # Algorithm
//!
//! 1. Discretize the page into a `grid_cells × grid_cells` occupancy grid
//!    (20 × 20 by default, so each cell is 5% × 5%).
//! 2. Mark every cell whose index range overlaps a panel's bounding box.
//! 3. Walk rows top to bottom, keeping a per-column histogram of consecutive
//!    free cells ending at the current row.
//! 4. For each row run largest-rectangle-in-histogram with a monotonic stack,
//!    emitting every popped rectangle of at least `min_area_cells` cells.
//! 5. Sort candidates by area, descending (stable, so emission order breaks
//!    ties).
//! 6. Greedily keep candidates that do not overlap any kept one, up to
//!    `max_gaps`.
//!
//! Step 4 emits many overlapping candidates across rows; step 6 is what makes
//! the result a set of disjoint suggestions.
//!
//! Rotation and skew are ignored: occupancy always uses the unrotated box.
//!
//! # Example
//!
//! ```
//! use gutter_core::PercentRect;
//! use gutter_layout::gaps::GapDetector;
//!
//! let gaps = GapDetector::default().detect([PercentRect::new(2.0, 2.0, 47.0, 47.0)]);
//! assert_eq!(gaps[0].rect, PercentRect::new(50.0, 0.0, 50.0, 100.0));
//! ```

use gutter_core::PercentRect;
use serde::{Deserialize, Serialize};

/// Gap detector grid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Cells per axis.
    pub grid_cells: usize,
    /// Smallest reported gap, in cells.
    pub min_area_cells: usize,
    /// Maximum number of gaps returned.
    pub max_gaps: usize,
}

impl GapConfig {
    pub const MIN_GRID_CELLS: usize = 1;
    pub const MAX_GRID_CELLS: usize = 200;

    /// Clamp every field into a usable range.
    #[must_use]
    pub fn validated(self) -> Self {
        let grid_cells = self.grid_cells.clamp(Self::MIN_GRID_CELLS, Self::MAX_GRID_CELLS);
        Self {
            grid_cells,
            min_area_cells: self.min_area_cells.clamp(1, grid_cells * grid_cells),
            max_gaps: self.max_gaps.clamp(1, 64),
        }
    }

    /// Cell edge length in percent.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        100.0 / self.grid_cells as f64
    }
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            grid_cells: 20,
            min_area_cells: 4,
            max_gaps: 5,
        }
    }
}

/// An unoccupied rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub rect: PercentRect,
    /// Area in percent².
    pub area: f64,
}

/// Boolean occupancy grid over the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    cells: usize,
    occupied: Vec<bool>,
}

impl OccupancyGrid {
    /// Create an empty `cells × cells` grid.
    #[must_use]
    pub fn new(cells: usize) -> Self {
        Self {
            cells,
            occupied: vec![false; cells * cells],
        }
    }

    /// Cells per axis.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Mark every cell overlapped by `rect`. Off-page parts are ignored;
    /// non-finite rectangles mark nothing.
    pub fn mark(&mut self, rect: &PercentRect) {
        if !rect.is_finite() {
            return;
        }
        let cell = 100.0 / self.cells as f64;
        let (start_x, end_x) = self.span(rect.x, rect.right(), cell);
        let (start_y, end_y) = self.span(rect.y, rect.bottom(), cell);
        for row in start_y..end_y {
            for col in start_x..end_x {
                self.occupied[row * self.cells + col] = true;
            }
        }
    }

    fn span(&self, start: f64, end: f64, cell: f64) -> (usize, usize) {
        let limit = self.cells as i64;
        let first = ((start.max(0.0) / cell).floor() as i64).clamp(0, limit);
        let last = ((end.min(100.0) / cell).ceil() as i64).clamp(0, limit);
        (first as usize, last.max(first) as usize)
    }

    /// Whether the cell at (`col`, `row`) is occupied.
    #[must_use]
    pub fn is_occupied(&self, col: usize, row: usize) -> bool {
        self.occupied[row * self.cells + col]
    }

    /// Number of free cells.
    #[must_use]
    pub fn free_cells(&self) -> usize {
        self.occupied.iter().filter(|&&taken| !taken).count()
    }
}

/// Finds the largest empty rectangles on a page.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapDetector {
    config: GapConfig,
}

impl GapDetector {
    #[must_use]
    pub fn new(config: GapConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    #[must_use]
    pub fn config(&self) -> GapConfig {
        self.config
    }

    /// Up to `max_gaps` disjoint gaps, largest first.
    ///
    /// An empty result means the page has no gap worth suggesting. That is a
    /// valid answer, not an error.
    #[must_use]
    pub fn detect<I>(&self, occupied: I) -> Vec<Gap>
    where
        I: IntoIterator<Item = PercentRect>,
    {
        let candidates = self.candidates(occupied);
        let candidate_count = candidates.len();

        let mut kept: Vec<Gap> = Vec::with_capacity(self.config.max_gaps);
        for candidate in candidates {
            if kept.len() >= self.config.max_gaps {
                break;
            }
            if kept.iter().all(|gap| !gap.rect.overlaps(&candidate.rect)) {
                kept.push(candidate);
            }
        }

        crate::debug!(
            candidates = candidate_count,
            gaps = kept.len(),
            "gap detection finished"
        );
        kept
    }

    /// Every histogram candidate, sorted by area descending, before the
    /// non-overlap filter.
    #[must_use]
    pub fn candidates<I>(&self, occupied: I) -> Vec<Gap>
    where
        I: IntoIterator<Item = PercentRect>,
    {
        let mut grid = OccupancyGrid::new(self.config.grid_cells);
        for rect in occupied {
            grid.mark(&rect);
        }
        let mut candidates = self.scan(&grid);
        candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
        candidates
    }

    fn scan(&self, grid: &OccupancyGrid) -> Vec<Gap> {
        let cells = grid.cells();
        let cell = self.config.cell_size();
        let mut heights = vec![0usize; cells];
        let mut stack: Vec<usize> = Vec::with_capacity(cells + 1);
        let mut out = Vec::new();

        for row in 0..cells {
            for (col, height) in heights.iter_mut().enumerate() {
                *height = if grid.is_occupied(col, row) { 0 } else { *height + 1 };
            }

            stack.clear();
            // One extra column of height 0 flushes the stack at the row end.
            for col in 0..=cells {
                let current = if col < cells { heights[col] } else { 0 };
                while let Some(&top) = stack.last() {
                    if current >= heights[top] {
                        break;
                    }
                    stack.pop();
                    let height = heights[top];
                    let left = stack.last().map_or(0, |&l| l + 1);
                    let width = col - left;
                    if height * width >= self.config.min_area_cells {
                        let rect = PercentRect::new(
                            left as f64 * cell,
                            (row + 1 - height) as f64 * cell,
                            width as f64 * cell,
                            height as f64 * cell,
                        );
                        out.push(Gap {
                            rect,
                            area: rect.area(),
                        });
                    }
                }
                stack.push(col);
            }
        }
        out
    }
}

/// [`GapDetector::detect`] with the default 20 × 20 grid.
#[must_use]
pub fn find_gaps(occupied: &[PercentRect]) -> Vec<Gap> {
    GapDetector::default().detect(occupied.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_is_one_gap() {
        let gaps = find_gaps(&[]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].rect, PercentRect::PAGE);
        assert_eq!(gaps[0].area, 10_000.0);
    }

    #[test]
    fn full_page_has_no_gaps() {
        assert!(find_gaps(&[PercentRect::PAGE]).is_empty());
    }

    #[test]
    fn tiled_page_has_no_gaps() {
        let tiles = [
            PercentRect::new(0.0, 0.0, 50.0, 50.0),
            PercentRect::new(50.0, 0.0, 50.0, 50.0),
            PercentRect::new(0.0, 50.0, 50.0, 50.0),
            PercentRect::new(50.0, 50.0, 50.0, 50.0),
        ];
        assert!(find_gaps(&tiles).is_empty());
    }

    #[test]
    fn top_left_quadrant_leaves_right_half() {
        let detector = GapDetector::default();
        let occupied = [PercentRect::new(2.0, 2.0, 47.0, 47.0)];
        let gaps = detector.detect(occupied);
        assert_eq!(gaps[0].rect, PercentRect::new(50.0, 0.0, 50.0, 100.0));

        let candidates = detector.candidates(occupied);
        assert!(candidates.iter().all(|c| c.area <= gaps[0].area));
    }

    #[test]
    fn marking_rounds_outwards_to_cells() {
        let mut grid = OccupancyGrid::new(20);
        grid.mark(&PercentRect::new(2.0, 2.0, 47.0, 47.0));
        assert!(grid.is_occupied(0, 0));
        assert!(grid.is_occupied(9, 9));
        assert!(!grid.is_occupied(10, 0));
        assert!(!grid.is_occupied(0, 10));
        assert_eq!(grid.free_cells(), 400 - 100);
    }

    #[test]
    fn off_page_panels_only_mark_visible_cells() {
        let mut grid = OccupancyGrid::new(20);
        grid.mark(&PercentRect::new(-40.0, -40.0, 50.0, 50.0));
        assert!(grid.is_occupied(1, 1));
        assert!(!grid.is_occupied(2, 2));

        let mut grid = OccupancyGrid::new(20);
        grid.mark(&PercentRect::new(120.0, 10.0, 20.0, 20.0));
        grid.mark(&PercentRect::new(f64::NAN, 10.0, 20.0, 20.0));
        assert_eq!(grid.free_cells(), 400);
    }

    #[test]
    fn tiny_slivers_are_not_gaps() {
        // Leaves a 5% wide column: 1 × 20 cells, still ≥ 4 cells.
        let gaps = find_gaps(&[PercentRect::new(0.0, 0.0, 95.0, 100.0)]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].rect, PercentRect::new(95.0, 0.0, 5.0, 100.0));

        // Leaves a single 5% × 15% pocket: 3 cells, below the minimum.
        let gaps = find_gaps(&[
            PercentRect::new(0.0, 0.0, 95.0, 100.0),
            PercentRect::new(95.0, 15.0, 5.0, 85.0),
        ]);
        assert!(gaps.is_empty());
    }

    #[test]
    fn gaps_never_overlap_and_are_sorted() {
        let gaps = find_gaps(&[
            PercentRect::new(30.0, 30.0, 20.0, 20.0),
            PercentRect::new(70.0, 5.0, 10.0, 60.0),
        ]);
        assert!(!gaps.is_empty());
        assert!(gaps.len() <= 5);
        for (i, a) in gaps.iter().enumerate() {
            for b in &gaps[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{a:?} overlaps {b:?}");
                assert!(a.area >= b.area);
            }
        }
    }

    #[test]
    fn config_is_validated() {
        let detector = GapDetector::new(GapConfig {
            grid_cells: 0,
            min_area_cells: 0,
            max_gaps: 0,
        });
        assert_eq!(detector.config().grid_cells, 1);
        assert_eq!(detector.config().max_gaps, 1);
        assert_eq!(find_gaps(&[]).len(), 1);
    }
}
