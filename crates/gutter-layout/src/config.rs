//! Engine configuration.
//!
//! Every tunable lives in [`EngineConfig`]. The IoU thresholds in particular
//! are empirical: the reuse threshold is strict because it decides whether to
//! mutate an existing panel, the display threshold is loose because it only
//! decides whether artwork is shown. They are kept as two separate fields.
//!
//! ```
//! use gutter_layout::config::EngineConfig;
//!
//! let config = EngineConfig::from_env_with(|key| match key {
//!     "GUTTER_REUSE_IOU" => Some("0.45".to_string()),
//!     _ => None,
//! });
//! assert_eq!(config.reuse_iou_threshold, 0.45);
//! assert_eq!(config.display_iou_threshold, 0.05);
//! ```

use std::fmt;
use std::time::Duration;

use gutter_core::PercentRect;
use serde::{Deserialize, Serialize};

use crate::gaps::GapConfig;

/// Strict IoU bar for reusing an existing panel instead of creating one.
pub const REUSE_IOU_THRESHOLD: f64 = 0.30;

/// Loose IoU bar for showing a panel's artwork on a computed region.
pub const DISPLAY_IOU_THRESHOLD: f64 = 0.05;

/// Rotation/skew (degrees) above which gap filling asks for confirmation.
pub const SKEW_WARNING_DEGREES: f64 = 5.0;

/// Tunables for the panel geometry engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Best-match IoU must exceed this to reuse a panel for a region.
    pub reuse_iou_threshold: f64,
    /// Best-match IoU must exceed this to display artwork on a region.
    pub display_iou_threshold: f64,
    /// Gap filling warns when any panel's rotation or skew exceeds this.
    pub skew_warning_degrees: f64,
    /// Snap interval for drag/resize results; `0` disables snapping.
    pub snap_grid: f64,
    /// Fraction of the top gap used by "add panel".
    pub add_panel_scale: f64,
    /// Minimum width/height of an "add panel" rectangle.
    pub add_panel_min_extent: f64,
    /// Rectangle used by "add panel" when no gap is available.
    pub fallback_panel: PercentRect,
    /// Retry delay when regions have not been computed yet.
    pub region_retry_delay_ms: u64,
    /// Canvas measurements within this many pixels are treated as unchanged.
    pub canvas_jitter_px: f64,
    /// Gap detector grid parameters.
    pub gap: GapConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reuse_iou_threshold: REUSE_IOU_THRESHOLD,
            display_iou_threshold: DISPLAY_IOU_THRESHOLD,
            skew_warning_degrees: SKEW_WARNING_DEGREES,
            snap_grid: gutter_core::normalize::DEFAULT_SNAP_GRID,
            add_panel_scale: 0.8,
            add_panel_min_extent: 20.0,
            fallback_panel: PercentRect::new(10.0, 10.0, 40.0, 40.0),
            region_retry_delay_ms: 100,
            canvas_jitter_px: 1.0,
            gap: GapConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load config from environment variables.
    ///
    /// Reads:
    /// - `GUTTER_REUSE_IOU`: reuse-vs-create IoU threshold
    /// - `GUTTER_DISPLAY_IOU`: artwork display IoU threshold
    /// - `GUTTER_SKEW_WARNING_DEG`: gap-fill skew warning in degrees
    /// - `GUTTER_SNAP_GRID`: snap interval in percent
    /// - `GUTTER_GAP_GRID_CELLS`: gap detector grid resolution
    /// - `GUTTER_GAP_MAX`: maximum number of gaps returned
    /// - `GUTTER_REGION_RETRY_MS`: deferral delay for region rebuilds
    ///
    /// Unparsable values are ignored; the result is [`validated`](Self::validated).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load config using a custom environment lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let float = |key: &str| get_env(key).and_then(|v| v.trim().parse::<f64>().ok());
        let int = |key: &str| get_env(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(v) = float("GUTTER_REUSE_IOU") {
            config.reuse_iou_threshold = v;
        }
        if let Some(v) = float("GUTTER_DISPLAY_IOU") {
            config.display_iou_threshold = v;
        }
        if let Some(v) = float("GUTTER_SKEW_WARNING_DEG") {
            config.skew_warning_degrees = v;
        }
        if let Some(v) = float("GUTTER_SNAP_GRID") {
            config.snap_grid = v;
        }
        if let Some(v) = int("GUTTER_GAP_GRID_CELLS") {
            config.gap.grid_cells = usize::try_from(v).unwrap_or(usize::MAX);
        }
        if let Some(v) = int("GUTTER_GAP_MAX") {
            config.gap.max_gaps = usize::try_from(v).unwrap_or(usize::MAX);
        }
        if let Some(v) = int("GUTTER_REGION_RETRY_MS") {
            config.region_retry_delay_ms = v;
        }

        config.validated()
    }

    /// Return a copy with every value clamped into its safe range.
    ///
    /// Non-finite floats fall back to the default for that field.
    #[must_use]
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        let fix = |value: f64, default: f64, min: f64, max: f64| {
            if value.is_finite() {
                value.clamp(min, max)
            } else {
                default
            }
        };

        self.reuse_iou_threshold = fix(self.reuse_iou_threshold, defaults.reuse_iou_threshold, 0.0, 1.0);
        self.display_iou_threshold =
            fix(self.display_iou_threshold, defaults.display_iou_threshold, 0.0, 1.0);
        self.skew_warning_degrees =
            fix(self.skew_warning_degrees, defaults.skew_warning_degrees, 0.0, 90.0);
        self.snap_grid = fix(self.snap_grid, defaults.snap_grid, 0.0, 50.0);
        self.add_panel_scale = fix(self.add_panel_scale, defaults.add_panel_scale, 0.1, 1.0);
        self.add_panel_min_extent =
            fix(self.add_panel_min_extent, defaults.add_panel_min_extent, 10.0, 100.0);
        if !self.fallback_panel.is_finite() {
            self.fallback_panel = defaults.fallback_panel;
        }
        self.fallback_panel = self.fallback_panel.clamp_panel();
        self.region_retry_delay_ms = self.region_retry_delay_ms.clamp(1, 5_000);
        self.canvas_jitter_px = fix(self.canvas_jitter_px, defaults.canvas_jitter_px, 0.0, 50.0);
        self.gap = self.gap.validated();
        self
    }

    /// Check every value without modifying it.
    pub fn try_validate(&self) -> Result<(), ConfigError> {
        check("reuse_iou_threshold", self.reuse_iou_threshold, 0.0, 1.0)?;
        check("display_iou_threshold", self.display_iou_threshold, 0.0, 1.0)?;
        check("skew_warning_degrees", self.skew_warning_degrees, 0.0, 90.0)?;
        check("snap_grid", self.snap_grid, 0.0, 50.0)?;
        check("add_panel_scale", self.add_panel_scale, 0.1, 1.0)?;
        check("add_panel_min_extent", self.add_panel_min_extent, 10.0, 100.0)?;
        check("canvas_jitter_px", self.canvas_jitter_px, 0.0, 50.0)?;
        check(
            "gap.grid_cells",
            self.gap.grid_cells as f64,
            GapConfig::MIN_GRID_CELLS as f64,
            GapConfig::MAX_GRID_CELLS as f64,
        )?;
        check("gap.max_gaps", self.gap.max_gaps as f64, 1.0, 64.0)?;
        Ok(())
    }

    /// Deferral delay for region rebuilds.
    #[must_use]
    pub fn region_retry_delay(&self) -> Duration {
        Duration::from_millis(self.region_retry_delay_ms)
    }
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "config field {field}={value} outside [{min}, {max}]"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.try_validate(), Ok(()));
        assert_eq!(config.clone().validated(), config);
    }

    #[test]
    fn thresholds_stay_distinct() {
        let config = EngineConfig::default();
        assert_eq!(config.reuse_iou_threshold, 0.30);
        assert_eq!(config.display_iou_threshold, 0.05);
    }

    #[test]
    fn env_overrides_and_ignores_garbage() {
        let config = EngineConfig::from_env_with(|key| match key {
            "GUTTER_DISPLAY_IOU" => Some("0.1".into()),
            "GUTTER_SNAP_GRID" => Some("ten".into()),
            "GUTTER_GAP_MAX" => Some("3".into()),
            "GUTTER_REGION_RETRY_MS" => Some("250".into()),
            _ => None,
        });
        assert_eq!(config.display_iou_threshold, 0.1);
        assert_eq!(config.snap_grid, 5.0);
        assert_eq!(config.gap.max_gaps, 3);
        assert_eq!(config.region_retry_delay(), Duration::from_millis(250));
    }

    #[test]
    fn validated_clamps_out_of_range() {
        let config = EngineConfig {
            reuse_iou_threshold: 3.0,
            display_iou_threshold: f64::NAN,
            region_retry_delay_ms: 0,
            ..EngineConfig::default()
        }
        .validated();
        assert_eq!(config.reuse_iou_threshold, 1.0);
        assert_eq!(config.display_iou_threshold, DISPLAY_IOU_THRESHOLD);
        assert_eq!(config.region_retry_delay_ms, 1);
    }

    #[test]
    fn try_validate_reports_field() {
        let config = EngineConfig {
            skew_warning_degrees: -1.0,
            ..EngineConfig::default()
        };
        let err = config.try_validate().unwrap_err();
        assert!(err.to_string().contains("skew_warning_degrees"));
    }

    #[test]
    fn deserializes_partial_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"reuse_iou_threshold":0.5,"gap":{"max_gaps":2}}"#)
                .expect("partial config parses");
        assert_eq!(config.reuse_iou_threshold, 0.5);
        assert_eq!(config.gap.max_gaps, 2);
        assert_eq!(config.gap.grid_cells, 20);
    }
}
