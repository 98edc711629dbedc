#![forbid(unsafe_code)]

//! Core: percent-space geometry, coordinate normalization, and logging.
//!
//! # Role in Gutter
//! `gutter-core` is the leaf of the panel geometry engine. Every other
//! component speaks the page-relative percent space defined here: a fixed
//! `[0, 100] × [0, 100]` logical canvas that is independent of how large the
//! page happens to be rendered.
//!
//! # Primary responsibilities
//! - **Geometry**: [`PercentRect`](geometry::PercentRect) and friends, with
//!   intersection and IoU on unrotated bounding boxes.
//! - **Normalization**: pixel ↔ percent conversion with 2-decimal precision,
//!   snapping, and the panel/bubble clamp policies.
//! - **Lenient parsing**: persisted bounds may arrive as decimal strings.
//! - **Logging**: `tracing` macros behind the `tracing` feature, no-ops
//!   otherwise.

pub mod geometry;
pub mod lenient;
pub mod logging;
pub mod normalize;

pub use geometry::{PercentPoint, PercentRect, PixelPoint, PixelRect, PixelSize};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
