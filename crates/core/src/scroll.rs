//! Maps the scroll position of a reference section to assembly progress.
//!
//! Progress starts once the section's top edge enters the bottom of the
//! viewport and reaches 1 after the page has scrolled a further 80% of the
//! viewport height. While the section is entirely outside the viewport the
//! last value is kept.

use serde::{Deserialize, Serialize};

/// Fraction of the viewport height over which the cloud assembles.
pub const ASSEMBLY_SPAN: f32 = 0.8;

/// Vertical extent of the reference section in viewport coordinates,
/// as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionBounds {
    pub top: f32,
    pub bottom: f32,
}

impl SectionBounds {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }

    /// True when any part of the section overlaps `[0, viewport_height]`.
    pub fn intersects_viewport(&self, viewport_height: f32) -> bool {
        self.top <= viewport_height && self.bottom >= 0.0
    }
}

/// Progress for a visible section: `clamp(max(0, vh - top) / (0.8 vh), 0, 1)`.
///
/// Returns `None` for a non-positive or non-finite viewport height.
pub fn scroll_progress(section_top: f32, viewport_height: f32) -> Option<f32> {
    if !viewport_height.is_finite() || viewport_height <= 0.0 || section_top.is_nan() {
        return None;
    }
    let scrolled = (viewport_height - section_top).max(0.0);
    Some((scrolled / (viewport_height * ASSEMBLY_SPAN)).clamp(0.0, 1.0))
}

/// Section top at which [`scroll_progress`] yields `progress`.
///
/// Inverse of the mapping for progress in [0, 1]; used by offline renderers
/// that replay a scroll position instead of receiving real events.
pub fn section_top_for(progress: f32, viewport_height: f32) -> f32 {
    viewport_height - progress.clamp(0.0, 1.0) * viewport_height * ASSEMBLY_SPAN
}

/// Holds the latest progress; written by the scroll handler, read per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollTracker {
    progress: f32,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Handles one scroll event.
    ///
    /// Returns the new progress, or `None` when the section is out of view
    /// (or the viewport is degenerate) and the stored value was kept.
    pub fn on_scroll(&mut self, section: SectionBounds, viewport_height: f32) -> Option<f32> {
        if !section.intersects_viewport(viewport_height) {
            return None;
        }
        let p = scroll_progress(section.top, viewport_height)?;
        self.progress = p;
        Some(p)
    }
}
