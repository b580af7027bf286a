//! Region expansion
//!
//! Tracks fetch and draw a region wider than what is visible so that small
//! pans reveal already-rendered content. The expander widens the view region
//! by a multiple of its own width on each side and reports where the visible
//! window sits inside the expanded drawing.

use serde::{Deserialize, Serialize};

use crate::interval::{OpenInterval, PixelInterval};
use crate::region::DisplayedRegionModel;

pub const DEFAULT_EXPANSION_FACTOR: f64 = 1.0;

/// Result of expanding a view region
#[derive(Debug, Clone, PartialEq)]
pub struct ViewExpansion {
    /// Region to fetch and draw
    pub expanded_region: DisplayedRegionModel,
    /// Pixel width of the expanded drawing
    pub expanded_width: f64,
    /// Where the visible region sits, in `[0, expanded_width)`
    pub view_window: PixelInterval,
    /// The region that was expanded
    pub view_region: DisplayedRegionModel,
}

impl ViewExpansion {
    /// The view window as fractions of the expanded width
    pub fn view_window_fraction(&self) -> PixelInterval {
        if self.expanded_width <= 0.0 {
            return PixelInterval::new(0.0, 0.0);
        }
        PixelInterval::new(
            self.view_window.start / self.expanded_width,
            self.view_window.end / self.expanded_width,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionExpander {
    /// Bases added on each side, as a multiple of the view width
    pub multiple_on_each_side: f64,
}

impl Default for RegionExpander {
    fn default() -> Self {
        Self::new(DEFAULT_EXPANSION_FACTOR)
    }
}

impl RegionExpander {
    /// Negative or non-finite factors behave as 0
    pub fn new(multiple_on_each_side: f64) -> Self {
        let multiple_on_each_side = if multiple_on_each_side.is_finite() {
            multiple_on_each_side.max(0.0)
        } else {
            0.0
        };
        Self { multiple_on_each_side }
    }

    /// Expand `view_region` drawn at `pixel_width` pixels.
    ///
    /// Clamping at the context edges is asymmetric: bases that cannot be
    /// added on one side are simply dropped, so the visible window is never
    /// shifted to compensate.
    pub fn calculate_expansion(&self, pixel_width: f64, view_region: &DisplayedRegionModel) -> ViewExpansion {
        let visible = view_region.context_coordinates();

        if visible.is_empty() || !pixel_width.is_finite() || pixel_width <= 0.0 {
            let expanded_width = if pixel_width.is_finite() { pixel_width.max(0.0) } else { 0.0 };
            return ViewExpansion {
                expanded_region: view_region.clone(),
                expanded_width,
                view_window: PixelInterval::new(0.0, 0.0),
                view_region: view_region.clone(),
            };
        }

        let view_bases = visible.len();
        let total = view_region.navigation_context().total_length();
        let bases_each_side = (self.multiple_on_each_side * view_bases as f64).round() as u64;

        let expanded = OpenInterval {
            start: visible.start.saturating_sub(bases_each_side),
            end: visible.end.saturating_add(bases_each_side).min(total),
        };

        let pixels_per_base = pixel_width / view_bases as f64;
        let left_bases = visible.start - expanded.start;
        let window_start = left_bases as f64 * pixels_per_base;

        ViewExpansion {
            expanded_region: view_region.with_coordinates(expanded),
            expanded_width: expanded.len() as f64 * pixels_per_base,
            view_window: PixelInterval::new(window_start, window_start + pixel_width),
            view_region: view_region.clone(),
        }
    }
}

/// Single-entry memo for [`RegionExpander::calculate_expansion`].
///
/// Owned by whoever repeatedly expands (a track controller); a call with
/// different inputs replaces the cached entry.
#[derive(Debug, Clone, Default)]
pub struct ExpansionCache {
    expander: RegionExpander,
    entry: Option<(u64, DisplayedRegionModel, ViewExpansion)>,
}

impl ExpansionCache {
    pub fn new(expander: RegionExpander) -> Self {
        Self { expander, entry: None }
    }

    pub fn expander(&self) -> &RegionExpander {
        &self.expander
    }

    pub fn calculate_expansion(&mut self, pixel_width: f64, view_region: &DisplayedRegionModel) -> ViewExpansion {
        let key = pixel_width.to_bits();
        if let Some((cached_width, cached_region, expansion)) = &self.entry {
            if *cached_width == key && cached_region == view_region {
                return expansion.clone();
            }
        }

        let expansion = self.expander.calculate_expansion(pixel_width, view_region);
        self.entry = Some((key, view_region.clone(), expansion.clone()));
        expansion
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
