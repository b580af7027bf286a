//! The displayed region: a linear interval inside a navigation context.
//!
//! Region values are replaced, never mutated. Panning and zooming return a
//! new model clamped into the context.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::interval::{ChromosomeInterval, OpenInterval};
use crate::navigation::{FeatureSegment, NavigationContext};

#[derive(Debug, Clone)]
pub struct DisplayedRegionModel {
    context: Arc<NavigationContext>,
    interval: OpenInterval,
}

impl PartialEq for DisplayedRegionModel {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.context, &other.context) && self.interval == other.interval
    }
}

impl Eq for DisplayedRegionModel {}

impl DisplayedRegionModel {
    /// A region covering the whole context
    pub fn new(context: Arc<NavigationContext>) -> Self {
        let interval = context.get_context_coordinates();
        Self { context, interval }
    }

    /// A region over `interval`, which must lie inside the context
    pub fn with_interval(
        context: Arc<NavigationContext>,
        interval: OpenInterval,
    ) -> Result<Self, ConfigurationError> {
        if interval.start > interval.end {
            return Err(ConfigurationError::new(format!(
                "region start {} is greater than end {}",
                interval.start, interval.end
            )));
        }
        if interval.end > context.total_length() {
            return Err(ConfigurationError::new(format!(
                "region {} lies outside navigation context '{}' of {} bases",
                interval,
                context.name(),
                context.total_length()
            )));
        }
        Ok(Self { context, interval })
    }

    pub(crate) fn from_parts(context: Arc<NavigationContext>, interval: OpenInterval) -> Self {
        Self { context, interval }
    }

    /// Same context, different interval; the caller guarantees it fits
    pub(crate) fn with_coordinates(&self, interval: OpenInterval) -> Self {
        Self::from_parts(Arc::clone(&self.context), interval)
    }

    pub fn navigation_context(&self) -> &Arc<NavigationContext> {
        &self.context
    }

    /// Current interval in linear coordinates
    pub fn context_coordinates(&self) -> OpenInterval {
        self.interval
    }

    /// Width of the region in bases
    pub fn width(&self) -> u64 {
        self.interval.len()
    }

    /// Move the region to `[start, end)`, shifting it back inside the context
    /// when it overhangs either edge. A region wider than the context becomes
    /// the whole context. Reversed endpoints are swapped.
    pub fn set_region(&self, start: i64, end: i64) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let total = self.context.total_length() as i128;
        let width = (end as i128 - start as i128).min(total);

        let mut start = start as i128;
        if start < 0 {
            start = 0;
        }
        if start + width > total {
            start = total - width;
        }

        Self::from_parts(
            Arc::clone(&self.context),
            OpenInterval {
                start: start as u64,
                end: (start + width) as u64,
            },
        )
    }

    /// Shift the region by `delta` bases, keeping its width
    pub fn pan(&self, delta: i64) -> Self {
        let start = self.interval.start as i64;
        let end = self.interval.end as i64;
        self.set_region(start.saturating_add(delta), end.saturating_add(delta))
    }

    /// Scale the width by `factor` around the point at `focal_ratio` of the
    /// current width (0 = left edge, 0.5 = centre, 1 = right edge). Factors
    /// below 1 zoom in. The result is at least one base wide.
    pub fn zoom(&self, factor: f64, focal_ratio: f64) -> Result<Self, ConfigurationError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ConfigurationError::new(format!(
                "zoom factor must be positive and finite, got {}",
                factor
            )));
        }
        if !focal_ratio.is_finite() {
            return Err(ConfigurationError::new("zoom focal point must be finite"));
        }

        let width = self.width() as f64;
        let focal_base = self.interval.start as f64 + focal_ratio * width;
        let new_width = (width * factor).round().max(1.0);
        let new_start = (focal_base - focal_ratio * new_width).round();

        Ok(self.set_region(new_start as i64, (new_start + new_width) as i64))
    }

    /// Segment slices composing the region, gaps included
    pub fn feature_segments(&self) -> Vec<FeatureSegment> {
        self.context.feature_segments(&self.interval)
    }

    /// Genome intervals displayed by the region, in display order
    pub fn genome_intervals(&self) -> Vec<ChromosomeInterval> {
        self.feature_segments()
            .into_iter()
            .filter_map(|slice| slice.locus)
            .collect()
    }
}

impl fmt::Display for DisplayedRegionModel {
    /// Locator form: `chr1:101-200`, or `chr1:901-chr2:100` across segments
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loci = self.genome_intervals();
        match (loci.first(), loci.last()) {
            (Some(first), Some(last)) if first.chr == last.chr => {
                write!(f, "{}:{}-{}", first.chr, first.start + 1, last.end)
            }
            (Some(first), Some(last)) => write!(
                f,
                "{}:{}-{}:{}",
                first.chr,
                first.start + 1,
                last.chr,
                last.end
            ),
            _ => write!(f, "{}", self.interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Segment;

    fn context() -> Arc<NavigationContext> {
        Arc::new(
            NavigationContext::new(
                "hg-mini",
                vec![Segment::chromosome("chr1", 1000), Segment::chromosome("chr2", 500)],
            )
            .unwrap(),
        )
    }

    fn region(start: u64, end: u64) -> DisplayedRegionModel {
        DisplayedRegionModel::with_interval(context(), OpenInterval { start, end }).unwrap()
    }

    #[test]
    fn test_whole_context_by_default() {
        let r = DisplayedRegionModel::new(context());
        assert_eq!(r.context_coordinates(), OpenInterval { start: 0, end: 1500 });
        assert_eq!(r.width(), 1500);
    }

    #[test]
    fn test_with_interval_rejects_outside() {
        let result = DisplayedRegionModel::with_interval(context(), OpenInterval { start: 1400, end: 1600 });
        assert!(result.is_err());
    }

    #[test]
    fn test_equality_requires_same_context_instance() {
        let ctx = context();
        let a = DisplayedRegionModel::with_interval(Arc::clone(&ctx), OpenInterval { start: 0, end: 10 }).unwrap();
        let b = DisplayedRegionModel::with_interval(ctx, OpenInterval { start: 0, end: 10 }).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, region(0, 10));
    }

    #[test]
    fn test_pan_clamps_and_keeps_width() {
        let r = region(1000, 1100);
        assert_eq!(r.pan(-50).context_coordinates(), OpenInterval { start: 950, end: 1050 });
        assert_eq!(r.pan(1000).context_coordinates(), OpenInterval { start: 1400, end: 1500 });
        assert_eq!(r.pan(-5000).context_coordinates(), OpenInterval { start: 0, end: 100 });
    }

    #[test]
    fn test_set_region_wider_than_context() {
        let r = region(0, 10).set_region(-100, 3000);
        assert_eq!(r.context_coordinates(), OpenInterval { start: 0, end: 1500 });
    }

    #[test]
    fn test_zoom_around_centre() {
        let r = region(1000, 1100);
        let out = r.zoom(2.0, 0.5).unwrap();
        assert_eq!(out.context_coordinates(), OpenInterval { start: 950, end: 1150 });
        let inside = r.zoom(0.5, 0.5).unwrap();
        assert_eq!(inside.context_coordinates(), OpenInterval { start: 1025, end: 1075 });
        assert!(r.zoom(0.0, 0.5).is_err());
    }

    #[test]
    fn test_display_across_chromosomes() {
        assert_eq!(region(1100, 1200).to_string(), "chr2:101-200");
        assert_eq!(region(900, 1100).to_string(), "chr1:901-chr2:100");
    }

    #[test]
    fn test_genome_intervals() {
        let loci = region(900, 1100).genome_intervals();
        assert_eq!(
            loci,
            vec![
                ChromosomeInterval::new("chr1", 900, 1000),
                ChromosomeInterval::new("chr2", 0, 100),
            ]
        );
    }
}
