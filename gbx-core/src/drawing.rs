//! Linear mapping between bases and pixels

use crate::error::ConfigurationError;
use crate::interval::{OpenInterval, PixelInterval};
use crate::navigation::NavigationContext;
use crate::region::DisplayedRegionModel;

/// Maps a span of linear bases onto `[0, width)` pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDrawingModel {
    span: OpenInterval,
    width: f64,
}

impl LinearDrawingModel {
    pub fn new(span: OpenInterval, width: f64) -> Result<Self, ConfigurationError> {
        if span.is_empty() {
            return Err(ConfigurationError::new(format!(
                "cannot draw empty span {}",
                span
            )));
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(ConfigurationError::new(format!(
                "drawing width must be positive and finite, got {}",
                width
            )));
        }
        Ok(Self { span, width })
    }

    /// Draw the whole navigation context
    pub fn for_context(context: &NavigationContext, width: f64) -> Result<Self, ConfigurationError> {
        Self::new(context.get_context_coordinates(), width)
    }

    /// Draw a displayed region
    pub fn for_region(region: &DisplayedRegionModel, width: f64) -> Result<Self, ConfigurationError> {
        Self::new(region.context_coordinates(), width)
    }

    pub fn span(&self) -> OpenInterval {
        self.span
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn pixels_per_base(&self) -> f64 {
        self.width / self.span.len() as f64
    }

    /// Pixel x of a base; bases outside the span map outside `[0, width)`
    pub fn base_to_x(&self, base: u64) -> f64 {
        (base as f64 - self.span.start as f64) * self.pixels_per_base()
    }

    pub fn bases_to_x_width(&self, bases: u64) -> f64 {
        bases as f64 * self.pixels_per_base()
    }

    pub fn base_span_to_x_span(&self, interval: &OpenInterval) -> PixelInterval {
        PixelInterval::new(self.base_to_x(interval.start), self.base_to_x(interval.end))
    }

    /// Base under pixel `x`, floored and clamped to the drawn span
    pub fn x_to_base(&self, x: f64) -> u64 {
        let base = self.span.start as f64 + x / self.pixels_per_base();
        base.floor().clamp(self.span.start as f64, self.span.end as f64) as u64
    }

    pub fn x_width_to_bases(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Segment;

    fn context() -> NavigationContext {
        NavigationContext::new(
            "mini",
            vec![Segment::chromosome("chr1", 1000), Segment::chromosome("chr2", 500)],
        )
        .unwrap()
    }

    #[test]
    fn test_one_pixel_per_base() {
        let model = LinearDrawingModel::for_context(&context(), 1500.0).unwrap();
        let x = model.base_span_to_x_span(&OpenInterval { start: 1100, end: 1200 });
        assert_eq!(x, PixelInterval::new(1100.0, 1200.0));
        assert_eq!(model.x_to_base(1100.5), 1100);
    }

    #[test]
    fn test_offset_span() {
        let model = LinearDrawingModel::new(OpenInterval { start: 900, end: 1200 }, 300.0).unwrap();
        assert_eq!(model.base_to_x(1000), 100.0);
        assert_eq!(model.bases_to_x_width(50), 50.0);
        assert_eq!(model.x_to_base(-20.0), 900);
        assert_eq!(model.x_to_base(1e9), 1200);
    }

    #[test]
    fn test_scaling() {
        let model = LinearDrawingModel::new(OpenInterval { start: 0, end: 1000 }, 250.0).unwrap();
        assert_eq!(model.base_to_x(400), 100.0);
        assert_eq!(model.x_width_to_bases(25.0), 100.0);
        assert_eq!(model.x_to_base(100.0), 400);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(LinearDrawingModel::new(OpenInterval { start: 5, end: 5 }, 100.0).is_err());
        assert!(LinearDrawingModel::new(OpenInterval { start: 0, end: 5 }, 0.0).is_err());
        assert!(LinearDrawingModel::new(OpenInterval { start: 0, end: 5 }, f64::INFINITY).is_err());
    }
}
