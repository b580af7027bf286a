use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{DataSource, FetchOptions, RulerTick, SourceOptions, TrackRecord};
use crate::error::SourceResult;
use crate::region::DisplayedRegionModel;

/// Smallest `{1, 2, 5} x 10^n` that is at least `min_step`
pub fn nice_step(min_step: f64) -> u64 {
    if !min_step.is_finite() || min_step <= 1.0 {
        return 1;
    }
    let mut magnitude: u64 = 1;
    loop {
        for factor in [1u64, 2, 5] {
            let step = factor.saturating_mul(magnitude);
            if step as f64 >= min_step {
                return step;
            }
        }
        magnitude = match magnitude.checked_mul(10) {
            Some(m) => m,
            None => return u64::MAX,
        };
    }
}

fn format_position(position: u64, step: u64) -> String {
    if step >= 1_000_000 {
        format!("{} Mb", position / 1_000_000)
    } else if step >= 1_000 {
        format!("{} kb", position / 1_000)
    } else {
        format!("{} bp", position)
    }
}

/// Genome coordinate ruler; computes ticks without any I/O
#[derive(Debug, Default)]
pub struct RulerSource {
    options: SourceOptions,
    disposed: AtomicBool,
}

impl RulerSource {
    pub fn new(options: SourceOptions) -> Self {
        Self {
            options,
            disposed: AtomicBool::new(false),
        }
    }

    /// Ticks for `region` drawn at `width` pixels
    pub fn ticks(&self, region: &DisplayedRegionModel, width: f64) -> Vec<RulerTick> {
        if region.width() == 0 || !width.is_finite() || width <= 0.0 {
            return Vec::new();
        }
        let bases_per_pixel = region.width() as f64 / width;
        let step = nice_step(bases_per_pixel * self.options.min_tick_spacing);
        let major_step = step.saturating_mul(10);

        let mut ticks = Vec::new();
        for slice in region.feature_segments() {
            let Some(locus) = slice.locus else {
                continue;
            };
            let mut position = locus.start.div_ceil(step).saturating_mul(step);
            while position < locus.end {
                ticks.push(RulerTick {
                    base: slice.bases.start + (position - locus.start),
                    label: format_position(position, step),
                    major: position % major_step == 0,
                });
                position = match position.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
        ticks
    }
}

#[async_trait]
impl DataSource for RulerSource {
    async fn get_data(
        &self,
        region: &DisplayedRegionModel,
        options: &FetchOptions,
    ) -> SourceResult<Vec<TrackRecord>> {
        if self.disposed.load(Ordering::Acquire) {
            return Ok(Vec::new());
        }
        let width = self.options.effective_width(options);
        Ok(self
            .ticks(region, width)
            .into_iter()
            .map(TrackRecord::Tick)
            .collect())
    }

    fn clean_up(&self) {
        self.disposed.store(true, Ordering::Release);
    }
}
