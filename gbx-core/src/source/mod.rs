//! Track data sources
//!
//! A data source turns a displayed region into drawable records. Every
//! source is asynchronous, may be asked for overlapping regions while earlier
//! requests are still in flight, and becomes inert once cleaned up.

mod bigwig;
mod ruler;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SourceResult};
use crate::interval::OpenInterval;
use crate::region::DisplayedRegionModel;
use crate::track::{TrackModel, TrackType};

pub use bigwig::{select_zoom_level, BigWigSource, SourceState};
pub use ruler::{nice_step, RulerSource};

pub const DEFAULT_FALLBACK_WIDTH: f64 = 1280.0;
pub const DEFAULT_MIN_TICK_SPACING: f64 = 80.0;

fn default_fallback_width() -> f64 {
    DEFAULT_FALLBACK_WIDTH
}

fn default_min_tick_spacing() -> f64 {
    DEFAULT_MIN_TICK_SPACING
}

/// Construction parameters shared by all sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Pixel width assumed when a request carries none
    #[serde(default = "default_fallback_width")]
    pub fallback_width: f64,
    /// Minimum distance between ruler ticks in pixels
    #[serde(default = "default_min_tick_spacing")]
    pub min_tick_spacing: f64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            fallback_width: DEFAULT_FALLBACK_WIDTH,
            min_tick_spacing: DEFAULT_MIN_TICK_SPACING,
        }
    }
}

impl SourceOptions {
    /// Width to draw at: the requested one if usable, else the fallback,
    /// else 1
    pub fn effective_width(&self, options: &FetchOptions) -> f64 {
        let usable = |w: f64| w.is_finite() && w > 0.0;
        match options.width {
            Some(w) if usable(w) => w,
            _ if usable(self.fallback_width) => self.fallback_width,
            _ => 1.0,
        }
    }
}

/// Per-request parameters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FetchOptions {
    /// Pixel width the region will be drawn at
    pub width: Option<f64>,
}

impl FetchOptions {
    pub fn with_width(width: f64) -> Self {
        Self { width: Some(width) }
    }
}

/// A value over a span of the navigation context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub interval: OpenInterval,
    pub value: f64,
}

/// A labelled ruler position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulerTick {
    /// Position in the navigation context
    pub base: u64,
    pub label: String,
    pub major: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackRecord {
    Signal(SignalRecord),
    Tick(RulerTick),
}

impl TrackRecord {
    pub fn as_signal(&self) -> Option<&SignalRecord> {
        match self {
            TrackRecord::Signal(record) => Some(record),
            TrackRecord::Tick(_) => None,
        }
    }

    pub fn as_tick(&self) -> Option<&RulerTick> {
        match self {
            TrackRecord::Tick(tick) => Some(tick),
            TrackRecord::Signal(_) => None,
        }
    }
}

/// Capability shared by all track data sources
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Records for `region`, in navigation-context coordinates
    async fn get_data(
        &self,
        region: &DisplayedRegionModel,
        options: &FetchOptions,
    ) -> SourceResult<Vec<TrackRecord>>;

    /// Release resources; idempotent, after which `get_data` returns nothing
    fn clean_up(&self);
}

/// The closed set of sources a track model can name
#[derive(Debug)]
pub enum TrackSource {
    Ruler(RulerSource),
    BigWig(BigWigSource),
}

impl TrackSource {
    pub fn from_model(model: &TrackModel, options: &SourceOptions) -> Result<Self, ConfigurationError> {
        match model.track_type {
            TrackType::Ruler => Ok(TrackSource::Ruler(RulerSource::new(options.clone()))),
            TrackType::BigWig => {
                let url = model
                    .url
                    .as_deref()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| {
                        ConfigurationError::new(format!("bigwig track '{}' has no url", model.name))
                    })?;
                Ok(TrackSource::BigWig(BigWigSource::new(url, options.clone())))
            }
        }
    }
}

#[async_trait]
impl DataSource for TrackSource {
    async fn get_data(
        &self,
        region: &DisplayedRegionModel,
        options: &FetchOptions,
    ) -> SourceResult<Vec<TrackRecord>> {
        match self {
            TrackSource::Ruler(source) => source.get_data(region, options).await,
            TrackSource::BigWig(source) => source.get_data(region, options).await,
        }
    }

    fn clean_up(&self) {
        match self {
            TrackSource::Ruler(source) => source.clean_up(),
            TrackSource::BigWig(source) => source.clean_up(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_width() {
        let options = SourceOptions::default();
        assert_eq!(options.effective_width(&FetchOptions::with_width(300.0)), 300.0);
        assert_eq!(options.effective_width(&FetchOptions::default()), DEFAULT_FALLBACK_WIDTH);
        assert_eq!(options.effective_width(&FetchOptions::with_width(-1.0)), DEFAULT_FALLBACK_WIDTH);

        let broken = SourceOptions { fallback_width: 0.0, ..SourceOptions::default() };
        assert_eq!(broken.effective_width(&FetchOptions::default()), 1.0);
    }

    #[test]
    fn test_from_model() {
        let ruler = TrackModel::new(TrackType::Ruler, "ruler");
        assert!(matches!(
            TrackSource::from_model(&ruler, &SourceOptions::default()),
            Ok(TrackSource::Ruler(_))
        ));

        let missing_url = TrackModel::new(TrackType::BigWig, "signal");
        assert!(TrackSource::from_model(&missing_url, &SourceOptions::default()).is_err());

        let bigwig = TrackModel::new(TrackType::BigWig, "signal").with_url("/data/signal.bw");
        assert!(matches!(
            TrackSource::from_model(&bigwig, &SourceOptions::default()),
            Ok(TrackSource::BigWig(_))
        ));
    }

    #[test]
    fn test_record_serializes_with_kind_tag() {
        let record = TrackRecord::Tick(RulerTick { base: 5, label: "5 bp".into(), major: true });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "tick");
        assert_eq!(json["label"], "5 bp");
    }
}
