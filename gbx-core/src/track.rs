//! Track models and the controller that keeps one track's data current

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SourceError};
use crate::expander::{ExpansionCache, RegionExpander, ViewExpansion};
use crate::region::DisplayedRegionModel;
use crate::source::{DataSource, FetchOptions, SourceOptions, TrackRecord, TrackSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Ruler,
    #[serde(alias = "bigWig")]
    BigWig,
}

impl FromStr for TrackType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ruler" => Ok(TrackType::Ruler),
            "bigwig" => Ok(TrackType::BigWig),
            other => Err(ConfigurationError::new(format!("unknown track type '{}'", other))),
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackType::Ruler => write!(f, "ruler"),
            TrackType::BigWig => write!(f, "bigwig"),
        }
    }
}

/// Declarative description of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackModel {
    #[serde(rename = "type")]
    pub track_type: TrackType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Free-form display options, passed through untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl TrackModel {
    pub fn new<S: Into<String>>(track_type: TrackType, name: S) -> Self {
        Self {
            track_type,
            name: name.into(),
            url: None,
            options: BTreeMap::new(),
        }
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_option<K: Into<String>>(mut self, key: K, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// What happened to the result of one [`TrackController::fetch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result (data or error) became the track state
    Applied,
    /// A newer request was issued meanwhile; the result was dropped
    Stale,
    /// The controller was cleaned up; the result was dropped
    Disposed,
}

/// Snapshot of a track's displayable state
#[derive(Debug, Clone, Default)]
pub struct TrackState {
    pub data: Vec<TrackRecord>,
    pub is_loading: bool,
    pub error: Option<Arc<SourceError>>,
    /// View region the data was fetched for
    pub region: Option<DisplayedRegionModel>,
    pub expansion: Option<ViewExpansion>,
}

/// Drives one data source for one track.
///
/// Every fetch takes a sequence token. Only the result carrying the latest
/// token is applied, so a slow response for an old region can never
/// overwrite the data of a newer one.
pub struct TrackController<S: DataSource = TrackSource> {
    model: TrackModel,
    source: S,
    expansion: Mutex<ExpansionCache>,
    latest: AtomicU64,
    disposed: AtomicBool,
    state: Mutex<TrackState>,
}

impl TrackController<TrackSource> {
    pub fn from_model(
        model: TrackModel,
        options: &SourceOptions,
        expander: RegionExpander,
    ) -> Result<Self, ConfigurationError> {
        let source = TrackSource::from_model(&model, options)?;
        Ok(Self::new(model, source, expander))
    }
}

impl<S: DataSource> TrackController<S> {
    pub fn new(model: TrackModel, source: S, expander: RegionExpander) -> Self {
        Self {
            model,
            source,
            expansion: Mutex::new(ExpansionCache::new(expander)),
            latest: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
            state: Mutex::new(TrackState::default()),
        }
    }

    pub fn model(&self) -> &TrackModel {
        &self.model
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> TrackState {
        self.state.lock().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Expansion of `view_region` at `width`, memoised across calls
    pub fn expansion_for(&self, width: f64, view_region: &DisplayedRegionModel) -> ViewExpansion {
        self.expansion.lock().calculate_expansion(width, view_region)
    }

    /// Fetch data for `view_region` drawn at `width` pixels.
    ///
    /// The source is asked for the expanded region at the expanded width.
    pub async fn fetch(&self, width: f64, view_region: &DisplayedRegionModel) -> FetchOutcome {
        if self.is_disposed() {
            return FetchOutcome::Disposed;
        }

        let token = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let expansion = self.expansion_for(width, view_region);
        self.state.lock().is_loading = true;

        let options = FetchOptions::with_width(expansion.expanded_width);
        let result = self.source.get_data(&expansion.expanded_region, &options).await;

        if self.is_disposed() {
            log::debug!("Track '{}' cleaned up; dropping result for {}", self.model.name, view_region);
            return FetchOutcome::Disposed;
        }
        if self.latest.load(Ordering::Acquire) != token {
            log::debug!(
                "Track '{}' discarding stale result for {} (request {})",
                self.model.name,
                view_region,
                token
            );
            return FetchOutcome::Stale;
        }

        let mut state = self.state.lock();
        match result {
            Ok(data) => {
                log::debug!("Track '{}' loaded {} records for {}", self.model.name, data.len(), view_region);
                state.data = data;
                state.error = None;
            }
            Err(e) => {
                log::warn!("Track '{}' failed to load {}: {}", self.model.name, view_region, e);
                state.error = Some(Arc::new(e));
            }
        }
        state.is_loading = false;
        state.region = Some(view_region.clone());
        state.expansion = Some(expansion);
        FetchOutcome::Applied
    }

    /// Release the source; results still in flight will be dropped
    pub fn clean_up(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.source.clean_up();
        }
    }
}

impl<S: DataSource> fmt::Debug for TrackController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackController")
            .field("model", &self.model)
            .field("latest", &self.latest.load(Ordering::Relaxed))
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_type_parsing() {
        assert_eq!("bigWig".parse::<TrackType>().unwrap(), TrackType::BigWig);
        assert_eq!("ruler".parse::<TrackType>().unwrap(), TrackType::Ruler);
        assert!("bam".parse::<TrackType>().is_err());
    }

    #[test]
    fn test_track_model_from_json() {
        let model: TrackModel = serde_json::from_str(
            r#"{"type": "bigwig", "name": "signal", "url": "https://example.org/a.bw", "options": {"color": "blue"}}"#,
        )
        .unwrap();
        assert_eq!(model.track_type, TrackType::BigWig);
        assert_eq!(model.url.as_deref(), Some("https://example.org/a.bw"));
        assert_eq!(model.options["color"], "blue");
    }

    #[test]
    fn test_from_model_rejects_bigwig_without_url() {
        let model = TrackModel::new(TrackType::BigWig, "signal");
        let result = TrackController::from_model(model, &SourceOptions::default(), RegionExpander::default());
        assert!(result.is_err());
    }
}
