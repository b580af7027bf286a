use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use super::{DataSource, FetchOptions, SignalRecord, SourceOptions, TrackRecord};
use crate::bbi::{open_location, BigWigFile, RangeReader, ZoomHeader};
use crate::error::{OpenError, SourceError, SourceResult};
use crate::interval::ChromosomeInterval;
use crate::navigation::NavigationContext;
use crate::region::DisplayedRegionModel;

/// Lifecycle of the file behind a [`BigWigSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Connecting,
    Ready,
    Failed(OpenError),
}

/// Index of the coarsest zoom level whose reduction is strictly below
/// `bases_per_pixel`; `None` means base-pair resolution.
pub fn select_zoom_level(levels: &[ZoomHeader], bases_per_pixel: f64) -> Option<usize> {
    levels
        .iter()
        .enumerate()
        .filter(|(_, zoom)| (zoom.reduction_level as f64) < bases_per_pixel)
        .max_by_key(|(_, zoom)| zoom.reduction_level)
        .map(|(index, _)| index)
}

/// Signal track backed by a bigWig file.
///
/// The file is opened once, on first use. Concurrent callers share that
/// open, and a failed open is remembered and reported to every caller.
#[derive(Debug)]
pub struct BigWigSource {
    location: String,
    options: SourceOptions,
    reader: Mutex<Option<Box<dyn RangeReader>>>,
    file: OnceCell<Result<Arc<BigWigFile>, OpenError>>,
    disposed: AtomicBool,
}

impl BigWigSource {
    /// Source for a path or URL, opened lazily
    pub fn new<L: Into<String>>(location: L, options: SourceOptions) -> Self {
        Self {
            location: location.into(),
            options,
            reader: Mutex::new(None),
            file: OnceCell::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Source over an already constructed transport
    pub fn with_reader(reader: Box<dyn RangeReader>, options: SourceOptions) -> Self {
        let source = Self::new(reader.location().to_string(), options);
        *source.reader.lock() = Some(reader);
        source
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn state(&self) -> SourceState {
        match self.file.get() {
            None => SourceState::Connecting,
            Some(Ok(_)) => SourceState::Ready,
            Some(Err(e)) => SourceState::Failed(e.clone()),
        }
    }

    /// Open the file, or wait for the open already in flight
    pub async fn connect(&self) -> Result<Arc<BigWigFile>, OpenError> {
        self.file
            .get_or_init(|| async {
                let result = self.open_file().await;
                match &result {
                    Ok(file) => log::info!(
                        "Connected to {} ({} zoom levels)",
                        self.location,
                        file.zoom_levels().len()
                    ),
                    Err(e) => log::warn!("{}", e),
                }
                result
            })
            .await
            .clone()
    }

    async fn open_file(&self) -> Result<Arc<BigWigFile>, OpenError> {
        let preset = self.reader.lock().take();
        let reader = match preset {
            Some(reader) => reader,
            None => open_location(&self.location).await?,
        };
        BigWigFile::open(reader)
            .await
            .map(Arc::new)
            .map_err(|e| e.into_open_error(&self.location))
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// Decode one locus segment and map its records into the context
async fn read_segment(
    file: &BigWigFile,
    zoom: Option<usize>,
    context: &NavigationContext,
    segment_index: usize,
    locus: &ChromosomeInterval,
) -> SourceResult<Vec<TrackRecord>> {
    let lift = |e: crate::bbi::BbiError| e.into_fetch_error(&locus.chr, locus.start, locus.end);

    let values: Vec<(u32, u32, f64)> = match zoom {
        Some(level) => file
            .read_zoom(level, &locus.chr, locus.start, locus.end)
            .await
            .map_err(lift)?
            .into_iter()
            .filter_map(|r| r.mean().map(|mean| (r.start, r.end, mean)))
            .collect(),
        None => file
            .read_raw(&locus.chr, locus.start, locus.end)
            .await
            .map_err(lift)?
            .into_iter()
            .map(|v| (v.start, v.end, v.value as f64))
            .collect(),
    };

    Ok(values
        .into_iter()
        .filter_map(|(start, end, value)| {
            let genome = ChromosomeInterval::new(locus.chr.clone(), start as u64, end as u64);
            context
                .convert_genome_interval_to_bases_in(segment_index, &genome)
                .map(|interval| TrackRecord::Signal(SignalRecord { interval, value }))
        })
        .collect())
}

#[async_trait]
impl DataSource for BigWigSource {
    async fn get_data(
        &self,
        region: &DisplayedRegionModel,
        options: &FetchOptions,
    ) -> SourceResult<Vec<TrackRecord>> {
        if self.is_disposed() {
            log::debug!("{} is cleaned up; ignoring request for {}", self.location, region);
            return Ok(Vec::new());
        }

        let file = self.connect().await?;
        if self.is_disposed() {
            return Ok(Vec::new());
        }

        let width = self.options.effective_width(options);
        let bases_per_pixel = region.width() as f64 / width;
        let zoom = select_zoom_level(file.zoom_levels(), bases_per_pixel);
        log::debug!(
            "Fetching {} from {} at {:.2} bases/px using {}",
            region,
            self.location,
            bases_per_pixel,
            match zoom {
                Some(level) => format!("zoom level {} (x{})", level, file.zoom_levels()[level].reduction_level),
                None => "base-pair data".to_string(),
            }
        );

        let context = region.navigation_context();
        let reads = region
            .feature_segments()
            .into_iter()
            .filter_map(|slice| slice.locus.map(|locus| (slice.segment_index, locus)))
            .map(|(segment_index, locus)| {
                let file = Arc::clone(&file);
                async move { read_segment(&file, zoom, context, segment_index, &locus).await }
            });

        let per_segment: Vec<Vec<TrackRecord>> = try_join_all(reads).await.map_err(|e: SourceError| {
            log::warn!("Fetch of {} from {} failed: {}", region, self.location, e);
            e
        })?;

        Ok(per_segment.into_iter().flatten().collect())
    }

    fn clean_up(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            log::debug!("Cleaned up {}", self.location);
        }
    }
}
