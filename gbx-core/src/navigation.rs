//! Navigation contexts
//!
//! A navigation context stitches an ordered list of segments (whole
//! chromosomes, features of a region set, or explicit gaps) into one linear
//! coordinate space starting at 0. Each segment owns the range
//! `[offset, offset + length)` of that space, and segments never overlap.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ParseError, ParseResult};
use crate::interval::{ChromosomeInterval, OpenInterval};
use crate::region::DisplayedRegionModel;

/// What a segment of the linear space stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// A stretch of genome: a whole chromosome or a feature of a region set
    Locus(ChromosomeInterval),
    /// Padding between loci that maps to no genome position
    Gap,
}

/// One named unit of a navigation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    name: String,
    length: u64,
    kind: SegmentKind,
}

impl Segment {
    /// A whole chromosome, `[0, length)`
    pub fn chromosome<S: Into<String>>(name: S, length: u64) -> Self {
        let name = name.into();
        Self {
            kind: SegmentKind::Locus(ChromosomeInterval::new(name.clone(), 0, length)),
            name,
            length,
        }
    }

    /// A named feature backed by a genome interval
    pub fn feature<S: Into<String>>(name: S, locus: ChromosomeInterval) -> Self {
        Self {
            name: name.into(),
            length: locus.len(),
            kind: SegmentKind::Locus(locus),
        }
    }

    /// A gap of `length` bases; zero-length gaps act as boundary markers
    pub fn gap(length: u64) -> Self {
        Self {
            name: "gap".to_string(),
            length,
            kind: SegmentKind::Gap,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn is_gap(&self) -> bool {
        matches!(self.kind, SegmentKind::Gap)
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Genome interval behind this segment, `None` for gaps
    pub fn locus(&self) -> Option<&ChromosomeInterval> {
        match &self.kind {
            SegmentKind::Locus(locus) => Some(locus),
            SegmentKind::Gap => None,
        }
    }
}

/// A position expressed relative to one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureCoordinate {
    pub segment_index: usize,
    pub relative: u64,
}

/// The part of one segment that falls inside some linear interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSegment {
    pub segment_index: usize,
    pub name: String,
    /// Absolute linear coordinates of the slice
    pub bases: OpenInterval,
    /// Coordinates relative to the segment start
    pub relative: OpenInterval,
    /// Genome coordinates of the slice, `None` for gaps
    pub locus: Option<ChromosomeInterval>,
}

impl FeatureSegment {
    pub fn is_gap(&self) -> bool {
        self.locus.is_none()
    }

    pub fn genome_coordinates(&self) -> Option<&ChromosomeInterval> {
        self.locus.as_ref()
    }
}

/// Ordered segments plus their cumulative offsets
#[derive(Debug, Clone)]
pub struct NavigationContext {
    name: String,
    segments: Vec<Segment>,
    offsets: Vec<u64>,
    total_length: u64,
    by_name: HashMap<String, usize>,
    by_chromosome: HashMap<String, Vec<usize>>,
}

impl NavigationContext {
    /// Build a context from segments in display order.
    ///
    /// Fails when the total length is zero or two loci share a name.
    pub fn new<S: Into<String>>(name: S, segments: Vec<Segment>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let mut offsets = Vec::with_capacity(segments.len());
        let mut by_name = HashMap::new();
        let mut by_chromosome: HashMap<String, Vec<usize>> = HashMap::new();
        let mut total_length: u64 = 0;

        for (index, segment) in segments.iter().enumerate() {
            offsets.push(total_length);
            total_length = total_length.checked_add(segment.len()).ok_or_else(|| {
                ConfigurationError::new(format!("navigation context '{}' overflows u64", name))
            })?;

            if let Some(locus) = segment.locus() {
                if by_name.insert(segment.name.clone(), index).is_some() {
                    return Err(ConfigurationError::new(format!(
                        "duplicate segment name '{}' in navigation context '{}'",
                        segment.name, name
                    )));
                }
                by_chromosome.entry(locus.chr.clone()).or_default().push(index);
            }
        }

        if total_length == 0 {
            return Err(ConfigurationError::new(format!(
                "navigation context '{}' has zero total length",
                name
            )));
        }

        log::debug!(
            "Built navigation context '{}' with {} segments over {} bases",
            name,
            segments.len(),
            total_length
        );

        Ok(Self {
            name,
            segments,
            offsets,
            total_length,
            by_name,
            by_chromosome,
        })
    }

    /// Build a region-set context, optionally separating features with gaps
    pub fn from_features<S: Into<String>>(
        name: S,
        features: Vec<Segment>,
        gap: Option<u64>,
    ) -> Result<Self, ConfigurationError> {
        let mut segments = Vec::with_capacity(features.len() * 2);
        for (i, feature) in features.into_iter().enumerate() {
            if i > 0 {
                if let Some(gap_length) = gap {
                    segments.push(Segment::gap(gap_length));
                }
            }
            segments.push(feature);
        }
        Self::new(name, segments)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// The whole linear space, `[0, total_length)`
    pub fn get_context_coordinates(&self) -> OpenInterval {
        OpenInterval {
            start: 0,
            end: self.total_length,
        }
    }

    pub fn segment_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn has_segment(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Linear coordinates occupied by the segment at `index`
    pub fn segment_bases(&self, index: usize) -> Option<OpenInterval> {
        let segment = self.segments.get(index)?;
        let start = self.offsets[index];
        Some(OpenInterval {
            start,
            end: start + segment.len(),
        })
    }

    /// Parse a segment name or a 1-indexed `chr:start-end` locator into a
    /// view region. Coordinates outside the chromosome's extent in this
    /// context are an error, never clamped.
    pub fn parse(self: &Arc<Self>, query: &str) -> ParseResult<DisplayedRegionModel> {
        let query = query.trim();

        if let Some(index) = self.segment_index(query) {
            if let Some(bases) = self.segment_bases(index) {
                if !bases.is_empty() {
                    return Ok(DisplayedRegionModel::from_parts(Arc::clone(self), bases));
                }
            }
        }

        let chr_interval = ChromosomeInterval::parse(query)?;
        let (min, max) = self
            .chromosome_extent(&chr_interval.chr)
            .ok_or_else(|| ParseError::UnknownChromosome(chr_interval.chr.clone()))?;

        let out_of_bounds = || ParseError::OutOfBounds {
            locator: query.to_string(),
            chr: chr_interval.chr.clone(),
            min: min + 1,
            max,
        };

        if chr_interval.start < min || chr_interval.end > max {
            return Err(out_of_bounds());
        }

        let bases = OpenInterval::span_of(self.convert_genome_interval_to_bases(&chr_interval))
            .ok_or_else(out_of_bounds)?;

        Ok(DisplayedRegionModel::from_parts(Arc::clone(self), bases))
    }

    /// Smallest start and largest end of all loci on `chr`
    fn chromosome_extent(&self, chr: &str) -> Option<(u64, u64)> {
        let indices = self.by_chromosome.get(chr)?;
        indices
            .iter()
            .filter_map(|&i| self.segments[i].locus())
            .fold(None, |acc, locus| match acc {
                None => Some((locus.start, locus.end)),
                Some((lo, hi)) => Some((lo.min(locus.start), hi.max(locus.end))),
            })
    }

    /// Map a genome interval into linear coordinates.
    ///
    /// Returns one interval per locus segment that the query intersects,
    /// sorted by start. More than one result means the query straddles a gap
    /// or a discontinuity; callers wanting a single span take the outer
    /// bounds. An empty result means the query is not in this context.
    pub fn convert_genome_interval_to_bases(&self, query: &ChromosomeInterval) -> Vec<OpenInterval> {
        let Some(indices) = self.by_chromosome.get(&query.chr) else {
            return Vec::new();
        };

        let mut intervals: Vec<OpenInterval> = indices
            .iter()
            .filter_map(|&index| self.convert_genome_interval_to_bases_in(index, query))
            .collect();
        intervals.sort_by_key(|iv| (iv.start, iv.end));
        intervals
    }

    /// Map a genome interval into linear coordinates, scoped to one segment.
    ///
    /// `None` when the query misses the segment's genomic extent or the
    /// segment is a gap.
    pub fn convert_genome_interval_to_bases_in(
        &self,
        segment_index: usize,
        query: &ChromosomeInterval,
    ) -> Option<OpenInterval> {
        let locus = self.segments.get(segment_index)?.locus()?;
        let overlap = locus.intersect(query)?;
        let start = self.offsets[segment_index] + (overlap.start - locus.start);
        Some(OpenInterval {
            start,
            end: start + overlap.len(),
        })
    }

    /// Find the segment holding a linear base.
    ///
    /// `total_length` itself resolves to the end of the last non-empty
    /// segment so that exclusive interval ends can be located.
    pub fn locate(&self, base: u64) -> Option<FeatureCoordinate> {
        if base > self.total_length {
            return None;
        }
        if base == self.total_length {
            let index = self.segments.iter().rposition(|s| !s.is_empty())?;
            return Some(FeatureCoordinate {
                segment_index: index,
                relative: self.segments[index].len(),
            });
        }

        let index = self.offsets.partition_point(|&offset| offset <= base).checked_sub(1)?;
        Some(FeatureCoordinate {
            segment_index: index,
            relative: base - self.offsets[index],
        })
    }

    /// Genome position of a linear base, `None` inside gaps or out of range
    pub fn convert_base_to_genome(&self, base: u64) -> Option<(String, u64)> {
        let coord = self.locate(base)?;
        let locus = self.segments[coord.segment_index].locus()?;
        Some((locus.chr.clone(), locus.start + coord.relative))
    }

    /// Slices of every non-empty segment overlapping `interval`, in order
    pub fn feature_segments(&self, interval: &OpenInterval) -> Vec<FeatureSegment> {
        let first = self
            .offsets
            .partition_point(|&offset| offset <= interval.start)
            .saturating_sub(1);

        let mut slices = Vec::new();
        for index in first..self.segments.len() {
            let segment = &self.segments[index];
            let offset = self.offsets[index];
            if offset >= interval.end {
                break;
            }
            let span = OpenInterval {
                start: offset,
                end: offset + segment.len(),
            };
            let Some(bases) = span.intersect(interval) else {
                continue;
            };
            let relative = OpenInterval {
                start: bases.start - offset,
                end: bases.end - offset,
            };
            let locus = segment.locus().map(|locus| {
                ChromosomeInterval::new(
                    locus.chr.clone(),
                    locus.start + relative.start,
                    locus.start + relative.end,
                )
            });
            slices.push(FeatureSegment {
                segment_index: index,
                name: segment.name.clone(),
                bases,
                relative,
                locus,
            });
        }
        slices
    }

    /// Linear ranges inside `interval` that are gaps
    pub fn gaps_in(&self, interval: &OpenInterval) -> Vec<OpenInterval> {
        self.feature_segments(interval)
            .into_iter()
            .filter(FeatureSegment::is_gap)
            .map(|slice| slice.bases)
            .collect()
    }
}
