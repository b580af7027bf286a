//! Interval primitives
//!
//! Half-open intervals in three flavours: linear bases ([`OpenInterval`]),
//! drawing-space pixels ([`PixelInterval`]) and chromosome-qualified genome
//! coordinates ([`ChromosomeInterval`]).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ParseError, ParseResult};

/// Half-open `[start, end)` range of non-negative integer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpenInterval {
    /// Start position (inclusive)
    pub start: u64,
    /// End position (exclusive)
    pub end: u64,
}

impl OpenInterval {
    /// Create a new interval, rejecting `start > end`
    pub fn new(start: u64, end: u64) -> Result<Self, ConfigurationError> {
        if start > end {
            return Err(ConfigurationError::new(format!(
                "interval start {} is greater than end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Create an interval from two endpoints in either order
    pub fn spanning(a: u64, b: u64) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Outer bounds of a set of intervals, `None` when the set is empty
    pub fn span_of<I: IntoIterator<Item = OpenInterval>>(intervals: I) -> Option<Self> {
        intervals.into_iter().fold(None, |acc, iv| match acc {
            None => Some(iv),
            Some(span) => Some(Self {
                start: span.start.min(iv.start),
                end: span.end.max(iv.end),
            }),
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `base` lies in `[start, end)`
    pub fn contains(&self, base: u64) -> bool {
        self.start <= base && base < self.end
    }

    /// Whether `other` lies entirely inside this interval
    pub fn contains_interval(&self, other: &OpenInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &OpenInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Intersection of two intervals, `None` if they share no base
    pub fn intersect(&self, other: &OpenInterval) -> Option<OpenInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(OpenInterval { start, end })
        } else {
            None
        }
    }
}

impl fmt::Display for OpenInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Half-open `[start, end)` range in drawing space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelInterval {
    pub start: f64,
    pub end: f64,
}

impl PixelInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        !(self.start < self.end)
    }

    /// Translate both endpoints by `dx`
    pub fn shift(&self, dx: f64) -> Self {
        Self {
            start: self.start + dx,
            end: self.end + dx,
        }
    }
}

impl fmt::Display for PixelInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2})", self.start, self.end)
    }
}

/// Chromosome-qualified, 0-based, half-open genome interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChromosomeInterval {
    pub chr: String,
    pub start: u64,
    pub end: u64,
}

fn locator_regex() -> Option<&'static Regex> {
    static LOCATOR: OnceLock<Option<Regex>> = OnceLock::new();
    LOCATOR
        .get_or_init(|| Regex::new(r"^\s*([^\s:]+(?::[^\s:]+)*?):([0-9,]+)-([0-9,]+)\s*$").ok())
        .as_ref()
}

impl ChromosomeInterval {
    /// Endpoints given in reverse order are swapped
    pub fn new<S: Into<String>>(chr: S, start: u64, end: u64) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            chr: chr.into(),
            start,
            end,
        }
    }

    /// Parse a 1-indexed `chr:start-end` locator into a 0-indexed interval.
    ///
    /// Commas are accepted as thousands separators. A start of 0 and a start
    /// past the end are both rejected; nothing is clamped.
    pub fn parse(locator: &str) -> ParseResult<Self> {
        let caps = locator_regex()
            .and_then(|re| re.captures(locator))
            .ok_or_else(|| ParseError::Malformed(locator.to_string()))?;

        let chr = caps[1].to_string();
        let start = parse_position(locator, &caps[2])?;
        let end = parse_position(locator, &caps[3])?;

        if start == 0 {
            return Err(ParseError::InvalidPosition {
                locator: locator.to_string(),
                value: caps[2].to_string(),
            });
        }
        if start > end {
            return Err(ParseError::StartAfterEnd {
                locator: locator.to_string(),
                start,
                end,
            });
        }

        Ok(Self {
            chr,
            start: start - 1,
            end,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The base range without its chromosome
    pub fn as_open_interval(&self) -> OpenInterval {
        OpenInterval {
            start: self.start,
            end: self.end,
        }
    }

    /// Intersection with another interval on the same chromosome
    pub fn intersect(&self, other: &ChromosomeInterval) -> Option<ChromosomeInterval> {
        if self.chr != other.chr {
            return None;
        }
        self.as_open_interval()
            .intersect(&other.as_open_interval())
            .map(|iv| ChromosomeInterval::new(self.chr.clone(), iv.start, iv.end))
    }
}

fn parse_position(locator: &str, raw: &str) -> ParseResult<u64> {
    raw.replace(',', "")
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidPosition {
            locator: locator.to_string(),
            value: raw.to_string(),
        })
}

impl fmt::Display for ChromosomeInterval {
    /// 1-indexed display form, e.g. `chr1:101-200`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start + 1, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_interval_rejects_reversed_bounds() {
        assert!(OpenInterval::new(10, 5).is_err());
        let iv = OpenInterval::new(5, 5).unwrap();
        assert!(iv.is_empty());
        assert_eq!(iv.len(), 0);
    }

    #[test]
    fn test_open_interval_intersection() {
        let a = OpenInterval::new(0, 100).unwrap();
        let b = OpenInterval::new(50, 150).unwrap();
        assert_eq!(a.intersect(&b), Some(OpenInterval { start: 50, end: 100 }));

        let c = OpenInterval::new(100, 200).unwrap();
        assert_eq!(a.intersect(&c), None);
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_open_interval_containment() {
        let a = OpenInterval::new(10, 20).unwrap();
        assert!(a.contains(10));
        assert!(!a.contains(20));
        assert!(a.contains_interval(&OpenInterval { start: 12, end: 20 }));
        assert!(!a.contains_interval(&OpenInterval { start: 5, end: 15 }));
    }

    #[test]
    fn test_span_of() {
        let spans = vec![
            OpenInterval { start: 300, end: 400 },
            OpenInterval { start: 100, end: 150 },
        ];
        assert_eq!(
            OpenInterval::span_of(spans),
            Some(OpenInterval { start: 100, end: 400 })
        );
        assert_eq!(OpenInterval::span_of(Vec::new()), None);
    }

    #[test]
    fn test_parse_locator_is_one_indexed() {
        let iv = ChromosomeInterval::parse("chr1:101-200").unwrap();
        assert_eq!(iv, ChromosomeInterval::new("chr1", 100, 200));
        assert_eq!(iv.to_string(), "chr1:101-200");
    }

    #[test]
    fn test_parse_locator_with_commas() {
        let iv = ChromosomeInterval::parse("chr7:1,000,001-1,002,000").unwrap();
        assert_eq!(iv.start, 1_000_000);
        assert_eq!(iv.end, 1_002_000);
    }

    #[test]
    fn test_parse_locator_accepts_colons_in_name() {
        let iv = ChromosomeInterval::parse("HLA-A*01:01:1-100").unwrap();
        assert_eq!(iv.chr, "HLA-A*01:01");
        assert_eq!(iv.len(), 100);
    }

    #[test]
    fn test_parse_start_after_end_fails() {
        let err = ChromosomeInterval::parse("chrX:500-300").unwrap_err();
        assert!(matches!(err, ParseError::StartAfterEnd { start: 500, end: 300, .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            ChromosomeInterval::parse("chr1"),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            ChromosomeInterval::parse("chr1:0-10"),
            Err(ParseError::InvalidPosition { .. })
        ));
        assert!(ChromosomeInterval::parse("chr1:abc-10").is_err());
    }

    #[test]
    fn test_pixel_interval_shift() {
        let px = PixelInterval::new(10.0, 20.0).shift(5.0);
        assert_eq!(px, PixelInterval::new(15.0, 25.0));
        assert_eq!(px.len(), 10.0);
        assert!(PixelInterval::new(3.0, 3.0).is_empty());
    }
}
