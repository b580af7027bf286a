//! GBX Core Library
//!
//! Navigation contexts, coordinate mapping, region expansion, and track data
//! sources for GBX.

pub mod error;
pub mod interval;
pub mod genome;
pub mod navigation;
pub mod region;
pub mod expander;
pub mod drawing;
pub mod bbi;
pub mod source;
pub mod track;
pub mod highlight;

// Re-export commonly used types and functions
pub use error::{ConfigurationError, FetchError, OpenError, ParseError, SourceError};
pub use interval::{ChromosomeInterval, OpenInterval, PixelInterval};
pub use genome::{Chromosome, Genome};
pub use navigation::{FeatureCoordinate, FeatureSegment, NavigationContext, Segment, SegmentKind};
pub use region::DisplayedRegionModel;
pub use expander::{ExpansionCache, RegionExpander, ViewExpansion};
pub use drawing::LinearDrawingModel;
pub use source::{
    BigWigSource, DataSource, FetchOptions, RulerSource, RulerTick, SignalRecord, SourceOptions,
    TrackRecord, TrackSource,
};
pub use track::{FetchOutcome, TrackController, TrackModel, TrackState, TrackType};
pub use highlight::{highlight_interval, reconcile, HighlightItem, HighlightSet};

/// Version information for the GBX core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
