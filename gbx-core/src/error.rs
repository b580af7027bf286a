//! Error taxonomy for GBX core
//!
//! Coordinate mapping never fails for "not visible" input; it returns an
//! empty result instead. The errors here cover malformed locators, invalid
//! construction parameters, and the two ways a track data source can fail.

use thiserror::Error;

/// Malformed region locator or coordinates outside the navigation context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid locator '{0}': expected <chr>:<start>-<end> or a segment name")]
    Malformed(String),

    #[error("Invalid position value '{value}' in locator '{locator}'")]
    InvalidPosition { locator: String, value: String },

    #[error("Unknown chromosome or segment '{0}'")]
    UnknownChromosome(String),

    #[error("Start {start} is greater than end {end} in locator '{locator}'")]
    StartAfterEnd { locator: String, start: u64, end: u64 },

    #[error("Locator '{locator}' lies outside {chr}:{min}-{max}")]
    OutOfBounds { locator: String, chr: String, min: u64, max: u64 },

    #[error("Parse error at line {line}: {message}")]
    Line { line: usize, message: String },
}

/// Invalid construction parameters, fatal to the constructing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigurationError {
    pub message: String,
}

impl ConfigurationError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }
}

/// The remote or local file behind a data source could not be opened.
///
/// Cloneable so one failed open can be handed to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to open '{location}': {message}")]
pub struct OpenError {
    pub location: String,
    pub message: String,
}

impl OpenError {
    pub fn new<L: Into<String>, M: Into<String>>(location: L, message: M) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// A read of one interval failed after the file was opened.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("IO error while reading {chr}:{start}-{end}: {source}")]
    Io {
        chr: String,
        start: u64,
        end: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data while reading {chr}:{start}-{end}: {message}")]
    Corrupt {
        chr: String,
        start: u64,
        end: u64,
        message: String,
    },

    #[error("Zoom level {0} does not exist")]
    NoSuchZoomLevel(usize),
}

/// Aggregate error returned by [`crate::source::DataSource::get_data`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type SourceResult<T> = Result<T, SourceError>;
