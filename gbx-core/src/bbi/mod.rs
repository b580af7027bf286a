//! Indexed binary (BBI) signal files
//!
//! A reader for the bigWig flavour of the Kent BBI container:
//! - Header { magic, version, zoom count, section offsets }
//! - Zoom headers { reduction level, data offset, index offset }
//! - Chromosome B+ tree { name -> (id, size) }
//! - Data sections { bedGraph | variableStep | fixedStep, optionally zlib }
//! - R-tree index over data blocks, one per resolution
//!
//! Everything is read through [`RangeReader`], so the same decoder serves
//! local files, in-memory buffers and (with the `remote` feature) HTTP.

mod bigwig;
mod reader;

#[cfg(test)]
pub(crate) mod fixture;

use thiserror::Error;

use crate::error::{FetchError, OpenError};

pub use bigwig::BigWigFile;
#[cfg(feature = "remote")]
pub use reader::HttpRangeReader;
pub use reader::{open_location, FileRangeReader, MemoryRangeReader, RangeReader};

pub(crate) const BIGWIG_MAGIC: u32 = 0x888F_FC26;
pub(crate) const BIGWIG_MAGIC_SWAPPED: u32 = 0x26FC_8F88;
pub(crate) const CHROM_TREE_MAGIC: u32 = 0x78CA_8C91;
pub(crate) const CIR_TREE_MAGIC: u32 = 0x2468_ACE0;

pub(crate) const HEADER_SIZE: u64 = 64;
pub(crate) const ZOOM_HEADER_SIZE: u64 = 24;
pub(crate) const SUMMARY_SIZE: u64 = 40;
pub(crate) const CHROM_TREE_HEADER_SIZE: u64 = 32;
pub(crate) const CIR_TREE_HEADER_SIZE: u64 = 48;
pub(crate) const SECTION_HEADER_SIZE: usize = 24;
pub(crate) const ZOOM_RECORD_SIZE: usize = 32;

/// Errors raised while decoding a BBI file
#[derive(Debug, Error)]
pub enum BbiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic 0x{found:08x} in {what}")]
    InvalidMagic { what: &'static str, found: u32 },

    #[error("Truncated {what}: needed {needed} bytes, got {got}")]
    Truncated { what: &'static str, needed: u64, got: u64 },

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Unknown data section type {0}")]
    UnknownSectionType(u8),

    #[error("Data corruption: {0}")]
    Corruption(String),

    #[error("Zoom level {0} does not exist")]
    NoSuchZoomLevel(usize),
}

pub type BbiResult<T> = Result<T, BbiError>;

impl BbiError {
    /// Lift into the error reported when a source cannot be opened
    pub fn into_open_error(self, location: &str) -> OpenError {
        OpenError::new(location, self.to_string())
    }

    /// Lift into the error reported for a failed interval read
    pub fn into_fetch_error(self, chr: &str, start: u64, end: u64) -> FetchError {
        let chr = chr.to_string();
        match self {
            BbiError::Io(source) => FetchError::Io { chr, start, end, source },
            BbiError::NoSuchZoomLevel(level) => FetchError::NoSuchZoomLevel(level),
            other => FetchError::Corrupt {
                chr,
                start,
                end,
                message: other.to_string(),
            },
        }
    }
}

/// Fixed-size file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BbiHeader {
    pub big_endian: bool,
    pub version: u16,
    pub zoom_levels: u16,
    pub chrom_tree_offset: u64,
    pub full_data_offset: u64,
    pub full_index_offset: u64,
    pub field_count: u16,
    pub defined_field_count: u16,
    pub auto_sql_offset: u64,
    pub total_summary_offset: u64,
    pub uncompress_buf_size: u32,
    pub extension_offset: u64,
}

impl BbiHeader {
    /// Data blocks are zlib streams when an uncompress buffer is declared
    pub fn is_compressed(&self) -> bool {
        self.uncompress_buf_size > 0
    }
}

/// One precomputed resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomHeader {
    /// Bases summarised by one record at this level
    pub reduction_level: u32,
    pub data_offset: u64,
    pub index_offset: u64,
}

/// Whole-file statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub bases_covered: u64,
    pub min_val: f64,
    pub max_val: f64,
    pub sum: f64,
    pub sum_squares: f64,
}

/// Entry of the chromosome B+ tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromInfo {
    pub name: String,
    pub id: u32,
    pub length: u32,
}

/// A base-pair resolution value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value {
    pub start: u32,
    pub end: u32,
    pub value: f32,
}

/// A summary record of one zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRecord {
    pub start: u32,
    pub end: u32,
    pub valid_count: u32,
    pub min_val: f32,
    pub max_val: f32,
    pub sum: f32,
    pub sum_squares: f32,
}

impl ZoomRecord {
    /// Mean value over the valid bases, `None` when nothing was covered
    pub fn mean(&self) -> Option<f64> {
        if self.valid_count == 0 {
            None
        } else {
            Some(self.sum as f64 / self.valid_count as f64)
        }
    }
}
