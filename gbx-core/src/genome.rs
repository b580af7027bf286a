//! Genome assemblies and chrom.sizes loading

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ParseError, ParseResult};
use crate::navigation::{NavigationContext, Segment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromosome {
    pub name: String,
    pub length: u64,
}

impl Chromosome {
    pub fn new<S: Into<String>>(name: S, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// A named assembly: chromosomes in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genome {
    pub name: String,
    pub chromosomes: Vec<Chromosome>,
}

impl Genome {
    pub fn new<S: Into<String>>(name: S, chromosomes: Vec<Chromosome>) -> Self {
        Self {
            name: name.into(),
            chromosomes,
        }
    }

    /// Read a UCSC `chrom.sizes` listing (`name<TAB>length` per line).
    ///
    /// Blank lines and `#` comments are skipped. Extra columns are ignored.
    pub fn from_chrom_sizes<S: Into<String>, R: BufRead>(name: S, reader: R) -> ParseResult<Self> {
        let mut chromosomes = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ParseError::Line {
                line: line_no + 1,
                message: e.to_string(),
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(chr), Some(length)) = (fields.next(), fields.next()) else {
                return Err(ParseError::Line {
                    line: line_no + 1,
                    message: format!("expected '<name> <length>', got '{}'", line),
                });
            };
            let length = length.parse::<u64>().map_err(|_| ParseError::Line {
                line: line_no + 1,
                message: format!("invalid length '{}' for '{}'", length, chr),
            })?;

            chromosomes.push(Chromosome::new(chr, length));
        }

        Ok(Self::new(name, chromosomes))
    }

    /// Load a `chrom.sizes` file from disk
    pub fn load_chrom_sizes<S: Into<String>, P: AsRef<Path>>(name: S, path: P) -> ParseResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ParseError::Line {
            line: 0,
            message: format!("cannot open {}: {}", path.display(), e),
        })?;
        Self::from_chrom_sizes(name, BufReader::new(file))
    }

    pub fn chromosome(&self, name: &str) -> Option<&Chromosome> {
        self.chromosomes.iter().find(|c| c.name == name)
    }

    pub fn total_length(&self) -> u64 {
        self.chromosomes.iter().map(|c| c.length).sum()
    }

    /// Default navigation context: one segment per chromosome, optionally
    /// separated by gaps of `gap` bases
    pub fn make_nav_context(&self, gap: Option<u64>) -> Result<Arc<NavigationContext>, ConfigurationError> {
        let segments = self
            .chromosomes
            .iter()
            .map(|c| Segment::chromosome(c.name.clone(), c.length))
            .collect();
        NavigationContext::from_features(self.name.clone(), segments, gap).map(Arc::new)
    }
}
