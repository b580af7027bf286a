//! Configuration handling for the GBX CLI
//!
//! Loaded from gbx.toml files; command-line arguments override individual
//! values.

use anyhow::{bail, Context, Result};
use gbx_core::{
    Chromosome, Genome, HighlightItem, HighlightSet, NavigationContext, RegionExpander,
    SourceOptions, TrackModel, TrackType,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub genome: GenomeConfig,
    #[serde(default)]
    pub tracks: Vec<TrackModel>,
    #[serde(default)]
    pub highlights: Vec<HighlightItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Visible track width in pixels
    #[serde(default = "default_width")]
    pub width: f64,

    /// Off-screen bases fetched on each side, as a multiple of the view width
    #[serde(default = "default_expansion_factor")]
    pub expansion_factor: f64,

    /// Pixels reserved left of the track content
    #[serde(default = "default_legend_width")]
    pub legend_width: f64,

    /// Width assumed by data sources when a request carries none
    #[serde(default = "default_fallback_width")]
    pub fallback_width: f64,

    /// Minimum pixels between ruler ticks
    #[serde(default = "default_min_tick_spacing")]
    pub min_tick_spacing: f64,

    /// Locus shown when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConfig {
    #[serde(default = "default_genome_name")]
    pub name: String,

    /// Two-column chrom.sizes file; takes precedence over `chromosomes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrom_sizes: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chromosomes: Vec<Chromosome>,

    /// Gap length inserted between chromosomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<u64>,
}

// Default value functions
fn default_width() -> f64 { 1200.0 }
fn default_expansion_factor() -> f64 { gbx_core::expander::DEFAULT_EXPANSION_FACTOR }
fn default_legend_width() -> f64 { 120.0 }
fn default_fallback_width() -> f64 { gbx_core::source::DEFAULT_FALLBACK_WIDTH }
fn default_min_tick_spacing() -> f64 { gbx_core::source::DEFAULT_MIN_TICK_SPACING }
fn default_genome_name() -> String { "genome".to_string() }

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            expansion_factor: default_expansion_factor(),
            legend_width: default_legend_width(),
            fallback_width: default_fallback_width(),
            min_tick_spacing: default_min_tick_spacing(),
            region: None,
        }
    }
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            name: default_genome_name(),
            chrom_sizes: None,
            chromosomes: Vec::new(),
            gap: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view: ViewConfig::default(),
            genome: GenomeConfig::default(),
            tracks: vec![TrackModel::new(TrackType::Ruler, "Ruler")],
            highlights: Vec::new(),
        }
    }
}

impl ViewConfig {
    pub fn expander(&self) -> RegionExpander {
        RegionExpander::new(self.expansion_factor)
    }

    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            fallback_width: self.fallback_width,
            min_tick_spacing: self.min_tick_spacing,
        }
    }
}

impl GenomeConfig {
    pub fn is_configured(&self) -> bool {
        self.chrom_sizes.is_some() || !self.chromosomes.is_empty()
    }

    /// Load the genome, preferring the chrom.sizes file
    pub fn load(&self) -> Result<Genome> {
        if let Some(path) = &self.chrom_sizes {
            return Genome::load_chrom_sizes(self.name.clone(), path)
                .with_context(|| format!("Failed to load chrom.sizes: {}", path.display()));
        }
        if self.chromosomes.is_empty() {
            bail!("No genome configured: set [genome].chrom_sizes or [genome].chromosomes");
        }
        Ok(Genome::new(self.name.clone(), self.chromosomes.clone()))
    }

    pub fn navigation_context(&self) -> Result<Arc<NavigationContext>> {
        let genome = self.load()?;
        genome
            .make_nav_context(self.gap)
            .with_context(|| format!("Invalid genome '{}'", self.name))
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("gbx.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: gbx.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file.
    ///
    /// A relative chrom.sizes path is resolved against the file's directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        if let (Some(sizes), Some(dir)) = (&config.genome.chrom_sizes, path.parent()) {
            if sizes.is_relative() {
                config.genome.chrom_sizes = Some(dir.join(sizes));
            }
        }

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Defaults plus a sample genome, region and signal track
    pub fn example() -> Self {
        let mut config = Self::default();
        config.view.region = Some("chr1:1-1000000".to_string());
        config.genome.chrom_sizes = Some(PathBuf::from("hg38.chrom.sizes"));
        config.tracks.push(
            TrackModel::new(TrackType::BigWig, "Signal")
                .with_url("https://example.org/signal.bw")
                .with_option("color", serde_json::Value::from("#2a6fef")),
        );
        config
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::example()).context("Failed to serialize example configuration")
    }

    pub fn highlight_set(&self) -> HighlightSet {
        self.highlights.iter().cloned().collect()
    }
}
