use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "gbx")]
#[command(about = "GBX - Genome browser coordinate and track engine")]
#[command(version)]
#[command(long_about = "
GBX maps genome coordinates onto a linear navigation context, expands views
for off-screen prefetch, and reads indexed signal files for display.

Examples:
  gbx parse chr2:101-200 --chrom-sizes hg38.chrom.sizes
  gbx expand chr2:1-100 --width 100 --factor 1
  gbx info signal.bw
  gbx fetch signal.bw chr1:1,000,001-1,100,000 --width 1200 --json
  gbx view chr1:1-1000000 --config gbx.toml
  gbx config --init gbx.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// chrom.sizes file, overriding the configured genome
    #[arg(long, global = true)]
    pub chrom_sizes: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a locator or segment name to navigation context coordinates
    Parse {
        /// Locator (chr:start-end, 1-indexed) or segment name
        locus: String,

        /// Drawing width in pixels
        #[arg(long)]
        width: Option<f64>,
    },

    /// Compute the off-screen expansion of a view region
    Expand {
        /// Locator or segment name of the visible region
        locus: String,

        /// Visible width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Multiple of the view width added on each side
        #[arg(long)]
        factor: Option<f64>,
    },

    /// Show header, zoom levels and chromosomes of a bigWig file
    Info {
        /// Path or URL of the bigWig file
        file: String,
    },

    /// Fetch signal records from a bigWig file for a region
    Fetch {
        /// Path or URL of the bigWig file
        file: String,

        /// Locator or segment name
        locus: String,

        /// Pixel width the records are meant for; drives zoom level selection
        #[arg(long)]
        width: Option<f64>,

        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Load every configured track and highlight for a view
    View {
        /// Locator or segment name; defaults to [view].region
        locus: Option<String>,

        /// Shift the view by this many bases before loading
        #[arg(long, allow_hyphen_values = true)]
        pan: Option<i64>,

        /// Scale the view width around its centre before loading
        #[arg(long)]
        zoom: Option<f64>,

        /// Visible width in pixels
        #[arg(long)]
        width: Option<f64>,
    },

    /// Print or write an example configuration
    Config {
        /// Write the example to this path instead of printing it
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.chrom_sizes {
        config.genome.chrom_sizes = Some(path);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        Commands::Parse { locus, width } => {
            commands::parse::execute(&config, &locus, width)?;
        }

        Commands::Expand { locus, width, factor } => {
            commands::expand::execute(&config, &locus, width, factor)?;
        }

        Commands::Info { file } => {
            runtime.block_on(commands::info::execute(&file))?;
        }

        Commands::Fetch { file, locus, width, json } => {
            runtime.block_on(commands::fetch::execute(&config, &file, &locus, width, json))?;
        }

        Commands::View { locus, pan, zoom, width } => {
            runtime.block_on(commands::view::execute(&config, locus, pan, zoom, width))?;
        }

        Commands::Config { init } => match init {
            Some(path) => {
                Config::example().save_to_file(&path)?;
                log::info!("Wrote example configuration to {}", path.display());
            }
            None => print!("{}", Config::example_toml()?),
        },
    }

    Ok(())
}
