//! Fetch command - read signal records for a region from a bigWig file

use anyhow::{Context, Result};
use gbx_core::{
    BigWigSource, Chromosome, DataSource, FetchOptions, Genome, NavigationContext, TrackRecord,
};
use std::sync::Arc;

use super::resolve_region;
use crate::config::Config;

pub async fn execute(config: &Config, file: &str, locus: &str, width: Option<f64>, json: bool) -> Result<()> {
    let source = BigWigSource::new(file, config.view.source_options());
    let context = if config.genome.is_configured() {
        config.genome.navigation_context()?
    } else {
        log::info!("No genome configured; using the chromosomes of {}", file);
        file_context(&source).await?
    };

    let region = resolve_region(&context, locus)?;
    let width = width.unwrap_or(config.view.width);
    let records = source
        .get_data(&region, &FetchOptions::with_width(width))
        .await
        .with_context(|| format!("Failed to fetch {} from {}", region, file))?;
    source.clean_up();

    log::info!("Fetched {} records for {}", records.len(), region);
    for record in &records {
        if json {
            println!("{}", serde_json::to_string(record)?);
            continue;
        }
        if let TrackRecord::Signal(signal) = record {
            let position = context
                .convert_base_to_genome(signal.interval.start)
                .map(|(chr, base)| format!("{}:{}", chr, base + 1))
                .unwrap_or_default();
            println!(
                "{}\t{}\t{}\t{}",
                signal.interval.start, signal.interval.end, signal.value, position
            );
        }
    }

    Ok(())
}

/// Navigation context over the chromosomes listed in the file itself
async fn file_context(source: &BigWigSource) -> Result<Arc<NavigationContext>> {
    let file = source.connect().await?;
    let chromosomes = file
        .chromosomes()
        .iter()
        .map(|chrom| Chromosome::new(chrom.name.clone(), chrom.length as u64))
        .collect();
    let context = Genome::new(source.location(), chromosomes).make_nav_context(None)?;
    Ok(context)
}
