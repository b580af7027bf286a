//! Parse command - resolve a locator and show where it lands

use anyhow::Result;
use gbx_core::LinearDrawingModel;

use super::resolve_region;
use crate::config::Config;

pub fn execute(config: &Config, locus: &str, width: Option<f64>) -> Result<()> {
    let context = config.genome.navigation_context()?;
    let region = resolve_region(&context, locus)?;
    let width = width.unwrap_or(config.view.width);

    let bases = region.context_coordinates();
    println!("Region:      {}", region);
    println!("Context:     {} ({} bases)", context.name(), context.total_length());
    println!("Bases:       [{}, {})", bases.start, bases.end);

    for slice in region.feature_segments() {
        match slice.genome_coordinates() {
            Some(locus) => println!("  segment {:<12} {}:{}-{}", slice.name, locus.chr, locus.start + 1, locus.end),
            None => println!("  gap              {} bases", slice.bases.len()),
        }
    }

    let whole = LinearDrawingModel::for_context(&context, width)?;
    let x = whole.base_span_to_x_span(&bases);
    println!("Genome view: x [{:.2}, {:.2}) of {} px", x.start, x.end, width);

    Ok(())
}
