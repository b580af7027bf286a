//! Expand command - show the prefetch window around a view region

use anyhow::Result;
use gbx_core::RegionExpander;

use super::resolve_region;
use crate::config::Config;

pub fn execute(config: &Config, locus: &str, width: Option<f64>, factor: Option<f64>) -> Result<()> {
    let context = config.genome.navigation_context()?;
    let region = resolve_region(&context, locus)?;
    let width = width.unwrap_or(config.view.width);
    let expander = factor.map(RegionExpander::new).unwrap_or_else(|| config.view.expander());

    let expansion = expander.calculate_expansion(width, &region);
    let visible = region.context_coordinates();
    let expanded = expansion.expanded_region.context_coordinates();
    let fraction = expansion.view_window_fraction();

    log::debug!("Expanding {} by {} on each side", region, expander.multiple_on_each_side);

    println!("View:           {} [{}, {}) at {} px", region, visible.start, visible.end, width);
    println!("Expanded:       {} [{}, {})", expansion.expanded_region, expanded.start, expanded.end);
    println!("Expanded width: {:.2} px", expansion.expanded_width);
    println!(
        "View window:    [{:.2}, {:.2}) px, [{:.3}, {:.3}) of expanded",
        expansion.view_window.start, expansion.view_window.end, fraction.start, fraction.end
    );

    Ok(())
}
