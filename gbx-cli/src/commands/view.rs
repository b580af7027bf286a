//! View command - load every configured track and place highlights

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use gbx_core::{
    reconcile, DisplayedRegionModel, FetchOutcome, TrackController, TrackType, ViewExpansion,
};

use super::resolve_region;
use crate::config::Config;

pub async fn execute(
    config: &Config,
    locus: Option<String>,
    pan: Option<i64>,
    zoom: Option<f64>,
    width: Option<f64>,
) -> Result<()> {
    let context = config.genome.navigation_context()?;
    let locus = locus
        .or_else(|| config.view.region.clone())
        .ok_or_else(|| anyhow!("No locus given and no [view].region configured"))?;
    let width = width.unwrap_or(config.view.width);

    let mut region = resolve_region(&context, &locus)?;
    if let Some(delta) = pan {
        region = region.pan(delta);
    }
    if let Some(factor) = zoom {
        region = region.zoom(factor, 0.5)?;
    }

    let options = config.view.source_options();
    let tracks = config
        .tracks
        .iter()
        .map(|model| {
            TrackController::from_model(model.clone(), &options, config.view.expander())
                .with_context(|| format!("Invalid track '{}'", model.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let expansion = view_expansion(config, &tracks, width, &region);
    println!("View {} at {} px, loading {}", region, width, expansion.expanded_region);

    let outcomes = join_all(tracks.iter().map(|track| track.fetch(width, &region))).await;
    for (track, outcome) in tracks.iter().zip(outcomes) {
        let state = track.state();
        let model = track.model();
        let kind = model.track_type.to_string();
        match (&state.error, outcome) {
            (Some(error), FetchOutcome::Applied) => {
                println!("  {:<8} {:<20} error: {}", kind, model.name, error);
            }
            (None, FetchOutcome::Applied) => {
                let summary = match model.track_type {
                    TrackType::Ruler => {
                        let major = state.data.iter().filter_map(|r| r.as_tick()).filter(|t| t.major).count();
                        format!("{} ticks ({} major)", state.data.len(), major)
                    }
                    TrackType::BigWig => {
                        let values: Vec<f64> = state.data.iter().filter_map(|r| r.as_signal()).map(|s| s.value).collect();
                        let max = values.iter().copied().fold(f64::NAN, f64::max);
                        format!("{} records, max {:.4}", values.len(), max)
                    }
                };
                println!("  {:<8} {:<20} {}", kind, model.name, summary);
            }
            (_, other) => println!("  {:<8} {:<20} {:?}", kind, model.name, other),
        }
        track.clean_up();
    }

    let highlights = reconcile(&config.highlight_set(), &expansion, config.view.legend_width);
    for item in highlights.visible() {
        if let Some(x) = item.highlight_interval {
            println!(
                "  highlight {:<20} {} x [{:.1}, {:.1}) {}",
                item.name, item.view_region, x.start, x.end, item.color
            );
        }
    }
    log::info!(
        "{} of {} highlights visible",
        highlights.visible().count(),
        highlights.len()
    );

    Ok(())
}

/// Expansion the tracks fetch with, taken from the first track's cache
fn view_expansion(
    config: &Config,
    tracks: &[TrackController],
    width: f64,
    region: &DisplayedRegionModel,
) -> ViewExpansion {
    match tracks.first() {
        Some(track) => track.expansion_for(width, region),
        None => config.view.expander().calculate_expansion(width, region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbx_core::{Chromosome, OpenInterval};

    fn mini_config() -> Config {
        let mut config = Config::default();
        config.genome.chromosomes = vec![Chromosome::new("chr1", 1000), Chromosome::new("chr2", 500)];
        config.view.expansion_factor = 2.0;
        config
    }

    #[tokio::test]
    async fn test_highlights_use_the_tracks_expansion() -> Result<()> {
        let config = mini_config();
        let context = config.genome.navigation_context()?;
        let region = resolve_region(&context, "chr2:1-100")?;
        let options = config.view.source_options();
        let tracks = vec![TrackController::from_model(
            config.tracks[0].clone(),
            &options,
            config.view.expander(),
        )?];

        assert_eq!(tracks[0].fetch(100.0, &region).await, FetchOutcome::Applied);
        let expansion = view_expansion(&config, &tracks, 100.0, &region);
        assert_eq!(tracks[0].state().expansion, Some(expansion.clone()));
        assert_eq!(
            expansion.expanded_region.context_coordinates(),
            OpenInterval { start: 800, end: 1300 }
        );
        Ok(())
    }

    #[test]
    fn test_no_tracks_falls_back_to_configured_expander() -> Result<()> {
        let config = mini_config();
        let context = config.genome.navigation_context()?;
        let region = resolve_region(&context, "chr2:1-100")?;
        let expansion = view_expansion(&config, &[], 100.0, &region);
        assert_eq!(expansion.expanded_width, 500.0);
        Ok(())
    }
}
