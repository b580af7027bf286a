use std::sync::Arc;

use gbx_core::bbi::ZoomHeader;
use gbx_core::source::select_zoom_level;
use gbx_core::{
    ChromosomeInterval, DisplayedRegionModel, HighlightItem, HighlightSet, LinearDrawingModel,
    NavigationContext, OpenInterval, RegionExpander, Segment,
};
use proptest::prelude::*;

fn padded_context(before: u64, gap: u64) -> Arc<NavigationContext> {
    let mut segments = Vec::new();
    if before > 0 {
        segments.push(Segment::chromosome("chrA", before));
    }
    if gap > 0 {
        segments.push(Segment::gap(gap));
    }
    segments.push(Segment::chromosome("chrB", 10_000));
    Arc::new(NavigationContext::new("padded", segments).unwrap())
}

fn zoom_levels() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::btree_set(1u32..1_000_000, 0..8).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn pixel_span_does_not_depend_on_preceding_segments(
        before in 0u64..50_000,
        gap in 0u64..5_000,
        start in 0u64..9_000,
        len in 1u64..1_000,
        view_len in 1_000u64..10_000,
        width in 10.0f64..4_000.0,
    ) {
        let query = ChromosomeInterval::new("chrB", start, start + len);
        let view = ChromosomeInterval::new("chrB", 0, view_len);

        let x_span = |ctx: &Arc<NavigationContext>| {
            let bases = ctx.convert_genome_interval_to_bases(&query);
            let view_bases = ctx.convert_genome_interval_to_bases(&view)[0];
            let model = LinearDrawingModel::new(view_bases, width).unwrap();
            bases.iter().map(|b| model.base_span_to_x_span(b).len()).sum::<f64>()
        };

        let bare = x_span(&padded_context(0, 0));
        let padded = x_span(&padded_context(before, gap));
        prop_assert!((bare - padded).abs() < 1e-6 * width.max(1.0), "{} vs {}", bare, padded);
    }

    #[test]
    fn expansion_is_deterministic_and_contains_the_view(
        start in 0u64..9_000,
        len in 1u64..1_000,
        factor in 0.0f64..3.0,
        width in 1.0f64..3_000.0,
    ) {
        let ctx = padded_context(5_000, 100);
        let region = DisplayedRegionModel::with_interval(
            Arc::clone(&ctx),
            OpenInterval { start: 5_100 + start, end: 5_100 + start + len },
        )
        .unwrap();
        let expander = RegionExpander::new(factor);

        let a = expander.calculate_expansion(width, &region);
        let b = expander.calculate_expansion(width, &region);
        prop_assert_eq!(a.expanded_width.to_bits(), b.expanded_width.to_bits());
        prop_assert_eq!(a.view_window.start.to_bits(), b.view_window.start.to_bits());
        prop_assert_eq!(a.expanded_region.context_coordinates(), b.expanded_region.context_coordinates());

        let expanded = a.expanded_region.context_coordinates();
        prop_assert!(expanded.contains_interval(&region.context_coordinates()));
        prop_assert!(expanded.end <= ctx.total_length());
        prop_assert!(a.view_window.start >= 0.0);
        prop_assert!(a.view_window.end <= a.expanded_width + 1e-6);
    }

    #[test]
    fn zoom_level_is_coarsest_below_bases_per_pixel(
        reductions in zoom_levels(),
        bases_per_pixel in 0.1f64..2_000_000.0,
    ) {
        let levels: Vec<ZoomHeader> = reductions
            .iter()
            .map(|&reduction_level| ZoomHeader { reduction_level, data_offset: 0, index_offset: 0 })
            .collect();

        match select_zoom_level(&levels, bases_per_pixel) {
            None => prop_assert!(reductions.iter().all(|&r| r as f64 >= bases_per_pixel)),
            Some(index) => {
                let chosen = levels[index].reduction_level;
                prop_assert!((chosen as f64) < bases_per_pixel);
                prop_assert!(reductions
                    .iter()
                    .all(|&r| r as f64 >= bases_per_pixel || r <= chosen));
            }
        }
    }

    #[test]
    fn inserting_a_duplicate_highlight_changes_nothing(
        start in 0u64..10_000,
        len in 1u64..500,
        color in "#[0-9a-f]{6}",
        name in "[a-z]{1,8}",
    ) {
        let region = ChromosomeInterval::new("chr1", start, start + len);
        let once = HighlightSet::new().with_item(HighlightItem::new(color.clone(), region.clone()));
        let twice = once.with_item(HighlightItem::new(color, region).named(name));
        prop_assert_eq!(once, twice);
    }
}
