//! Saved highlight regions and their placement in the current view

use serde::{Deserialize, Serialize};

use crate::drawing::LinearDrawingModel;
use crate::expander::ViewExpansion;
use crate::interval::{ChromosomeInterval, OpenInterval, PixelInterval};

pub const DEFAULT_HIGHLIGHT_NAME: &str = "New Highlight";

fn default_active() -> bool {
    true
}

/// A user-marked genome interval drawn as a coloured box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightItem {
    pub color: String,
    #[serde(default)]
    pub name: String,
    pub view_region: ChromosomeInterval,
    /// Pixel placement in the visible viewport, recomputed per view
    #[serde(default)]
    pub highlight_interval: Option<PixelInterval>,
    #[serde(default)]
    pub in_view_region: bool,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl HighlightItem {
    pub fn new<C: Into<String>>(color: C, view_region: ChromosomeInterval) -> Self {
        Self {
            color: color.into(),
            name: DEFAULT_HIGHLIGHT_NAME.to_string(),
            view_region,
            highlight_interval: None,
            in_view_region: false,
            active: true,
        }
    }

    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    fn same_highlight(&self, other: &HighlightItem) -> bool {
        self.color == other.color
            && self.view_region.start == other.view_region.start
            && self.view_region.end == other.view_region.end
    }
}

/// Ordered, immutable collection of highlights.
///
/// Every change returns a new set; the receiver is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightSet {
    items: Vec<HighlightItem>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` unless an item with the same colour, start and end exists
    pub fn with_item(&self, item: HighlightItem) -> HighlightSet {
        if self.items.iter().any(|existing| existing.same_highlight(&item)) {
            log::debug!("Highlight {} ({}) already present", item.view_region, item.color);
            return self.clone();
        }
        let mut items = self.items.clone();
        items.push(item);
        HighlightSet { items }
    }

    /// Remove the item at `index`; out-of-range indices change nothing
    pub fn without(&self, index: usize) -> HighlightSet {
        let mut items = self.items.clone();
        if index < items.len() {
            items.remove(index);
        }
        HighlightSet { items }
    }

    pub fn with_active(&self, index: usize, active: bool) -> HighlightSet {
        let mut items = self.items.clone();
        if let Some(item) = items.get_mut(index) {
            item.active = active;
        }
        HighlightSet { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HighlightItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HighlightItem> {
        self.items.iter()
    }

    /// Active items that fall inside the current view
    pub fn visible(&self) -> impl Iterator<Item = &HighlightItem> {
        self.items.iter().filter(|item| item.active && item.in_view_region)
    }
}

impl<'a> IntoIterator for &'a HighlightSet {
    type Item = &'a HighlightItem;
    type IntoIter = std::slice::Iter<'a, HighlightItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<HighlightItem> for HighlightSet {
    fn from_iter<T: IntoIterator<Item = HighlightItem>>(iter: T) -> Self {
        iter.into_iter().fold(HighlightSet::new(), |set, item| set.with_item(item))
    }
}

/// Pixel interval of `item_region` within the visible viewport.
///
/// The item's outer bounds in linear coordinates must lie inside the
/// visible view region. They are drawn over the expanded drawing and shifted
/// so the visible window starts right after the legend.
/// `None` when the item is not in the view or nothing of it is left.
pub fn highlight_interval(
    item_region: &ChromosomeInterval,
    expansion: &ViewExpansion,
    legend_width: f64,
) -> Option<PixelInterval> {
    let expanded = &expansion.expanded_region;
    let bases = OpenInterval::span_of(
        expanded
            .navigation_context()
            .convert_genome_interval_to_bases(item_region),
    )?;

    if !expansion.view_region.context_coordinates().contains_interval(&bases) {
        return None;
    }

    let model = LinearDrawingModel::for_region(expanded, expansion.expanded_width).ok()?;
    let xs = model
        .base_span_to_x_span(&bases)
        .shift(legend_width - expansion.view_window.start);

    let start = xs.start.max(legend_width);
    if xs.end <= start {
        return None;
    }
    Some(PixelInterval::new(start, xs.end))
}

/// Recompute placement for every item against a new view
pub fn reconcile(set: &HighlightSet, expansion: &ViewExpansion, legend_width: f64) -> HighlightSet {
    let items = set
        .iter()
        .map(|item| {
            let placed = highlight_interval(&item.view_region, expansion, legend_width);
            HighlightItem {
                in_view_region: placed.is_some(),
                highlight_interval: placed,
                ..item.clone()
            }
        })
        .collect();
    HighlightSet { items }
}
