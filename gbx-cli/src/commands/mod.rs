//! Command implementations for the GBX CLI

pub mod expand;
pub mod fetch;
pub mod info;
pub mod parse;
pub mod view;

use anyhow::{Context, Result};
use gbx_core::{DisplayedRegionModel, NavigationContext};
use std::sync::Arc;

/// Resolve a locator against `context`, naming the context in the error
pub(crate) fn resolve_region(context: &Arc<NavigationContext>, locus: &str) -> Result<DisplayedRegionModel> {
    context
        .parse(locus)
        .with_context(|| format!("Cannot show '{}' in '{}'", locus, context.name()))
}
