//! Tile requirement resolver.
//!
//! Decides which tiles the fetch stage must pull this cycle: the union of
//! every pattern's tile span, deduplicated. Callers get a set with no
//! ordering guarantee.

use crate::geometry::{TileCoord, TileGrid};
use crate::pattern::PatternSet;
use std::collections::HashSet;

/// The distinct tiles that must be fetched to verify every pattern in `patterns`.
///
/// A tile shared by several patterns appears once.
#[must_use]
pub fn required_tiles(grid: &TileGrid, patterns: &PatternSet) -> HashSet<TileCoord> {
    let mut tiles = HashSet::new();
    for pattern in patterns.iter() {
        let span = grid.tile_span(pattern.placement(), pattern.width(), pattern.height());
        tiles.extend(span.iter());
    }
    tiles
}
