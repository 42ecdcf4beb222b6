//! Pixel reconciliation engine.
//!
//! Compares every opaque pattern pixel against the fetched canvas, one direct
//! per-pixel lookup at a time. No tile-sized expectation mask is built; the
//! cost is `O(sum of pattern pixel areas)` regardless of tile size.
//!
//! A tile absent from the fetch result means "could not check", never
//! "matches" and never "defaced": affected pixels land in
//! [`PatternReport::unverified`] and leave the error count alone.

use crate::geometry::{TileCoord, TileGrid};
use crate::pattern::{PatternId, PatternSet};
use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// The cycle's static snapshot of fetched tiles. A missing key models a fetch
/// failure; a present tile of fully transparent pixels is a real observation.
pub type FetchedTiles = HashMap<TileCoord, RgbaImage>;

/// Per-pattern outcome of one comparison pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternReport {
    /// Opaque pixels whose observed RGBA differs from the expected RGBA
    pub errors: u32,
    /// Opaque pixels that could not be checked (missing or short tile)
    pub unverified: u32,
}

impl PatternReport {
    /// Whether every opaque pixel was actually observed this cycle
    #[inline]
    #[must_use]
    pub fn fully_verified(&self) -> bool {
        self.unverified == 0
    }
}

/// Compare every pattern against the fetched tiles.
///
/// Every pattern in the set gets an entry, zero counts included, so the
/// tracker can observe a transition back to zero. Expected alpha 0 excludes a
/// pixel entirely; otherwise all four channels must match, alpha included.
#[must_use]
pub fn compare(
    grid: &TileGrid,
    patterns: &PatternSet,
    tiles: &FetchedTiles,
) -> HashMap<PatternId, PatternReport> {
    let mut reports = HashMap::with_capacity(patterns.len());
    let mut missing: HashSet<TileCoord> = HashSet::new();

    for pattern in patterns.iter() {
        let placement = pattern.placement();
        let mut report = PatternReport::default();

        for (x, y, expected) in pattern.image().enumerate_pixels() {
            if expected.0[3] == 0 {
                continue;
            }
            let global = grid.global_pixel(placement, x, y);
            match tiles.get(&global.tile) {
                None => {
                    report.unverified += 1;
                    if missing.insert(global.tile) {
                        warn!(tile = %global.tile, "missing tile, pixels left unverified");
                    }
                }
                Some(tile) => match tile.get_pixel_checked(global.pos.x, global.pos.y) {
                    // fetched tile smaller than the grid says it should be
                    None => report.unverified += 1,
                    Some(observed) if observed != expected => report.errors += 1,
                    Some(_) => {}
                },
            }
        }

        reports.insert(pattern.id(), report);
    }

    reports
}
