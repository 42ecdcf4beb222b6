//! Tile-grid coordinate model.
//!
//! Pure coordinate math, no side effects:
//! - resolve a pattern-local pixel to its global tile and position in that tile
//! - compute the inclusive rectangle of tiles a pattern's bounding box overlaps

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};

/// Identifies one fixed-size square tile in the infinite integer grid.
///
/// Structural equality; used as a map key throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
}

impl TileCoord {
    /// Create a tile coordinate
    #[inline]
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A pixel position inside a single tile, each component in `[0, tile_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: u32,
    pub y: u32,
}

impl PixelPos {
    /// Create a pixel position
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Where a pattern's local origin sits: its anchor tile and the pixel offset
/// of the origin within that tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub tile: TileCoord,
    pub offset: PixelPos,
}

impl Placement {
    /// Create a placement
    #[inline]
    #[must_use]
    pub const fn new(tile: TileCoord, offset: PixelPos) -> Self {
        Self { tile, offset }
    }
}

/// A pattern-local pixel resolved to its global location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalPixel {
    /// The tile the pixel lands in
    pub tile: TileCoord,
    /// The pixel's position within that tile
    pub pos: PixelPos,
}

/// Inclusive rectangular range of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileSpan {
    /// Whether `tile` lies inside the span
    #[inline]
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x >= self.min.x && tile.x <= self.max.x && tile.y >= self.min.y && tile.y <= self.max.y
    }

    /// Number of tiles covered by the span
    #[inline]
    #[must_use]
    pub fn tile_count(&self) -> u64 {
        let w = (self.max.x - self.min.x + 1) as u64;
        let h = (self.max.y - self.min.y + 1) as u64;
        w * h
    }

    /// Iterate every tile coordinate in the span, row-major
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let span = *self;
        (span.min.y..=span.max.y)
            .flat_map(move |y| (span.min.x..=span.max.x).map(move |x| TileCoord::new(x, y)))
    }
}

/// Grid geometry. All coordinate math goes through here so the tile side
/// length is stated exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    tile_size: u32,
}

impl TileGrid {
    /// The canvas's production grid: 1000x1000 pixel tiles.
    pub const STANDARD: TileGrid = TileGrid { tile_size: 1000 };

    /// Create a grid with the given tile side length
    ///
    /// # Errors
    /// Returns [`GeometryError::ZeroTileSize`] for a zero side length; that is
    /// a fatal configuration error, not something to recover from at runtime.
    pub fn new(tile_size: u32) -> Result<Self, GeometryError> {
        if tile_size == 0 {
            return Err(GeometryError::ZeroTileSize);
        }
        Ok(Self { tile_size })
    }

    /// Tile side length in pixels
    #[inline]
    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Resolve a pattern-local pixel to its global tile and in-tile position.
    ///
    /// For local coordinate `(x, y)` the pixel lies in tile
    /// `(anchor.x + (offset.x + x) div T, anchor.y + (offset.y + y) div T)`
    /// at `((offset.x + x) mod T, (offset.y + y) mod T)`.
    #[must_use]
    pub fn global_pixel(&self, placement: Placement, local_x: u32, local_y: u32) -> GlobalPixel {
        let t = i64::from(self.tile_size);
        let gx = i64::from(placement.offset.x) + i64::from(local_x);
        let gy = i64::from(placement.offset.y) + i64::from(local_y);
        GlobalPixel {
            tile: TileCoord::new(placement.tile.x + gx / t, placement.tile.y + gy / t),
            pos: PixelPos::new((gx % t) as u32, (gy % t) as u32),
        }
    }

    /// The inclusive range of tiles a `width` x `height` bounding box at
    /// `placement` overlaps. A tile is included on even a one-pixel overlap.
    ///
    /// Callers guarantee a non-empty image; zero-area patterns are rejected at
    /// construction.
    #[must_use]
    pub fn tile_span(&self, placement: Placement, width: u32, height: u32) -> TileSpan {
        debug_assert!(width > 0 && height > 0, "zero-area bounding box");
        let t = i64::from(self.tile_size);
        let max_x = placement.tile.x + (i64::from(placement.offset.x) + i64::from(width) - 1) / t;
        let max_y = placement.tile.y + (i64::from(placement.offset.y) + i64::from(height) - 1) / t;
        TileSpan {
            min: placement.tile,
            max: TileCoord::new(max_x, max_y),
        }
    }
}
