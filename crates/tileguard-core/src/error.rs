//! Error types for the reconciliation engine.
//!
//! Both errors here are construction-time input malformation: a bad grid is
//! fatal configuration, a bad pattern is rejected individually while the rest
//! of the set continues.

/// Errors constructing a [`crate::TileGrid`].
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// Tile side length must be at least one pixel
    #[error("tile size must be positive")]
    ZeroTileSize,
}

/// Errors constructing a [`crate::Pattern`].
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// Anchor offset outside the anchor tile
    #[error("pattern {name}: anchor offset ({x}, {y}) outside tile of size {tile_size}")]
    OffsetOutOfRange {
        name: String,
        x: u32,
        y: u32,
        tile_size: u32,
    },

    /// Image with zero width or height has no pixels to watch
    #[error("pattern {name}: image has zero area")]
    EmptyImage { name: String },
}
