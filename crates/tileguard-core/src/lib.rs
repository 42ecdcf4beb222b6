//! Core reconciliation engine for watching pixel-art patterns on a tiled canvas.
//!
//! The engine is split into four stateless-to-stateful stages, run once per
//! reconciliation cycle:
//! - [`geometry`] — maps a pattern's local pixels onto the global tile grid
//! - [`resolver`] — computes which tiles must be fetched for the current
//!   pattern set
//! - [`compare`] — counts, per pattern, the opaque pixels whose observed
//!   color disagrees with the expected one
//! - [`tracker`] — folds raw error counts into per-pattern state and decides
//!   when a notification fires
//!
//! Everything here is synchronous and I/O-free. Fetching tiles, loading
//! patterns from disk and delivering notifications live in the service crate.

pub mod compare;
pub mod error;
pub mod geometry;
pub mod pattern;
pub mod resolver;
pub mod tracker;

pub use compare::{compare, FetchedTiles, PatternReport};
pub use error::{GeometryError, PatternError};
pub use geometry::{GlobalPixel, PixelPos, Placement, TileCoord, TileGrid, TileSpan};
pub use pattern::{Metadata, Pattern, PatternId, PatternSet};
pub use resolver::required_tiles;
pub use tracker::{DefacementTracker, NotifyDecision, PatternState};
