//! Pattern data model.
//!
//! A pattern is a named, immutable-per-cycle unit of expected artwork: an RGBA
//! image anchored at a pixel offset within a tile. Alpha-zero pixels carry no
//! expectation and are excluded from comparison.

use crate::error::PatternError;
use crate::geometry::{Placement, TileGrid};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Free-form per-pattern info, passed through to notification rendering.
///
/// Recognized keys are typed; everything else rides along in `extra` so
/// webhook templates can use whatever the pattern author put in the sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Per-pattern notification target, overriding the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Unrecognized keys, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Tracker key for a pattern: the same name at a new placement is a new
/// identity, so moving a pattern resets its defacement history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternId {
    pub name: String,
    pub placement: Placement,
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}+({}, {})",
            self.name, self.placement.tile, self.placement.offset.x, self.placement.offset.y
        )
    }
}

/// A named expected image anchored on the tile grid.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    image: RgbaImage,
    placement: Placement,
    metadata: Metadata,
}

impl Pattern {
    /// Validate and create a pattern
    ///
    /// # Errors
    /// Rejects an anchor offset outside `[0, tile_size)` and zero-area
    /// images. A rejected pattern is dropped individually; callers keep
    /// processing the rest of the set.
    pub fn new(
        grid: &TileGrid,
        name: impl Into<String>,
        image: RgbaImage,
        placement: Placement,
        metadata: Metadata,
    ) -> Result<Self, PatternError> {
        let name = name.into();
        if placement.offset.x >= grid.tile_size() || placement.offset.y >= grid.tile_size() {
            return Err(PatternError::OffsetOutOfRange {
                name,
                x: placement.offset.x,
                y: placement.offset.y,
                tile_size: grid.tile_size(),
            });
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(PatternError::EmptyImage { name });
        }
        Ok(Self {
            name,
            image,
            placement,
            metadata,
        })
    }

    /// Pattern name, unique within a set
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected pixels
    #[inline]
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Anchor tile and offset
    #[inline]
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Per-pattern metadata
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Image width in pixels
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The tracker identity: name plus placement
    #[must_use]
    pub fn id(&self) -> PatternId {
        PatternId {
            name: self.name.clone(),
            placement: self.placement,
        }
    }
}

/// One immutable snapshot of the active patterns, keyed by name.
///
/// A refresh builds a whole new set and swaps it in; a set is never mutated
/// while a reconciliation cycle reads it.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: HashMap<String, Pattern>,
}

impl PatternSet {
    /// Create an empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pattern, replacing any previous pattern of the same name
    pub fn insert(&mut self, pattern: Pattern) -> Option<Pattern> {
        self.patterns.insert(pattern.name().to_string(), pattern)
    }

    /// Look up a pattern by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name)
    }

    /// Iterate the patterns in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.values()
    }

    /// The identities currently in the set, for tracker retention
    #[must_use]
    pub fn ids(&self) -> HashSet<PatternId> {
        self.patterns.values().map(Pattern::id).collect()
    }

    /// Number of patterns
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl FromIterator<Pattern> for PatternSet {
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        let mut set = Self::new();
        for pattern in iter {
            set.insert(pattern);
        }
        set
    }
}
