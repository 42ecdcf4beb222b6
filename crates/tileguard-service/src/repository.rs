//! Pattern repository: loads the active pattern set from a directory.
//!
//! On-disk contract, one pattern per PNG:
//! - file name `<name>.<Tx>.<Ty>.<x>.<y>.png` — anchor tile `(Tx, Ty)`,
//!   offset `(x, y)` inside that tile
//! - optional metadata sidecar `<name>.<Tx>.<Ty>.<x>.<y>.json`
//!
//! Individual bad entries (malformed names, undecodable images, invalid
//! placements) are logged and skipped; only an unreadable directory fails the
//! refresh, in which case the caller keeps its previous snapshot.

use std::path::{Path, PathBuf};
use tileguard_core::{Metadata, Pattern, PatternSet, PixelPos, Placement, TileCoord, TileGrid};
use tracing::{debug, warn};

/// Source of pattern snapshots, re-read on the directory refresh timer.
pub trait PatternRepository {
    /// Build a fresh pattern set
    ///
    /// # Errors
    /// Fails only when the whole source is unavailable; that failure is fatal
    /// to the refresh, not to the watcher.
    fn refresh(&self) -> Result<PatternSet, RepositoryError>;
}

/// Repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Pattern directory could not be listed
    #[error("unable to read pattern directory {path}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory-backed repository.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    directory: PathBuf,
    grid: TileGrid,
}

impl DirectoryRepository {
    /// Create a repository over `directory`
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, grid: TileGrid) -> Self {
        Self {
            directory: directory.into(),
            grid,
        }
    }

    fn load_pattern(&self, file_name: &str) -> Option<Pattern> {
        let (name, placement) = match parse_file_name(file_name) {
            Some(parsed) => parsed,
            None => {
                warn!(file = file_name, "malformed pattern file name, skipping");
                return None;
            }
        };

        let path = self.directory.join(file_name);
        let image = match image::open(&path) {
            Ok(image) => image.to_rgba8(),
            Err(err) => {
                warn!(file = file_name, error = %err, "unable to decode pattern image, skipping");
                return None;
            }
        };

        let metadata = load_sidecar(&path);
        match Pattern::new(&self.grid, name, image, placement, metadata) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                warn!(file = file_name, error = %err, "invalid pattern, skipping");
                None
            }
        }
    }
}

impl PatternRepository for DirectoryRepository {
    fn refresh(&self) -> Result<PatternSet, RepositoryError> {
        let entries =
            std::fs::read_dir(&self.directory).map_err(|source| RepositoryError::ReadDirectory {
                path: self.directory.clone(),
                source,
            })?;

        let mut set = PatternSet::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !file_name.ends_with(".png") {
                continue;
            }
            if let Some(pattern) = self.load_pattern(file_name) {
                debug!(pattern = %pattern.id(), "loaded pattern");
                set.insert(pattern);
            }
        }
        Ok(set)
    }
}

/// Parse `<name>.<Tx>.<Ty>.<x>.<y>.png` into a name and placement.
fn parse_file_name(file_name: &str) -> Option<(String, Placement)> {
    let fields: Vec<&str> = file_name.split('.').collect();
    if fields.len() != 6 || fields[5] != "png" {
        return None;
    }
    let tx: i64 = fields[1].parse().ok()?;
    let ty: i64 = fields[2].parse().ok()?;
    let x: u32 = fields[3].parse().ok()?;
    let y: u32 = fields[4].parse().ok()?;
    Some((
        fields[0].to_string(),
        Placement::new(TileCoord::new(tx, ty), PixelPos::new(x, y)),
    ))
}

/// Read the metadata sidecar next to `png_path`, tolerating its absence.
fn load_sidecar(png_path: &Path) -> Metadata {
    let json_path = png_path.with_extension("json");
    let raw = match std::fs::read_to_string(&json_path) {
        Ok(raw) => raw,
        Err(_) => return Metadata::default(),
    };
    match serde_json::from_str(&raw) {
        Ok(metadata) => metadata,
        Err(err) => {
            warn!(file = %json_path.display(), error = %err, "invalid metadata sidecar, ignoring");
            Metadata::default()
        }
    }
}
