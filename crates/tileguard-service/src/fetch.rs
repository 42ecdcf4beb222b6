//! Tile fetch collaborator.
//!
//! One HTTP GET per tile coordinate against the configured endpoint template.
//! Every failure mode (transport, status, decode) yields a missing tile for
//! the cycle; a tile that cannot be decoded is never substituted with blank
//! pixels, since that would be indistinguishable from a transparent canvas.

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use tileguard_core::TileCoord;
use tracing::debug;

/// Fetches a single tile's pixel data. Calls are independent; the watcher
/// issues them concurrently and collects all results before comparing.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Fetch the tile at `tile`
    ///
    /// # Errors
    /// Any failure marks the tile missing for this cycle only.
    async fn fetch(&self, tile: TileCoord) -> Result<RgbaImage, FetchError>;
}

/// Per-tile fetch failures, absorbed by the watcher as "could not verify".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Request never produced a response
    #[error("tile request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("tile server returned {status}")]
    Status { status: reqwest::StatusCode },

    /// Response body was not a decodable PNG
    #[error("tile decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Fetcher backed by the remote tile server.
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: reqwest::Client,
    url_template: String,
}

impl HttpTileFetcher {
    /// Create a fetcher; `url_template` contains `{x}` and `{y}` placeholders.
    #[must_use]
    pub fn new(client: reqwest::Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    fn tile_url(&self, tile: TileCoord) -> String {
        self.url_template
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, tile: TileCoord) -> Result<RgbaImage, FetchError> {
        let url = self.tile_url(tile);
        debug!(tile = %tile, url, "fetching tile");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }
        let body = response.bytes().await?;
        let image = image::load_from_memory_with_format(&body, ImageFormat::Png)?;
        Ok(image.to_rgba8())
    }
}
