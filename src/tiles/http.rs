use std::time::Duration;

use image::RgbaImage;
use tracing::trace;

use crate::tiles::{DEFAULT_MAX_TILES, TileError, TileProvider};

pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

const USER_AGENT: &str = concat!("ridehud/", env!("CARGO_PKG_VERSION"));

/// Slippy-map tile server reached over blocking HTTP.
///
/// `url_template` uses `{z}`, `{x}` and `{y}` placeholders.
#[derive(Clone, Debug)]
pub struct HttpTileProvider {
    client: reqwest::blocking::Client,
    url_template: String,
    max_tiles: usize,
}

impl HttpTileProvider {
    pub fn new(url_template: impl Into<String>) -> Result<Self, TileError> {
        Self::with_timeout(url_template, Duration::from_secs(30))
    }

    pub fn with_timeout(
        url_template: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TileError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TileError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url_template: url_template.into(),
            max_tiles: DEFAULT_MAX_TILES,
        })
    }

    pub fn with_max_tiles(mut self, max_tiles: usize) -> Self {
        self.max_tiles = max_tiles.max(1);
        self
    }

    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

impl TileProvider for HttpTileProvider {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage, TileError> {
        let url = self.tile_url(zoom, x, y);
        trace!(%url, "GET tile");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| TileError::Network(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(TileError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        let bytes = response
            .bytes()
            .map_err(|e| TileError::Network(format!("failed to read response: {e}")))?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| TileError::Decode(format!("{url}: {e}")))?;
        Ok(img.to_rgba8())
    }

    fn name(&self) -> &str {
        &self.url_template
    }

    fn max_tiles(&self) -> usize {
        self.max_tiles
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/http.rs"]
mod tests;
