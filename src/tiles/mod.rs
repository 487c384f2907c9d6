//! Map background acquisition.
//!
//! Tile failures stay inside this module as [`TileError`]; callers degrade the map component
//! instead of failing the job.

pub(crate) mod http;
pub(crate) mod mercator;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::telemetry::track::GeoBounds;
use crate::tiles::mercator::{MapProjection, TILE_SIZE, fit_zoom};

/// Nominal tile zoom for the map background.
pub const DEFAULT_ZOOM: u8 = 15;
/// Default tile budget per map background.
pub const DEFAULT_MAX_TILES: usize = 16;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TileError {
    #[error("tile request failed: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("tile decode failed: {0}")]
    Decode(String),

    #[error("{count} tiles needed, provider allows {max}")]
    TooManyTiles { count: usize, max: usize },

    #[error("coordinate out of range: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("zoom {0} not supported")]
    InvalidZoom(u8),

    #[error("map tiles disabled")]
    Disabled,
}

/// Source of 256x256 map tiles.
pub trait TileProvider: Send + Sync {
    /// Fetch tile `(x, y)` at `zoom` as straight-alpha RGBA.
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage, TileError>;

    fn name(&self) -> &str;

    /// Largest number of tiles one background may use.
    fn max_tiles(&self) -> usize {
        DEFAULT_MAX_TILES
    }
}

/// Stitched tile image plus the projection into it.
#[derive(Clone, Debug)]
pub struct MapRaster {
    pub image: RgbaImage,
    pub projection: MapProjection,
}

/// Fetch and stitch the tiles covering `bounds`, lowering the zoom to fit the provider budget.
pub fn fetch_map(
    provider: &dyn TileProvider,
    bounds: &GeoBounds,
    zoom: u8,
) -> Result<MapRaster, TileError> {
    let range = fit_zoom(bounds, zoom, provider.max_tiles())?;
    let projection = MapProjection::for_range(&range);
    debug!(
        provider = provider.name(),
        zoom = range.zoom,
        tiles = range.count(),
        "fetching map background"
    );

    let mut image = RgbaImage::new(projection.width, projection.height);
    for ty in range.y_min..=range.y_max {
        for tx in range.x_min..=range.x_max {
            let tile = provider.fetch_tile(range.zoom, tx, ty)?;
            let tile = if tile.dimensions() == (TILE_SIZE, TILE_SIZE) {
                tile
            } else {
                image::imageops::resize(
                    &tile,
                    TILE_SIZE,
                    TILE_SIZE,
                    image::imageops::FilterType::Triangle,
                )
            };
            image::imageops::replace(
                &mut image,
                &tile,
                i64::from((tx - range.x_min) * TILE_SIZE),
                i64::from((ty - range.y_min) * TILE_SIZE),
            );
        }
    }
    Ok(MapRaster { image, projection })
}

/// Provider returning one flat colour for every tile.
#[derive(Clone, Debug)]
pub struct SolidTileProvider {
    pub color: [u8; 4],
}

impl TileProvider for SolidTileProvider {
    fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<RgbaImage, TileError> {
        Ok(RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba(self.color)))
    }

    fn name(&self) -> &str {
        "solid"
    }
}

/// Provider that never returns tiles; the map component stays disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTiles;

impl TileProvider for NoTiles {
    fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<RgbaImage, TileError> {
        Err(TileError::Disabled)
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/stitch.rs"]
mod tests;
