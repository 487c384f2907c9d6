//! Web Mercator math for slippy-map tiles.

use std::f64::consts::PI;

use crate::telemetry::sample::GeoPoint;
use crate::telemetry::track::GeoBounds;
use crate::tiles::TileError;

/// Edge length of one map tile in pixels.
pub const TILE_SIZE: u32 = 256;
/// Latitude limit of the Web Mercator projection.
pub const MAX_LAT: f64 = 85.051_128_78;
pub const MAX_ZOOM: u8 = 19;

/// Global pixel position of `(lat, lon)` at `zoom` (tile grid origin at the north-west corner).
pub fn world_pixel(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(i32::from(zoom)) * f64::from(TILE_SIZE);
    let lat = lat.clamp(-MAX_LAT, MAX_LAT);
    let x = (lon + 180.0) / 360.0 * n;
    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;
    (x, y)
}

/// Inclusive tile index rectangle at one zoom level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// Tiles covering `bounds` at `zoom`.
    pub fn covering(bounds: &GeoBounds, zoom: u8) -> Result<Self, TileError> {
        for (lat, lon) in [
            (bounds.min_lat, bounds.min_lon),
            (bounds.max_lat, bounds.max_lon),
        ] {
            if !lat.is_finite() || !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
                return Err(TileError::InvalidCoordinate { lat, lon });
            }
        }
        if zoom > MAX_ZOOM {
            return Err(TileError::InvalidZoom(zoom));
        }
        let last = (1u32 << zoom) - 1;
        let tile = |v: f64| ((v / f64::from(TILE_SIZE)).floor().max(0.0) as u32).min(last);
        let (x0, y0) = world_pixel(bounds.max_lat, bounds.min_lon, zoom);
        let (x1, y1) = world_pixel(bounds.min_lat, bounds.max_lon, zoom);
        Ok(Self {
            zoom,
            x_min: tile(x0),
            x_max: tile(x1),
            y_min: tile(y0),
            y_max: tile(y1),
        })
    }

    pub fn columns(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    pub fn rows(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    pub fn count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }
}

/// Highest zoom `<= preferred` whose covering tile count stays within `max_tiles`.
pub fn fit_zoom(bounds: &GeoBounds, preferred: u8, max_tiles: usize) -> Result<TileRange, TileError> {
    let mut zoom = preferred.min(MAX_ZOOM);
    loop {
        let range = TileRange::covering(bounds, zoom)?;
        if range.count() <= max_tiles.max(1) {
            return Ok(range);
        }
        if zoom == 0 {
            return Err(TileError::TooManyTiles {
                count: range.count(),
                max: max_tiles,
            });
        }
        zoom -= 1;
    }
}

/// Projection from geographic coordinates into a stitched tile image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapProjection {
    pub zoom: u8,
    /// World pixel of the stitched image's top-left corner.
    pub origin: (f64, f64),
    pub width: u32,
    pub height: u32,
}

impl MapProjection {
    pub fn for_range(range: &TileRange) -> Self {
        Self {
            zoom: range.zoom,
            origin: (
                f64::from(range.x_min * TILE_SIZE),
                f64::from(range.y_min * TILE_SIZE),
            ),
            width: range.columns() * TILE_SIZE,
            height: range.rows() * TILE_SIZE,
        }
    }

    /// Pixel position of `p` inside the stitched image.
    pub fn to_pixels(&self, p: GeoPoint) -> (f64, f64) {
        let (x, y) = world_pixel(p.lat, p.lon, self.zoom);
        (x - self.origin.0, y - self.origin.1)
    }

    /// Like [`MapProjection::to_pixels`], rescaled into a `width x height` copy of the image.
    pub fn to_scaled_pixels(&self, p: GeoPoint, width: u32, height: u32) -> (f64, f64) {
        let (x, y) = self.to_pixels(p);
        (
            x * f64::from(width) / f64::from(self.width),
            y * f64::from(height) / f64::from(self.height),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/mercator.rs"]
mod tests;
