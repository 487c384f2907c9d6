//! Per-worker raster cache for the map and elevation components.
//!
//! Each cached raster is built once at its nominal size. Other sizes are produced by resizing
//! the nominal raster, never by rebuilding it, and the last resized copy is memoised so a warm
//! cache renders identical pixels every time.

use image::RgbaImage;
use image::imageops::{FilterType, resize};

use crate::tiles::mercator::MapProjection;

/// A raster at a nominal size with a memoised resized copy.
#[derive(Clone, Debug)]
pub struct CachedRaster {
    nominal: RgbaImage,
    resized: Option<RgbaImage>,
    resize_count: u64,
}

impl CachedRaster {
    pub fn new(nominal: RgbaImage) -> Self {
        Self {
            nominal,
            resized: None,
            resize_count: 0,
        }
    }

    pub fn nominal_size(&self) -> (u32, u32) {
        self.nominal.dimensions()
    }

    /// Raster at `width x height`, Lanczos-resized from the nominal raster when needed.
    pub fn at_size(&mut self, width: u32, height: u32) -> &RgbaImage {
        if self.nominal.dimensions() == (width, height) {
            return &self.nominal;
        }
        let stale = self
            .resized
            .as_ref()
            .is_none_or(|r| r.dimensions() != (width, height));
        if stale {
            self.resized = Some(resize(&self.nominal, width, height, FilterType::Lanczos3));
            self.resize_count += 1;
        }
        self.resized.as_ref().unwrap_or(&self.nominal)
    }

    /// Number of resizes performed so far.
    pub fn resize_count(&self) -> u64 {
        self.resize_count
    }
}

/// Copy of `img` with alpha scaled by `opacity`.
pub fn with_opacity(img: &RgbaImage, opacity: f64) -> RgbaImage {
    let mut out = img.clone();
    if opacity >= 1.0 {
        return out;
    }
    let k = opacity.clamp(0.0, 1.0);
    for px in out.pixels_mut() {
        px.0[3] = (f64::from(px.0[3]) * k) as u8;
    }
    out
}

/// Map background with the full track drawn on it.
#[derive(Clone, Debug)]
pub struct MapAsset {
    pub raster: CachedRaster,
    pub projection: MapProjection,
}

/// Filled elevation polygon and the extents it was drawn with.
#[derive(Clone, Debug)]
pub struct ElevationAsset {
    pub raster: CachedRaster,
    pub min_distance: f64,
    pub max_distance: f64,
}

/// Lazily built cache slot.
#[derive(Clone, Debug, Default)]
pub enum CacheSlot<T> {
    #[default]
    Empty,
    Ready(T),
    /// Construction failed or had nothing to draw; never retried for this track.
    Unavailable,
}

impl<T> CacheSlot<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Cache owned by exactly one worker and passed into its compositor by reference.
#[derive(Debug, Default)]
pub struct AssetCache {
    pub map: CacheSlot<MapAsset>,
    pub elevation: CacheSlot<ElevationAsset>,
    builds: u64,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many cached rasters were constructed (not resized).
    pub fn builds(&self) -> u64 {
        self.builds
    }

    pub(crate) fn note_build(&mut self) {
        self.builds += 1;
    }

    /// Drop everything, e.g. before rendering a different track.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cache.rs"]
mod tests;
