use image::RgbaImage;
use image::imageops::{FilterType, resize};
use kurbo::{Point, Rect};

use crate::foundation::error::HudResult;
use crate::layout::config::ComponentConfig;
use crate::layout::hud::{MAP_FRAME_PX, PixelRect, marker_radius};
use crate::render::backend::FrameRGBA;
use crate::render::cache::{CachedRaster, MapAsset, with_opacity};
use crate::render::canvas::{BLACK, BLUE, VectorLayer, WHITE, YELLOW, polyline};
use crate::telemetry::sample::GeoPoint;
use crate::telemetry::track::{MAP_MIN_PADDING_DEG, MAP_PADDING_FRACTION, TelemetryTrack};
use crate::tiles::{DEFAULT_ZOOM, TileError, TileProvider, fetch_map};

/// Every n-th fix is drawn in the track polyline.
pub const POLYLINE_STEP: usize = 5;
pub const POLYLINE_WIDTH: f64 = 3.0;

/// Fetch the background for the track's padded bounds, shrink it to `nominal` px square and draw
/// the full track on it.
///
/// `Ok(None)` means the track has no position fixes.
pub fn build_map_asset(
    track: &TelemetryTrack,
    tiles: &dyn TileProvider,
    nominal: u32,
) -> Result<Option<MapAsset>, TileError> {
    let Some(bounds) = track.geo_bounds() else {
        return Ok(None);
    };
    let bounds = bounds.padded(MAP_PADDING_FRACTION, MAP_MIN_PADDING_DEG);
    let background = fetch_map(tiles, &bounds, DEFAULT_ZOOM)?;
    let projection = background.projection;
    let nominal = nominal.max(1);
    let base = resize(&background.image, nominal, nominal, FilterType::CatmullRom);

    let points: Vec<Point> = track
        .polyline(POLYLINE_STEP)
        .into_iter()
        .map(|p| {
            let (x, y) = projection.to_scaled_pixels(p, nominal, nominal);
            Point::new(x, y)
        })
        .collect();

    let raster = if points.len() > 1 {
        draw_track(base, &points).map_err(|e| TileError::Decode(e.to_string()))?
    } else {
        base
    };
    Ok(Some(MapAsset {
        raster: CachedRaster::new(raster),
        projection,
    }))
}

fn draw_track(base: RgbaImage, points: &[Point]) -> HudResult<RgbaImage> {
    let (w, h) = base.dimensions();
    let mut layer = VectorLayer::new();
    layer.begin(w, h)?;
    layer.stroke_path(&polyline(points), POLYLINE_WIDTH, BLUE)?;
    let overlay = layer.finish()?;
    let mut frame = FrameRGBA::from_straight(base);
    frame.composite_over(&overlay)?;
    frame.to_straight_image()
}

/// Paste the cached map into `frame` and queue its frame and position marker on `layer`.
pub fn draw_map(
    frame: &mut FrameRGBA,
    layer: &mut VectorLayer,
    asset: &mut MapAsset,
    cfg: &ComponentConfig,
    rect: PixelRect,
    position: Option<GeoPoint>,
    layout_scale: f64,
) -> HudResult<()> {
    let img = with_opacity(asset.raster.at_size(rect.width, rect.height), cfg.opacity);
    frame.paste_straight(&img, rect.x, rect.y);

    let (x, y) = (rect.x as f64, rect.y as f64);
    let (w, h) = (f64::from(rect.width), f64::from(rect.height));
    layer.frame_rect(
        Rect::new(
            x - MAP_FRAME_PX,
            y - MAP_FRAME_PX,
            x + w + MAP_FRAME_PX,
            y + h + MAP_FRAME_PX,
        ),
        MAP_FRAME_PX,
        WHITE,
    )?;

    if let Some(p) = position {
        let (mx, my) = asset
            .projection
            .to_scaled_pixels(p, rect.width, rect.height);
        let center = Point::new(x + mx, y + my);
        let r = marker_radius(cfg, layout_scale);
        layer.fill_circle(center, r + 1.0, BLACK)?;
        layer.fill_circle(center, r, YELLOW)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/map.rs"]
mod tests;
