use kurbo::{Point, Rect};

use crate::foundation::error::HudResult;
use crate::layout::config::ComponentConfig;
use crate::layout::hud::PixelRect;
use crate::render::backend::FrameRGBA;
use crate::render::cache::{CachedRaster, ElevationAsset, with_opacity};
use crate::render::canvas::{VectorLayer, WHITE, YELLOW, polygon};
use crate::telemetry::track::TelemetryTrack;

/// Upper bound on polygon vertices.
pub const PROFILE_POINTS: usize = 500;
pub const PROFILE_FILL: [u8; 4] = [100, 100, 100, 128];
pub const MARKER_WIDTH: f64 = 2.0;

/// Draw the distance/altitude polygon at `width x height`.
///
/// `None` when the track carries no altitude.
pub fn build_elevation_asset(
    track: &TelemetryTrack,
    width: u32,
    height: u32,
) -> HudResult<Option<ElevationAsset>> {
    let profile = track.elevation_profile(PROFILE_POINTS);
    if profile.is_empty() {
        return Ok(None);
    }
    let (mut min_d, mut max_d) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_a, mut max_a) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in track.samples() {
        if let Some(d) = s.distance {
            min_d = min_d.min(d);
            max_d = max_d.max(d);
        }
        if let Some(a) = s.altitude {
            min_a = min_a.min(a);
            max_a = max_a.max(a);
        }
    }
    if !min_d.is_finite() {
        (min_d, max_d) = (0.0, 0.0);
    }

    let (w, h) = (f64::from(width), f64::from(height));
    let sx = if max_d > min_d { w / (max_d - min_d) } else { 0.0 };
    let sy = if max_a > min_a { h / (max_a - min_a) } else { 0.0 };

    let mut points = Vec::with_capacity(profile.len() + 2);
    points.push(Point::new(0.0, h));
    for (d, a) in &profile {
        points.push(Point::new((d - min_d) * sx, h - (a - min_a) * sy));
    }
    let last_x = points[points.len() - 1].x;
    points.push(Point::new(last_x, h));

    let mut layer = VectorLayer::new();
    layer.begin(width, height)?;
    if points.len() > 2 {
        let shape = polygon(&points);
        layer.fill_path(&shape, PROFILE_FILL)?;
        layer.stroke_path(&shape, 1.0, WHITE)?;
    }
    let mut frame = FrameRGBA::transparent(width, height);
    frame.composite_over(&layer.finish()?)?;

    Ok(Some(ElevationAsset {
        raster: CachedRaster::new(frame.to_straight_image()?),
        min_distance: min_d,
        max_distance: max_d,
    }))
}

/// Paste the cached profile and queue the current-distance marker.
pub fn draw_elevation(
    frame: &mut FrameRGBA,
    layer: &mut VectorLayer,
    asset: &mut ElevationAsset,
    cfg: &ComponentConfig,
    rect: PixelRect,
    distance: Option<f64>,
) -> HudResult<()> {
    let img = with_opacity(asset.raster.at_size(rect.width, rect.height), cfg.opacity);
    frame.paste_straight(&img, rect.x, rect.y);

    if let Some(d) = distance.filter(|d| d.is_finite()) {
        let span = asset.max_distance - asset.min_distance;
        let sx = if span > 0.0 {
            f64::from(rect.width) / span
        } else {
            0.0
        };
        let px = rect.x as f64 + (d - asset.min_distance) * sx;
        let half = MARKER_WIDTH / 2.0;
        layer.fill_rect(
            Rect::new(
                px - half,
                rect.y as f64,
                px + half,
                rect.y as f64 + f64::from(rect.height),
            ),
            YELLOW,
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/elevation.rs"]
mod tests;
