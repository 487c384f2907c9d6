use std::sync::Arc;

use tracing::{debug, warn};

use crate::foundation::core::Canvas;
use crate::foundation::error::{HudError, HudResult};
use crate::layout::config::{Component, LayoutConfig, SpeedUnit};
use crate::layout::hud::{LABEL_GLYPH_PX, METRIC_SLOTS, VALUE_GLYPH_PX, elevation_rect, map_rect};
use crate::render::backend::FrameRGBA;
use crate::render::cache::{AssetCache, CacheSlot};
use crate::render::canvas::VectorLayer;
use crate::render::elevation::{build_elevation_asset, draw_elevation};
use crate::render::map::{build_map_asset, draw_map};
use crate::render::text::{HudFont, TextEngine};
use crate::sync::SyncOffset;
use crate::telemetry::sample::TelemetrySample;
use crate::telemetry::track::TelemetryTrack;
use crate::tiles::TileProvider;

/// Renders one overlay frame per requested video-local time.
///
/// Apart from the [`AssetCache`] passed in by the caller, rendering depends only on its
/// arguments. One compositor and one cache belong to one worker.
pub struct FrameCompositor {
    track: Arc<TelemetryTrack>,
    offset: SyncOffset,
    tiles: Arc<dyn TileProvider>,
    layer: VectorLayer,
    font: HudFont,
    text: Option<TextEngine>,
}

impl FrameCompositor {
    pub fn new(track: Arc<TelemetryTrack>, offset: SyncOffset, tiles: Arc<dyn TileProvider>) -> Self {
        Self {
            track,
            offset,
            tiles,
            layer: VectorLayer::new(),
            font: HudFont::bundled(),
            text: None,
        }
    }

    /// Draw readouts with `font` instead of the bundled face.
    pub fn with_font(mut self, font: HudFont) -> Self {
        self.font = font;
        self.text = None;
        self
    }

    pub fn track(&self) -> &TelemetryTrack {
        &self.track
    }

    pub fn offset(&self) -> SyncOffset {
        self.offset
    }

    /// Track index for video-local time `t`: nearest sample to `start + t + offset`.
    pub fn sample_index_at(&self, video_local_time: f64) -> usize {
        self.track
            .nearest_index_at_offset(video_local_time + self.offset.secs())
    }

    pub fn render(
        &mut self,
        cache: &mut AssetCache,
        video_local_time: f64,
        layout: &LayoutConfig,
        width: u32,
        height: u32,
    ) -> HudResult<FrameRGBA> {
        let idx = self.sample_index_at(video_local_time);
        self.render_sample(cache, idx, layout, width, height)
    }

    /// Render the HUD for track sample `index`.
    pub fn render_sample(
        &mut self,
        cache: &mut AssetCache,
        index: usize,
        layout: &LayoutConfig,
        width: u32,
        height: u32,
    ) -> HudResult<FrameRGBA> {
        Canvas::new(width, height)?;
        let last = self.track.len() - 1;
        let sample = &self.track.samples()[index.min(last)];
        let ls = LayoutConfig::layout_scale(height);

        let mut frame = FrameRGBA::transparent(width, height);
        self.layer.begin(width, height)?;
        let text = text_engine(&mut self.text, &self.font)?;

        for slot in METRIC_SLOTS {
            let cfg = layout.component(slot.component);
            if !cfg.enabled {
                continue;
            }
            let scale = cfg.scale * ls;
            let (x, y) = slot.origin(ls);
            let color = [255, 255, 255, cfg.alpha_u8()];
            let value = metric_value(sample, slot.component, layout.speed_unit);
            text.draw(
                &mut self.layer,
                &slot.format(value),
                x as f64,
                y as f64,
                VALUE_GLYPH_PX * scale,
                color,
            )?;
            let label_y = y + (VALUE_GLYPH_PX * scale) as i64;
            text.draw(
                &mut self.layer,
                slot.label(layout.speed_unit),
                x as f64,
                label_y as f64,
                LABEL_GLYPH_PX * scale,
                color,
            )?;
        }

        if layout.map.enabled {
            let rect = map_rect(&layout.map, ls, width);
            if cache.map.is_empty() {
                cache.map = match build_map_asset(&self.track, self.tiles.as_ref(), rect.width) {
                    Ok(Some(asset)) => {
                        cache.note_build();
                        CacheSlot::Ready(asset)
                    }
                    Ok(None) => {
                        debug!("track has no position fixes, map disabled");
                        CacheSlot::Unavailable
                    }
                    Err(e) => {
                        warn!(error = %e, "map background unavailable, map disabled");
                        CacheSlot::Unavailable
                    }
                };
            }
            if let Some(asset) = cache.map.ready_mut() {
                draw_map(
                    &mut frame,
                    &mut self.layer,
                    asset,
                    &layout.map,
                    rect,
                    sample.fix(),
                    ls,
                )?;
            }
        }

        if layout.elevation.enabled {
            let rect = elevation_rect(&layout.elevation, ls, width, height);
            if cache.elevation.is_empty() {
                cache.elevation = match build_elevation_asset(&self.track, rect.width, rect.height)? {
                    Some(asset) => {
                        cache.note_build();
                        CacheSlot::Ready(asset)
                    }
                    None => {
                        debug!("track has no altitude, elevation disabled");
                        CacheSlot::Unavailable
                    }
                };
            }
            if let Some(asset) = cache.elevation.ready_mut() {
                draw_elevation(
                    &mut frame,
                    &mut self.layer,
                    asset,
                    &layout.elevation,
                    rect,
                    sample.distance,
                )?;
            }
        }

        let vector = self.layer.finish()?;
        frame.composite_over(&vector)?;
        Ok(frame)
    }
}

// Built on first render.
fn text_engine<'a>(
    slot: &'a mut Option<TextEngine>,
    font: &HudFont,
) -> HudResult<&'a mut TextEngine> {
    if slot.is_none() {
        *slot = Some(TextEngine::new(font)?);
    }
    slot.as_mut()
        .ok_or_else(|| HudError::validation("text engine unavailable"))
}

fn metric_value(sample: &TelemetrySample, component: Component, unit: SpeedUnit) -> Option<f64> {
    match component {
        Component::Speed => match unit {
            SpeedUnit::Mph => sample.speed_mph(),
            SpeedUnit::Kph => sample.speed_kph(),
        },
        Component::Power => sample.power,
        Component::Cadence => sample.cadence,
        Component::HeartRate => sample.heart_rate,
        Component::Gradient => sample.grade,
        Component::Map | Component::Elevation => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
