use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use tracing::info;

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::error::{HudError, HudResult};
use crate::layout::config::LayoutConfig;
use crate::media::frame::extract_frame;
use crate::media::probe::probe_video;
use crate::render::backend::FrameRGBA;
use crate::render::cache::AssetCache;
use crate::render::compositor::FrameCompositor;
use crate::render::text::HudFont;
use crate::sync::{SyncOutcome, synchronize};
use crate::telemetry::track::TelemetryTrack;
use crate::tiles::TileProvider;

/// A single still of the source video with the HUD drawn on top.
#[derive(Clone, Debug)]
pub struct PreviewRequest {
    pub fit: PathBuf,
    pub video: PathBuf,
    /// Video-local time in seconds.
    pub at_secs: f64,
    pub layout: LayoutConfig,
    pub offset_override: Option<f64>,
    pub output: PathBuf,
    pub font: HudFont,
}

/// Draw `overlay` (premultiplied, same size) over `base` and return straight RGBA.
pub fn composite_preview(base: RgbaImage, overlay: &FrameRGBA) -> HudResult<RgbaImage> {
    if base.dimensions() != (overlay.width, overlay.height) {
        return Err(HudError::validation(format!(
            "overlay is {}x{} but the frame is {}x{}",
            overlay.width,
            overlay.height,
            base.width(),
            base.height()
        )));
    }
    let mut frame = FrameRGBA::from_straight(base);
    frame.composite_over(&overlay.data)?;
    frame.to_straight_image()
}

/// Extract the frame at `at_secs`, render the HUD at the frame's own size, write a PNG.
#[tracing::instrument(skip_all, fields(video = %req.video.display(), at = req.at_secs))]
pub fn render_preview(req: &PreviewRequest, tiles: Arc<dyn TileProvider>) -> HudResult<SyncOutcome> {
    req.layout.validate()?;
    let track = Arc::new(TelemetryTrack::from_fit_file(&req.fit)?);
    let meta = probe_video(&req.video)?;
    let at = req.at_secs.clamp(0.0, meta.duration);

    let mut sync = synchronize(meta.creation_time, Some(&track));
    if let Some(secs) = req.offset_override {
        sync = sync.with_manual_offset(secs);
    }

    let base = extract_frame(&req.video, at, meta.width, meta.height)?;
    let mut compositor =
        FrameCompositor::new(track, sync.offset, tiles).with_font(req.font.clone());
    let overlay = compositor.render(
        &mut AssetCache::new(),
        at,
        &req.layout,
        meta.width,
        meta.height,
    )?;
    let still = composite_preview(base, &overlay)?;
    save_png(&still, &req.output)?;
    info!(output = %req.output.display(), "preview written");
    Ok(sync)
}

pub fn save_png(img: &RgbaImage, path: &Path) -> HudResult<()> {
    ensure_parent_dir(path)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| HudError::encode(format!("failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/preview.rs"]
mod tests;
