use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{HudError, HudResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

/// Consumer of rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> HudResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> HudResult<()>;
    /// Called once after the last frame; the asset is complete when this returns `Ok`.
    fn end(&mut self) -> HudResult<()>;
}

/// Opens one [`FrameSink`] per chunk asset.
pub trait ChunkWriter: Send + Sync {
    /// File extension of the assets this writer produces, without the dot.
    fn extension(&self) -> &str;
    /// Create a sink writing to `path`.
    fn open(&self, path: &Path) -> HudResult<Box<dyn FrameSink>>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    pub(crate) frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> HudResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> HudResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> HudResult<()> {
        Ok(())
    }
}

/// Writes straight-alpha RGBA8 frames back to back into one file.
///
/// Lossless and trivially concatenable, so byte-level concatenation of chunk files is a valid
/// merge. Used where ffmpeg is not wanted (tests, debugging).
#[derive(Debug)]
pub struct RawFileSink {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    cfg: Option<SinkConfig>,
    scratch: Vec<u8>,
    last_idx: Option<FrameIndex>,
}

impl RawFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            out: None,
            cfg: None,
            scratch: Vec::new(),
            last_idx: None,
        }
    }
}

impl FrameSink for RawFileSink {
    fn begin(&mut self, cfg: SinkConfig) -> HudResult<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("failed to create '{}'", self.path.display()))?;
        self.out = Some(BufWriter::new(file));
        self.scratch = vec![0; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> HudResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| HudError::encode("raw sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(HudError::encode("raw sink received out-of-order frame index"));
        }
        self.last_idx = Some(idx);
        check_frame_size(frame, cfg, self.scratch.len())?;
        self.scratch.copy_from_slice(&frame.data);
        if frame.premultiplied {
            unpremultiply_rgba8_in_place(&mut self.scratch);
        }
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| HudError::encode("raw sink is already finalized"))?;
        out.write_all(&self.scratch)
            .with_context(|| format!("failed to write '{}'", self.path.display()))?;
        Ok(())
    }

    fn end(&mut self) -> HudResult<()> {
        let mut out = self
            .out
            .take()
            .ok_or_else(|| HudError::encode("raw sink not started"))?;
        out.flush()
            .with_context(|| format!("failed to flush '{}'", self.path.display()))?;
        self.cfg = None;
        Ok(())
    }
}

/// [`ChunkWriter`] producing [`RawFileSink`] assets.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawChunkWriter;

impl ChunkWriter for RawChunkWriter {
    fn extension(&self) -> &str {
        "rgba"
    }

    fn open(&self, path: &Path) -> HudResult<Box<dyn FrameSink>> {
        Ok(Box::new(RawFileSink::new(path)))
    }
}

pub(crate) fn check_frame_size(frame: &FrameRGBA, cfg: &SinkConfig, expected_len: usize) -> HudResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(HudError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != expected_len {
        return Err(HudError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
