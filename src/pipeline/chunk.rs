use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{HudError, HudResult};

pub const DEFAULT_CHUNK_SECS: f64 = 30.0;

/// One independently rendered time slice `[start, end)` of the output video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderChunk {
    pub index: usize,
    /// Video-local start time in seconds.
    pub start: f64,
    /// Video-local end time in seconds (exclusive).
    pub end: f64,
    /// Global frames `k` with `start <= k / fps < end`.
    pub frames: FrameRange,
}

impl RenderChunk {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Chunk-local time of global frame `f`.
    pub fn local_time(&self, fps: Fps, f: FrameIndex) -> f64 {
        fps.frame_to_secs(f) - self.start
    }

    pub fn file_name(&self, extension: &str) -> String {
        chunk_file_name(self.index, extension)
    }
}

/// Deterministic asset name for chunk `index`; lexical order equals index order.
pub fn chunk_file_name(index: usize, extension: &str) -> String {
    format!("overlay_chunk_{index:05}.{extension}")
}

/// Split `[0, duration)` into `chunk_secs` slices; the last one may be shorter.
///
/// Frame ranges are derived from global frame indices, so consecutive chunks tile the
/// timeline without dropping or repeating a frame.
pub fn plan_chunks(duration: f64, chunk_secs: f64, fps: Fps) -> HudResult<Vec<RenderChunk>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(HudError::validation(format!(
            "video duration must be positive, got {duration}"
        )));
    }
    if !chunk_secs.is_finite() || chunk_secs * fps.as_f64() < 1.0 {
        return Err(HudError::validation(format!(
            "chunk length {chunk_secs}s is shorter than one frame"
        )));
    }

    let total_frames = fps.secs_to_frames_ceil(duration);
    let mut chunks = Vec::new();
    let mut index = 0usize;
    loop {
        let start = index as f64 * chunk_secs;
        if start >= duration {
            break;
        }
        let end = (start + chunk_secs).min(duration);
        let first = fps.secs_to_frames_ceil(start);
        let last = if end >= duration {
            total_frames
        } else {
            fps.secs_to_frames_ceil(end)
        };
        if first < last {
            chunks.push(RenderChunk {
                index: chunks.len(),
                start,
                end,
                frames: FrameRange::new(FrameIndex(first), FrameIndex(last))?,
            });
        }
        index += 1;
    }
    Ok(chunks)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/chunk.rs"]
mod tests;
