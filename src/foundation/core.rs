use crate::foundation::error::{HudError, HudResult};

/// Absolute 0-based frame index on the video timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)` on the video timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex,
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> HudResult<Self> {
        if start.0 > end.0 {
            return Err(HudError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> HudResult<Self> {
        if den == 0 {
            return Err(HudError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(HudError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Parse ffprobe rate notation: `"30000/1001"`, `"25/1"` or a bare `"30"`.
    pub fn parse_rational(s: &str) -> HudResult<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s, "1"),
        };
        let num: u32 = num
            .parse()
            .map_err(|_| HudError::validation(format!("invalid frame rate '{s}'")))?;
        let den: u32 = den
            .parse()
            .map_err(|_| HudError::validation(format!("invalid frame rate '{s}'")))?;
        Self::new(num, den)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Time of frame `f` in seconds.
    pub fn frame_to_secs(self, f: FrameIndex) -> f64 {
        (f.0 as f64) * f64::from(self.den) / f64::from(self.num)
    }

    /// Smallest frame index whose timestamp is `>= secs`.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        if secs <= 0.0 {
            return 0;
        }
        // Rates such as 30000/1001 land a hair off whole frames; snap before rounding up.
        let exact = secs * self.as_f64();
        let snapped = exact.round();
        if (exact - snapped).abs() < 1e-6 {
            snapped as u64
        } else {
            exact.ceil() as u64
        }
    }
}

/// Output raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated, non-empty canvas.
    pub fn new(width: u32, height: u32) -> HudResult<Self> {
        if width == 0 || height == 0 {
            return Err(HudError::validation("canvas width/height must be non-zero"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(HudError::validation(
                "canvas width/height must fit the rasterizer (<= 65535)",
            ));
        }
        Ok(Self { width, height })
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
