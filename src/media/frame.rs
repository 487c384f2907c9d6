use std::path::Path;

use image::RgbaImage;

use crate::encode::ffmpeg::run_tool;
use crate::foundation::error::{HudError, HudResult};

/// Decode the frame shown at `at_secs` as straight RGBA at the video's own `width x height`.
pub fn extract_frame(video: &Path, at_secs: f64, width: u32, height: u32) -> HudResult<RgbaImage> {
    if !at_secs.is_finite() || at_secs < 0.0 {
        return Err(HudError::validation(format!(
            "frame time must be a non-negative number of seconds, got {at_secs}"
        )));
    }
    let stdout = run_tool("ffmpeg", &extract_args(video, at_secs), "frame extraction")?;
    let expected = (width as usize) * (height as usize) * 4;
    if stdout.len() < expected {
        return Err(HudError::input(format!(
            "no frame at {at_secs:.3}s in '{}' (got {} of {expected} bytes)",
            video.display(),
            stdout.len()
        )));
    }
    let mut bytes = stdout;
    bytes.truncate(expected);
    RgbaImage::from_raw(width, height, bytes)
        .ok_or_else(|| HudError::encode("extracted frame has the wrong size"))
}

fn extract_args(video: &Path, at_secs: f64) -> Vec<String> {
    let mut args: Vec<String> = ["-v", "error", "-ss"].map(String::from).to_vec();
    args.push(format!("{at_secs:.3}"));
    args.push("-i".into());
    args.push(video.to_string_lossy().into_owned());
    args.extend(
        ["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"].map(String::from),
    );
    args
}

#[cfg(test)]
#[path = "../../tests/unit/media/frame.rs"]
mod tests;
