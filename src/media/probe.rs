use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::encode::ffmpeg::run_tool;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{HudError, HudResult};
use crate::sync::parse_creation_time;

/// What the pipeline needs to know about the source video.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Duration in seconds.
    pub duration: f64,
    pub fps: Fps,
    pub creation_time: Option<DateTime<Utc>>,
    /// Bits per second, from the video stream or else the container.
    pub bitrate: Option<u64>,
}

impl VideoMetadata {
    pub fn canvas(&self) -> HudResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Parse `ffprobe -of json -show_format -show_streams` output.
    pub fn from_ffprobe_json(json: &str) -> HudResult<Self> {
        let probe: ProbeOutput = serde_json::from_str(json)
            .map_err(|e| HudError::encode(format!("unreadable ffprobe output: {e}")))?;
        let stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| HudError::input("video has no video stream"))?;
        let format = probe.format.unwrap_or_default();

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(HudError::input("video stream has no frame size")),
        };
        let duration = parse_f64(stream.duration.as_deref())
            .or_else(|| parse_f64(format.duration.as_deref()))
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| HudError::input("video duration unknown"))?;
        let fps = [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|r| Fps::parse_rational(r).ok())
            .ok_or_else(|| HudError::input("video frame rate unknown"))?;
        let creation_time = format
            .tags
            .get("creation_time")
            .or_else(|| stream.tags.get("creation_time"))
            .and_then(|raw| parse_creation_time(raw));
        let bitrate = parse_u64(stream.bit_rate.as_deref()).or_else(|| parse_u64(format.bit_rate.as_deref()));

        Ok(Self {
            width,
            height,
            duration,
            fps,
            creation_time,
            bitrate,
        })
    }
}

/// Probe `path` with ffprobe.
#[tracing::instrument(skip_all, fields(video = %path.display()))]
pub fn probe_video(path: &Path) -> HudResult<VideoMetadata> {
    if !path.is_file() {
        return Err(HudError::input(format!(
            "video '{}' does not exist",
            path.display()
        )));
    }
    let args: Vec<String> = [
        "-v",
        "error",
        "-of",
        "json",
        "-show_format",
        "-show_streams",
    ]
    .map(String::from)
    .into_iter()
    .chain([path.to_string_lossy().into_owned()])
    .collect();
    let stdout = run_tool("ffprobe", &args, "probe")?;
    let meta = VideoMetadata::from_ffprobe_json(&String::from_utf8_lossy(&stdout))?;
    debug!(
        width = meta.width,
        height = meta.height,
        duration = meta.duration,
        fps = meta.fps.as_f64(),
        "probed video"
    );
    Ok(meta)
}

fn parse_f64(v: Option<&str>) -> Option<f64> {
    v?.trim().parse().ok()
}

fn parse_u64(v: Option<&str>) -> Option<u64> {
    v?.trim().parse().ok().filter(|b| *b > 0)
}

#[derive(serde::Deserialize, Default)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(serde::Deserialize, Default)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(serde::Deserialize, Default)]
struct ProbeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
