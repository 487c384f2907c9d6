//! Final composite of the merged overlay onto the source video.

use std::io::{BufRead as _, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use crate::encode::ffmpeg::{drain, ensure_parent_dir, join_drain};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{HudError, HudResult};

/// Overlay the HUD (alpha) on the source (yuv420p) and keep the source's audio when present.
pub const OVERLAY_FILTER: &str =
    "[0:v]format=yuv420p[base];[1:v]format=rgba[ovr];[base][ovr]overlay=0:0,format=yuv420p[out]";

/// Output encode quality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodeQuality {
    #[default]
    CrfVisuallyLossless,
    MatchSourceBitrate,
    FastPreview,
}

impl EncodeQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrfVisuallyLossless => "crf-visually-lossless",
            Self::MatchSourceBitrate => "match-source-bitrate",
            Self::FastPreview => "fast-preview",
        }
    }

    /// Video encoder arguments; `source_bitrate` is in bits per second.
    pub fn video_args(self, source_bitrate: Option<u64>) -> Vec<String> {
        let args: &[&str] = match (self, source_bitrate) {
            (Self::MatchSourceBitrate, Some(bps)) if bps > 0 => {
                return ["-c:v", "libx264", "-preset", "medium", "-b:v"]
                    .map(String::from)
                    .into_iter()
                    .chain([bps.to_string()])
                    .collect();
            }
            (Self::MatchSourceBitrate, _) => {
                warn!("source bitrate unknown, falling back to CRF 18");
                &["-c:v", "libx264", "-preset", "slow", "-crf", "18"]
            }
            (Self::CrfVisuallyLossless, _) => &["-c:v", "libx264", "-preset", "slow", "-crf", "18"],
            (Self::FastPreview, _) => &["-c:v", "libx264", "-preset", "ultrafast", "-crf", "28"],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

impl FromStr for EncodeQuality {
    type Err = HudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crf-visually-lossless" => Ok(Self::CrfVisuallyLossless),
            "match-source-bitrate" => Ok(Self::MatchSourceBitrate),
            "fast-preview" => Ok(Self::FastPreview),
            other => Err(HudError::validation(format!(
                "unknown quality '{other}' (expected crf-visually-lossless, match-source-bitrate or fast-preview)"
            ))),
        }
    }
}

/// Inputs of the final composite.
#[derive(Clone, Debug)]
pub struct ComposeRequest {
    pub source: PathBuf,
    pub overlay: PathBuf,
    pub output: PathBuf,
    pub quality: EncodeQuality,
    pub source_bitrate: Option<u64>,
    /// Source duration, used to turn ffmpeg's output time into a fraction.
    pub duration_secs: f64,
}

impl ComposeRequest {
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-loglevel", "error", "-nostats", "-i"]
            .map(String::from)
            .to_vec();
        args.push(self.source.to_string_lossy().into_owned());
        args.push("-i".into());
        args.push(self.overlay.to_string_lossy().into_owned());
        args.extend(
            [
                "-filter_complex",
                OVERLAY_FILTER,
                "-map",
                "[out]",
                "-map",
                "0:a?",
            ]
            .map(String::from),
        );
        args.extend(self.quality.video_args(self.source_bitrate));
        args.extend(
            ["-c:a", "aac", "-shortest", "-movflags", "+faststart", "-progress", "pipe:1"]
                .map(String::from),
        );
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Output time in seconds from one `-progress` line, if it carries one.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // Both keys are microseconds.
        "out_time_us" | "out_time_ms" => value.parse::<i64>().ok().map(|us| us.max(0) as f64 / 1e6),
        "out_time" => parse_clock(value),
        _ => None,
    }
}

fn parse_clock(v: &str) -> Option<f64> {
    let mut parts = v.trim().split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || h < 0.0 {
        return None;
    }
    Some(h * 3600.0 + m * 60.0 + s)
}

/// How often [`compose`] checks for exit and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the composite, reporting completion fractions in `[0, 1]` as ffmpeg advances.
///
/// Cancellation kills ffmpeg even while it prints nothing; any non-zero exit is an
/// [`HudError::Encode`].
#[tracing::instrument(skip_all, fields(output = %req.output.display(), quality = req.quality.as_str()))]
pub fn compose(
    req: &ComposeRequest,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(f64),
) -> HudResult<()> {
    cancel.check("compose")?;
    ensure_parent_dir(&req.output)?;
    let mut child = Command::new("ffmpeg")
        .args(req.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| HudError::encode(format!("failed to spawn ffmpeg for compose: {e}")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| HudError::encode("failed to open ffmpeg stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| HudError::encode("failed to open ffmpeg stderr"))?;
    let stderr_drain = drain(stderr);
    let (progress, progress_drain) = progress_reader(stdout, req.duration_secs);

    let waited = supervise(&mut child, &progress, cancel, on_progress);
    if progress_drain.join().is_err() {
        warn!("ffmpeg progress reader panicked");
    }
    let stderr_bytes = join_drain(Some(stderr_drain))?;
    let status = waited?;
    for fraction in progress.try_iter() {
        on_progress(fraction);
    }
    if !status.success() {
        return Err(HudError::encode(format!(
            "compose: ffmpeg exited with status {status}: {}",
            String::from_utf8_lossy(&stderr_bytes).trim()
        )));
    }
    on_progress(1.0);
    info!("composite written");
    Ok(())
}

// Parse `-progress` lines off the child's stdout into completion fractions.
fn progress_reader(
    stdout: impl Read + Send + 'static,
    duration_secs: f64,
) -> (Receiver<f64>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if let Some(t) = parse_progress_line(&line)
                && duration_secs > 0.0
                && tx.send((t / duration_secs).clamp(0.0, 1.0)).is_err()
            {
                break;
            }
        }
    });
    (rx, handle)
}

/// Wait for `child`, forwarding fractions from `progress` and killing the child once `cancel`
/// fires.
fn supervise(
    child: &mut Child,
    progress: &Receiver<f64>,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(f64),
) -> HudResult<ExitStatus> {
    loop {
        for fraction in progress.try_iter() {
            on_progress(fraction);
        }
        if let Err(e) = cancel.check("compose") {
            if let Err(kill) = child.kill() {
                warn!(error = %kill, "failed to kill ffmpeg");
            }
            let _ = child.wait();
            return Err(e);
        }
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(HudError::encode(format!("failed to wait for ffmpeg: {e}"))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/compose.rs"]
mod tests;
