use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{ChunkWriter, FrameSink, SinkConfig, check_frame_size};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{HudError, HudResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::render::backend::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output `.mov` path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to stdin.
///
/// Output is a MOV with the PNG codec: lossless, alpha preserved, and concatenable with
/// stream copy.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> HudResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(HudError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(HudError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        // Input: straight RGBA8; frames are un-premultiplied in push_frame.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an", "-c:v", "png", "-pix_fmt", "rgba", "-f", "mov"]);
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            HudError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HudError::encode("failed to open ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| HudError::encode("failed to open ffmpeg stderr"))?;

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(drain(stderr));
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> HudResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| HudError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(HudError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);
        check_frame_size(frame, cfg, self.scratch.len())?;

        self.scratch.copy_from_slice(&frame.data);
        if frame.premultiplied {
            unpremultiply_rgba8_in_place(&mut self.scratch);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(HudError::encode("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            HudError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> HudResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| HudError::encode("ffmpeg sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| HudError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = join_drain(self.stderr_drain.take())?;
        if !status.success() {
            return Err(HudError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    // A sink dropped before `end` (error or cancellation) must not leave ffmpeg running.
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// [`ChunkWriter`] producing PNG-in-MOV chunk assets through ffmpeg.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegChunkWriter;

impl ChunkWriter for FfmpegChunkWriter {
    fn extension(&self) -> &str {
        "mov"
    }

    fn open(&self, path: &Path) -> HudResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(path))))
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // Rawvideo input rate goes before `-i`, as a rational.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

pub(crate) fn drain<R: Read + Send + 'static>(mut r: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

pub(crate) fn join_drain(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> HudResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| HudError::encode("ffmpeg output drain thread panicked"))?
            .map_err(|e| HudError::encode(format!("ffmpeg output read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

/// Run `program args..` to completion, mapping a non-zero exit to [`HudError::Encode`] with
/// the tail of stderr.
pub fn run_tool(program: &str, args: &[String], what: &str) -> HudResult<Vec<u8>> {
    let out = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| HudError::encode(format!("failed to spawn {program} for {what}: {e}")))?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(HudError::encode(format!(
            "{what}: {program} exited with status {}: {}",
            out.status,
            tail(stderr.trim(), 2000)
        )));
    }
    Ok(out.stdout)
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> HudResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `tool -version` runs successfully from `PATH`.
pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path("ffmpeg")
}

pub fn is_ffprobe_on_path() -> bool {
    is_tool_on_path("ffprobe")
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
