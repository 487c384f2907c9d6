use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::encode::compose::{ComposeRequest, EncodeQuality, compose};
use crate::encode::concat::{Concatenator, FfmpegConcat};
use crate::encode::ffmpeg::{FfmpegChunkWriter, is_ffmpeg_on_path, is_ffprobe_on_path};
use crate::encode::sink::ChunkWriter;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{HudError, HudResult};
use crate::layout::config::LayoutConfig;
use crate::media::probe::{VideoMetadata, probe_video};
use crate::pipeline::chunk::{DEFAULT_CHUNK_SECS, plan_chunks};
use crate::pipeline::merge::{DEFAULT_BATCH_SIZE, HierarchicalMerger};
use crate::pipeline::progress::{PhaseBand, ProgressReporter};
use crate::pipeline::scheduler::{ChunkScheduler, RenderInputs, SchedulerOpts};
use crate::render::text::HudFont;
use crate::sync::{SyncOutcome, synchronize};
use crate::telemetry::track::TelemetryTrack;
use crate::tiles::TileProvider;

/// ffmpeg's own progress covers the compose band up to the cleanup step.
const ENCODE_BAND: PhaseBand = PhaseBand {
    start: PhaseBand::COMPOSE.start,
    end: 95,
};

/// Knobs of one render job.
#[derive(Clone, Debug)]
pub struct RenderJobOpts {
    pub chunk_secs: f64,
    pub batch_size: usize,
    /// `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Whole-job deadline.
    pub timeout: Option<Duration>,
    pub quality: EncodeQuality,
    pub elide_repeats: bool,
    /// Leave chunk, merge and overlay files in the work directory.
    pub keep_intermediates: bool,
    /// Parent of the per-job scratch directory; the system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    /// Seconds; replaces the computed sync offset.
    pub offset_override: Option<f64>,
    /// Face for the metric readouts.
    pub font: HudFont,
}

impl Default for RenderJobOpts {
    fn default() -> Self {
        Self {
            chunk_secs: DEFAULT_CHUNK_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            threads: None,
            timeout: None,
            quality: EncodeQuality::default(),
            elide_repeats: true,
            keep_intermediates: false,
            work_dir: None,
            offset_override: None,
            font: HudFont::bundled(),
        }
    }
}

/// What a render job produced.
#[derive(Clone, Debug)]
pub struct RenderSummary {
    pub output: PathBuf,
    pub sync: SyncOutcome,
    pub chunks: usize,
    pub frames: u64,
    pub merge_rounds: usize,
}

/// Overlay-only result of [`render_overlay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlaySummary {
    pub overlay: PathBuf,
    pub chunks: usize,
    pub frames: u64,
    pub merge_rounds: usize,
    /// Per-chunk xxh3 digests, in chunk order.
    pub digests: Vec<u64>,
}

/// Render the overlay for `meta`'s timeline into one asset at `overlay`.
///
/// Chunks go to `work_dir` through `writer`, then are merged with `concat`. Chunk files are
/// consumed by the merge unless `keep_intermediates` is set.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(width = meta.width, height = meta.height))]
pub fn render_overlay(
    inputs: &RenderInputs,
    meta: &VideoMetadata,
    writer: Arc<dyn ChunkWriter>,
    concat: &dyn Concatenator,
    work_dir: &Path,
    overlay: &Path,
    opts: &RenderJobOpts,
    progress: &ProgressReporter,
    cancel: &CancelToken,
) -> HudResult<OverlaySummary> {
    let chunks = plan_chunks(meta.duration, opts.chunk_secs, meta.fps)?;
    let total = chunks.len();
    progress.report(
        PhaseBand::RENDER.start,
        &format!("Rendering {total} overlay chunks..."),
    );

    let extension = writer.extension().to_string();
    let mut scheduler = ChunkScheduler::new(
        writer,
        SchedulerOpts {
            threads: opts.threads,
            elide_repeats: opts.elide_repeats,
        },
    );
    let results = scheduler.run(inputs, &chunks, work_dir, cancel, &|done, total| {
        progress.report_advance(
            PhaseBand::RENDER.step(done, total),
            &format!("Rendered chunk {done}/{total}"),
        );
    })?;

    progress.report(PhaseBand::MERGE.start, "Concatenating overlay chunks...");
    let paths: Vec<PathBuf> = results.iter().map(|r| r.path.clone()).collect();
    let merger = HierarchicalMerger::new(concat, work_dir, extension, opts.batch_size)?
        .consume_inputs(!opts.keep_intermediates);
    let report = merger.merge(&paths, overlay, cancel, &mut |done, total| {
        progress.progress(PhaseBand::MERGE.step(done, total));
    });
    let report = match report {
        Ok(r) => r,
        Err(e) => {
            if !opts.keep_intermediates {
                for p in &paths {
                    crate::pipeline::scheduler::remove_best_effort(p);
                }
            }
            return Err(e);
        }
    };

    Ok(OverlaySummary {
        overlay: report.output,
        chunks: total,
        frames: results.iter().map(|r| r.stats.frames_total).sum(),
        merge_rounds: report.rounds,
        digests: results.iter().map(|r| r.stats.digest).collect(),
    })
}

/// End-to-end job: ingest, probe, sync, render chunks, merge, composite, clean up.
///
/// Progress goes to `progress` as `STATUS:`/`PROGRESS:` lines; any phase failure aborts the
/// job with that phase's error after best-effort cleanup.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(video = %video.display(), output = %output.display()))]
pub fn run_render_job(
    fit: &Path,
    video: &Path,
    output: &Path,
    layout: LayoutConfig,
    tiles: Arc<dyn TileProvider>,
    opts: &RenderJobOpts,
    progress: &ProgressReporter,
    cancel: &CancelToken,
) -> HudResult<RenderSummary> {
    layout.validate()?;
    if !is_ffmpeg_on_path() || !is_ffprobe_on_path() {
        return Err(HudError::encode(
            "ffmpeg and ffprobe are required for rendering, but were not found on PATH",
        ));
    }
    let cancel = cancel.child_with_timeout(opts.timeout);

    progress.report(PhaseBand::INGEST.start, "Parsing FIT data...");
    let track = Arc::new(TelemetryTrack::from_fit_file(fit)?);
    let meta = probe_video(video)?;
    progress.report(
        PhaseBand::INGEST.end,
        &format!(
            "Video: {}x{}, {:.1}s @ {:.2}fps",
            meta.width,
            meta.height,
            meta.duration,
            meta.fps.as_f64()
        ),
    );

    let mut sync = synchronize(meta.creation_time, Some(&track));
    if let Some(secs) = opts.offset_override {
        sync = sync.with_manual_offset(secs);
    }
    if sync.is_degraded() {
        progress.status(&format!("Warning: {}", sync.report().message));
    }
    info!(offset = sync.offset.secs(), "sync offset");

    let inputs = RenderInputs {
        track,
        offset: sync.offset,
        layout: Arc::new(layout),
        tiles,
        canvas: meta.canvas()?,
        fps: meta.fps,
        font: opts.font.clone(),
    };

    let mut job_dir = WorkDir::create(opts.work_dir.as_deref(), opts.keep_intermediates)?;
    let overlay = job_dir.path().join("overlay_full.mov");
    let rendered = render_overlay(
        &inputs,
        &meta,
        Arc::new(FfmpegChunkWriter),
        &FfmpegConcat,
        job_dir.path(),
        &overlay,
        opts,
        progress,
        &cancel,
    )?;

    progress.report(PhaseBand::COMPOSE.start, "Compositing final video...");
    let request = ComposeRequest {
        source: video.to_path_buf(),
        overlay: overlay.clone(),
        output: output.to_path_buf(),
        quality: opts.quality,
        source_bitrate: meta.bitrate,
        duration_secs: meta.duration,
    };
    let composed = compose(&request, &cancel, &mut |fraction| {
        let pct = ENCODE_BAND.at(fraction);
        if pct > progress.last() {
            progress.progress(pct);
        } else {
            progress.heartbeat();
        }
    });
    keep_on_failure(&mut job_dir, &overlay, composed)?;

    progress.report(ENCODE_BAND.end, "Cleaning up temp files...");
    drop(job_dir);
    progress.report(PhaseBand::COMPOSE.end, "Complete!");

    Ok(RenderSummary {
        output: output.to_path_buf(),
        sync,
        chunks: rendered.chunks,
        frames: rendered.frames,
        merge_rounds: rendered.merge_rounds,
    })
}

// A failed compose leaves the merged overlay on disk for a retry or inspection.
fn keep_on_failure<T>(
    job_dir: &mut WorkDir,
    overlay: &Path,
    result: HudResult<T>,
) -> HudResult<T> {
    if let Err(e) = &result {
        job_dir.persist();
        warn!(overlay = %overlay.display(), error = %e, "compose failed, merged overlay kept");
    }
    result
}

/// Per-job scratch directory, removed on drop unless kept.
pub(crate) struct WorkDir {
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    pub(crate) fn create(parent: Option<&Path>, keep: bool) -> HudResult<Self> {
        let parent = parent.map_or_else(std::env::temp_dir, Path::to_path_buf);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = parent.join(format!("ridehud-job-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&path).map_err(|e| {
            HudError::input(format!(
                "failed to create work directory '{}': {e}",
                path.display()
            ))
        })?;
        Ok(Self { path, keep })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Skip removal on drop.
    pub(crate) fn persist(&mut self) {
        self.keep = true;
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.keep {
            info!(path = %self.path.display(), "intermediates kept");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "cleanup failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
