//! Parallel chunk rendering.
//!
//! Every worker thread owns one [`FrameCompositor`] and one [`AssetCache`] for its lifetime
//! and pulls chunk indices from a shared counter. Inputs are shared read-only; results are
//! collected by chunk index, so completion order never affects the output.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};
use xxhash_rust::xxh3::Xxh3;

use crate::encode::sink::{ChunkWriter, FrameSink, SinkConfig};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{HudError, HudResult};
use crate::layout::config::LayoutConfig;
use crate::pipeline::chunk::RenderChunk;
use crate::render::backend::FrameRGBA;
use crate::render::cache::AssetCache;
use crate::render::compositor::FrameCompositor;
use crate::render::text::HudFont;
use crate::sync::SyncOffset;
use crate::telemetry::track::TelemetryTrack;
use crate::tiles::TileProvider;

/// Lifecycle of one scheduler run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Dispatching,
    Rendering,
    Collecting,
    Done,
    Failed,
}

/// Read-only inputs shared by every worker.
#[derive(Clone)]
pub struct RenderInputs {
    pub track: Arc<TelemetryTrack>,
    pub offset: SyncOffset,
    pub layout: Arc<LayoutConfig>,
    pub tiles: Arc<dyn TileProvider>,
    pub canvas: Canvas,
    pub fps: Fps,
    pub font: HudFont,
}

impl RenderInputs {
    fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerOpts {
    /// Worker count; `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Push the previous raster again when consecutive frames hit the same sample.
    pub elide_repeats: bool,
}

impl Default for SchedulerOpts {
    fn default() -> Self {
        Self {
            threads: None,
            elide_repeats: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub frames_total: u64,
    pub frames_rendered: u64,
    pub frames_elided: u64,
    /// xxh3 over the premultiplied bytes of every pushed frame, in order.
    pub digest: u64,
}

/// One finished chunk asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkResult {
    pub index: usize,
    pub path: PathBuf,
    pub stats: ChunkStats,
}

pub struct ChunkScheduler {
    writer: Arc<dyn ChunkWriter>,
    opts: SchedulerOpts,
    state: JobState,
}

impl ChunkScheduler {
    pub fn new(writer: Arc<dyn ChunkWriter>, opts: SchedulerOpts) -> Self {
        Self {
            writer,
            opts,
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Path of chunk `chunk`'s asset under `out_dir`.
    pub fn chunk_path(&self, out_dir: &Path, chunk: &RenderChunk) -> PathBuf {
        out_dir.join(chunk.file_name(self.writer.extension()))
    }

    /// Render every chunk into `out_dir`, returning results ordered by chunk index.
    ///
    /// Workers watch a child of `cancel`. The first failure cancels only that child, so the
    /// remaining workers stop at their next frame while the caller's token stays untouched; the
    /// job then fails with that error and every chunk file is removed (best effort).
    /// `on_chunk_done(done, total)` runs on the worker thread after each finished chunk.
    pub fn run(
        &mut self,
        inputs: &RenderInputs,
        chunks: &[RenderChunk],
        out_dir: &Path,
        cancel: &CancelToken,
        on_chunk_done: &(dyn Fn(usize, usize) + Sync),
    ) -> HudResult<Vec<ChunkResult>> {
        self.state = JobState::Dispatching;
        let outcome = self.dispatch(inputs, chunks, out_dir, cancel, on_chunk_done);
        match outcome {
            Ok(results) => {
                self.state = JobState::Done;
                Ok(results)
            }
            Err(e) => {
                self.state = JobState::Failed;
                warn!(phase = e.phase(), error = %e, "chunk rendering failed, removing chunk files");
                for chunk in chunks {
                    remove_best_effort(&self.chunk_path(out_dir, chunk));
                }
                Err(e)
            }
        }
    }

    fn dispatch(
        &mut self,
        inputs: &RenderInputs,
        chunks: &[RenderChunk],
        out_dir: &Path,
        cancel: &CancelToken,
        on_chunk_done: &(dyn Fn(usize, usize) + Sync),
    ) -> HudResult<Vec<ChunkResult>> {
        if chunks.is_empty() {
            return Err(HudError::validation("nothing to render: no chunks"));
        }
        std::fs::create_dir_all(out_dir).map_err(|e| {
            HudError::input(format!(
                "failed to create work directory '{}': {e}",
                out_dir.display()
            ))
        })?;
        let pool = build_thread_pool(self.opts.threads)?;
        let cancel = &cancel.child_with_timeout(None);
        let workers = pool.current_num_threads().min(chunks.len()).max(1);
        info!(chunks = chunks.len(), workers, "rendering overlay chunks");

        let next = AtomicUsize::new(0);
        let done = AtomicUsize::new(0);
        let first_failure: Mutex<Option<HudError>> = Mutex::new(None);
        let slots: Vec<Mutex<Option<ChunkResult>>> =
            chunks.iter().map(|_| Mutex::new(None)).collect();

        self.state = JobState::Rendering;
        let writer = self.writer.as_ref();
        let elide = self.opts.elide_repeats;
        pool.scope(|s| {
            for worker in 0..workers {
                let (next, done, first_failure, slots) = (&next, &done, &first_failure, &slots);
                s.spawn(move |_| {
                    let mut compositor = FrameCompositor::new(
                        Arc::clone(&inputs.track),
                        inputs.offset,
                        Arc::clone(&inputs.tiles),
                    )
                    .with_font(inputs.font.clone());
                    let mut cache = AssetCache::new();
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        let Some(chunk) = chunks.get(i) else { break };
                        let path = out_dir.join(chunk.file_name(writer.extension()));
                        let rendered = writer.open(&path).and_then(|mut sink| {
                            render_chunk(
                                &mut compositor,
                                &mut cache,
                                inputs,
                                chunk,
                                sink.as_mut(),
                                cancel,
                                elide,
                            )
                        });
                        match rendered {
                            Ok(stats) => {
                                debug!(worker, chunk = chunk.index, frames = stats.frames_total, "chunk done");
                                if let Ok(mut slot) = slots[i].lock() {
                                    *slot = Some(ChunkResult {
                                        index: chunk.index,
                                        path,
                                        stats,
                                    });
                                }
                                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                                on_chunk_done(n, chunks.len());
                            }
                            Err(e) => {
                                let e = e.in_chunk(chunk.index);
                                cancel.cancel();
                                record_failure(first_failure, e);
                                break;
                            }
                        }
                    }
                });
            }
        });

        self.state = JobState::Collecting;
        let failure = first_failure
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(e) = failure {
            return Err(e);
        }
        let mut results = Vec::with_capacity(chunks.len());
        for (slot, chunk) in slots.into_iter().zip(chunks) {
            let result = slot
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match result {
                Some(r) => results.push(r),
                None => {
                    cancel.check("render")?;
                    return Err(HudError::render(chunk.index, "chunk was never rendered"));
                }
            }
        }
        Ok(results)
    }
}

/// Render the frames of `chunk` into `sink`.
///
/// Frame `k` shows video-local time `k / fps`, which resolves to the track sample nearest
/// `start + k / fps + offset`.
#[tracing::instrument(skip_all, fields(chunk = chunk.index))]
pub fn render_chunk(
    compositor: &mut FrameCompositor,
    cache: &mut AssetCache,
    inputs: &RenderInputs,
    chunk: &RenderChunk,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
    elide_repeats: bool,
) -> HudResult<ChunkStats> {
    let (width, height) = (inputs.canvas.width, inputs.canvas.height);
    sink.begin(inputs.sink_config())?;

    let mut stats = ChunkStats::default();
    let mut hasher = Xxh3::new();
    let mut last: Option<(usize, FrameRGBA)> = None;
    for k in chunk.frames.start.0..chunk.frames.end.0 {
        cancel.check("render")?;
        let idx = FrameIndex(k);
        let sample = compositor.sample_index_at(inputs.fps.frame_to_secs(idx));
        let reuse = elide_repeats && matches!(&last, Some((prev, _)) if *prev == sample);
        if reuse {
            stats.frames_elided += 1;
        } else {
            let frame = compositor.render_sample(cache, sample, &inputs.layout, width, height)?;
            last = Some((sample, frame));
            stats.frames_rendered += 1;
        }
        if let Some((_, frame)) = &last {
            sink.push_frame(idx, frame)?;
            hasher.update(&frame.data);
            stats.frames_total += 1;
        }
    }
    sink.end()?;
    stats.digest = hasher.digest();
    Ok(stats)
}

// Keep the first root cause; a cancellation only wins when nothing else failed.
fn record_failure(slot: &Mutex<Option<HudError>>, e: HudError) {
    let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.as_ref() {
        None => *guard = Some(e),
        Some(prev) if prev.is_cancelled() && !e.is_cancelled() => *guard = Some(e),
        Some(_) => {}
    }
}

pub(crate) fn remove_best_effort(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "cleanup failed"),
    }
}

fn build_thread_pool(threads: Option<usize>) -> HudResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(HudError::validation("worker thread count must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("ridehud-render-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| HudError::validation(format!("failed to build worker pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/scheduler.rs"]
mod tests;
