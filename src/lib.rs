//! ridehud draws telemetry heads-up overlays onto action-camera video.
//!
//! A FIT activity is resampled onto a one-second grid, aligned with the video through its
//! creation time, and rendered frame by frame into alpha-preserving chunk assets by a pool
//! of workers. Chunks are concatenated in rounds and composited onto the source with ffmpeg.
//!
//! - Load a [`TelemetryTrack`] and [`synchronize`] it with a probed [`VideoMetadata`]
//! - Render single frames with a [`FrameCompositor`] and its [`AssetCache`]
//! - Run whole jobs with [`run_render_job`], or stills with [`render_preview`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod encode;
pub(crate) mod layout;
pub(crate) mod media;
pub(crate) mod pipeline;
pub(crate) mod render;
pub(crate) mod sync;
pub(crate) mod telemetry;
pub(crate) mod tiles;

pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
pub use crate::foundation::error::{HudError, HudResult};

pub use crate::encode::compose::{ComposeRequest, EncodeQuality, compose, parse_progress_line};
pub use crate::encode::concat::{ByteConcat, Concatenator, FfmpegConcat, write_manifest};
pub use crate::encode::ffmpeg::{
    FfmpegChunkWriter, FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path, is_ffprobe_on_path,
};
pub use crate::encode::sink::{
    ChunkWriter, FrameSink, InMemorySink, RawChunkWriter, RawFileSink, SinkConfig,
};
pub use crate::layout::config::{Component, ComponentConfig, LayoutConfig, SpeedUnit};
pub use crate::layout::hud::{PixelRect, elevation_rect, map_rect};
pub use crate::media::frame::extract_frame;
pub use crate::media::probe::{VideoMetadata, probe_video};
pub use crate::pipeline::chunk::{RenderChunk, chunk_file_name, plan_chunks};
pub use crate::pipeline::job::{
    OverlaySummary, RenderJobOpts, RenderSummary, render_overlay, run_render_job,
};
pub use crate::pipeline::merge::{HierarchicalMerger, MergeReport, merge_rounds};
pub use crate::pipeline::preview::{PreviewRequest, composite_preview, render_preview};
pub use crate::pipeline::progress::{PhaseBand, ProgressReporter};
pub use crate::pipeline::scheduler::{
    ChunkResult, ChunkScheduler, ChunkStats, JobState, RenderInputs, SchedulerOpts, render_chunk,
};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::cache::{AssetCache, CacheSlot, CachedRaster, ElevationAsset, MapAsset};
pub use crate::render::compositor::FrameCompositor;
pub use crate::render::text::{HudFont, TextBrush, TextEngine};
pub use crate::sync::{
    DegradedReason, SyncOffset, SyncOutcome, SyncReport, SyncSource, parse_creation_time,
    synchronize,
};
pub use crate::telemetry::fit::{parse_fit_records, read_fit_file};
pub use crate::telemetry::sample::{GeoPoint, RawRecord, TelemetrySample};
pub use crate::telemetry::track::{GeoBounds, TelemetryTrack};
pub use crate::tiles::http::{HttpTileProvider, OSM_TILE_URL};
pub use crate::tiles::{NoTiles, SolidTileProvider, TileError, TileProvider};
