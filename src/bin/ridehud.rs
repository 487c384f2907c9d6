use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ridehud", version)]
struct Cli {
    /// Log debug output (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sync offset between a video and a FIT activity as JSON.
    Sync(SyncArgs),
    /// Print video metadata as JSON (requires `ffprobe` on PATH).
    Info(InfoArgs),
    /// Render one video frame with the overlay as a PNG.
    Preview(PreviewArgs),
    /// Render the overlay for the whole video and composite it (requires `ffmpeg`).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct SyncArgs {
    /// FIT activity file.
    #[arg(long)]
    fit: PathBuf,

    /// Source video.
    #[arg(long)]
    video: PathBuf,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    #[arg(long)]
    video: PathBuf,
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    /// FIT activity file.
    #[arg(long)]
    fit: PathBuf,

    /// Source video.
    #[arg(long)]
    video: PathBuf,

    /// Layout as a JSON file path or an inline JSON object.
    #[arg(long)]
    layout: Option<String>,

    /// Sync offset in seconds, replacing the one computed from the video creation time.
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Map tile URL template with {z}/{x}/{y} placeholders.
    #[arg(long, default_value = ridehud::OSM_TILE_URL)]
    tile_url: String,

    /// Tile budget for the map background; the zoom is lowered until it fits.
    #[arg(long, default_value_t = 16)]
    max_tiles: usize,

    /// Skip map tiles entirely (the map component is left out).
    #[arg(long)]
    no_tiles: bool,

    /// TTF/OTF face for the readouts (default: bundled DejaVu Sans Bold).
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    overlay: OverlayArgs,

    /// Video-local time in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    overlay: OverlayArgs,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// crf-visually-lossless, match-source-bitrate or fast-preview.
    #[arg(long, default_value = "crf-visually-lossless")]
    quality: ridehud::EncodeQuality,

    #[arg(long, default_value_t = 30.0)]
    chunk_seconds: f64,

    /// Maximum assets joined by one concatenation.
    #[arg(long, default_value_t = 10)]
    batch_size: usize,

    /// Worker threads (default: available parallelism).
    #[arg(long)]
    threads: Option<usize>,

    /// Abort the job after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Keep chunk and merge files in the work directory.
    #[arg(long)]
    keep_intermediates: bool,

    /// Parent directory for the job's scratch files (default: system temp dir).
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Redraw every frame, even when it shows the same telemetry second as the previous one.
    #[arg(long)]
    no_elide: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    // stdout carries JSON and progress lines.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Sync(args) => cmd_sync(args),
        Command::Info(args) => cmd_info(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_sync(args: SyncArgs) -> anyhow::Result<()> {
    let meta = ridehud::probe_video(&args.video)?;
    let track = match ridehud::TelemetryTrack::from_fit_file(&args.fit) {
        Ok(track) => Some(track),
        Err(e) => {
            tracing::warn!(error = %e, "telemetry unusable");
            None
        }
    };
    let outcome = ridehud::synchronize(meta.creation_time, track.as_ref());
    println!("{}", serde_json::to_string(&outcome.report())?);
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let meta = ridehud::probe_video(&args.video)?;
    let json = serde_json::json!({
        "width": meta.width,
        "height": meta.height,
        "duration": meta.duration,
        "fps": meta.fps.as_f64(),
        "creation_time": meta.creation_time.map(|t| t.to_rfc3339()),
        "bitrate": meta.bitrate,
    });
    println!("{json}");
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let layout = read_layout(args.overlay.layout.as_deref())?;
    let tiles = make_tiles(&args.overlay)?;
    let font = load_font(args.overlay.font.as_deref())?;
    let req = ridehud::PreviewRequest {
        fit: args.overlay.fit,
        video: args.overlay.video,
        at_secs: args.at,
        layout,
        offset_override: args.overlay.offset,
        output: args.out,
        font,
    };
    let sync = ridehud::render_preview(&req, tiles)?;
    if sync.is_degraded() {
        eprintln!("warning: {}", sync.report().message);
    }
    eprintln!("wrote {}", req.output.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let layout = read_layout(args.overlay.layout.as_deref())?;
    let tiles = make_tiles(&args.overlay)?;
    let font = load_font(args.overlay.font.as_deref())?;
    let opts = ridehud::RenderJobOpts {
        chunk_secs: args.chunk_seconds,
        batch_size: args.batch_size,
        threads: args.threads,
        timeout: args.timeout_secs.map(Duration::from_secs),
        quality: args.quality,
        elide_repeats: !args.no_elide,
        keep_intermediates: args.keep_intermediates,
        work_dir: args.work_dir,
        offset_override: args.overlay.offset,
        font,
    };
    let progress = ridehud::ProgressReporter::stdout();
    let summary = ridehud::run_render_job(
        &args.overlay.fit,
        &args.overlay.video,
        &args.out,
        layout,
        tiles,
        &opts,
        &progress,
        &ridehud::CancelToken::new(),
    )
    .with_context(|| format!("render '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames in {} chunks, offset {:+.3}s)",
        summary.output.display(),
        summary.frames,
        summary.chunks,
        summary.sync.offset.secs()
    );
    Ok(())
}

fn read_layout(arg: Option<&str>) -> anyhow::Result<ridehud::LayoutConfig> {
    match arg {
        Some(arg) => ridehud::LayoutConfig::from_arg(arg).context("load layout"),
        None => Ok(ridehud::LayoutConfig::default()),
    }
}

fn load_font(path: Option<&Path>) -> anyhow::Result<ridehud::HudFont> {
    match path {
        Some(path) => ridehud::HudFont::from_file(path)
            .with_context(|| format!("load font '{}'", path.display())),
        None => Ok(ridehud::HudFont::bundled()),
    }
}

fn make_tiles(args: &OverlayArgs) -> anyhow::Result<Arc<dyn ridehud::TileProvider>> {
    if args.no_tiles {
        return Ok(Arc::new(ridehud::NoTiles));
    }
    let provider = ridehud::HttpTileProvider::new(args.tile_url.clone())
        .with_context(|| format!("tile provider '{}'", args.tile_url))?
        .with_max_tiles(args.max_tiles);
    Ok(Arc::new(provider))
}
