use chrono::{TimeDelta, TimeZone, Utc};

use super::*;
use crate::encode::sink::RawChunkWriter;
use crate::pipeline::chunk::plan_chunks;
use crate::telemetry::sample::RawRecord;
use crate::tiles::SolidTileProvider;

fn inputs(seconds: i64) -> RenderInputs {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let records: Vec<RawRecord> = (0..seconds)
        .map(|s| RawRecord {
            speed: Some(6.0 + s as f64 * 0.1),
            power: Some(180.0 + s as f64),
            cadence: Some(85.0),
            altitude: Some(40.0 + s as f64),
            distance: Some(s as f64 * 6.0),
            position_lat: Some(614_400_000 + (s as i32) * 100),
            position_long: Some(-1_431_655),
            ..RawRecord::at(t0 + TimeDelta::seconds(s))
        })
        .collect();
    RenderInputs {
        track: Arc::new(TelemetryTrack::from_records(&records).unwrap()),
        offset: SyncOffset(2.0),
        layout: Arc::new(LayoutConfig::default()),
        tiles: Arc::new(SolidTileProvider {
            color: [40, 120, 60, 255],
        }),
        canvas: Canvas::new(160, 90).unwrap(),
        fps: Fps::new(5, 1).unwrap(),
        font: HudFont::bundled(),
    }
}

fn run(
    inputs: &RenderInputs,
    threads: usize,
    elide: bool,
    dir: &Path,
) -> HudResult<Vec<ChunkResult>> {
    let chunks = plan_chunks(6.0, 2.0, inputs.fps).unwrap();
    let mut scheduler = ChunkScheduler::new(
        Arc::new(RawChunkWriter),
        SchedulerOpts {
            threads: Some(threads),
            elide_repeats: elide,
        },
    );
    scheduler.run(inputs, &chunks, dir, &CancelToken::new(), &|_, _| {})
}

#[test]
fn results_come_back_in_chunk_order() {
    let dir = tempfile::tempdir().unwrap();
    let results = run(&inputs(20), 3, true, dir.path()).unwrap();
    assert_eq!(results.iter().map(|r| r.index).collect::<Vec<_>>(), [0, 1, 2]);
    for r in &results {
        assert_eq!(r.stats.frames_total, 10);
        assert!(r.path.ends_with(format!("overlay_chunk_{:05}.rgba", r.index)));
        let len = std::fs::metadata(&r.path).unwrap().len();
        assert_eq!(len, 10 * 160 * 90 * 4);
    }
}

#[test]
fn output_does_not_depend_on_thread_count() {
    let inputs = inputs(20);
    let a_dir = tempfile::tempdir().unwrap();
    let b_dir = tempfile::tempdir().unwrap();
    let a = run(&inputs, 1, true, a_dir.path()).unwrap();
    let b = run(&inputs, 4, true, b_dir.path()).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.stats.digest, y.stats.digest);
        assert_eq!(std::fs::read(&x.path).unwrap(), std::fs::read(&y.path).unwrap());
    }
}

#[test]
fn repeat_elision_does_not_change_frames() {
    let inputs = inputs(20);
    let a_dir = tempfile::tempdir().unwrap();
    let b_dir = tempfile::tempdir().unwrap();
    let elided = run(&inputs, 2, true, a_dir.path()).unwrap();
    let full = run(&inputs, 2, false, b_dir.path()).unwrap();
    for (x, y) in elided.iter().zip(&full) {
        assert_eq!(x.stats.digest, y.stats.digest);
        assert!(x.stats.frames_elided > 0);
        assert_eq!(y.stats.frames_elided, 0);
        assert_eq!(x.stats.frames_rendered + x.stats.frames_elided, 10);
    }
}

#[test]
fn progress_callback_counts_every_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = inputs(20);
    let chunks = plan_chunks(6.0, 2.0, inputs.fps).unwrap();
    let seen = Mutex::new(Vec::new());
    let mut scheduler = ChunkScheduler::new(Arc::new(RawChunkWriter), SchedulerOpts::default());
    assert_eq!(scheduler.state(), JobState::Pending);
    scheduler
        .run(&inputs, &chunks, dir.path(), &CancelToken::new(), &|done, total| {
            seen.lock().unwrap().push((done, total));
        })
        .unwrap();
    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, [(1, 3), (2, 3), (3, 3)]);
    assert_eq!(scheduler.state(), JobState::Done);
}

struct FailOn(usize);

impl ChunkWriter for FailOn {
    fn extension(&self) -> &str {
        "rgba"
    }

    fn open(&self, path: &Path) -> HudResult<Box<dyn FrameSink>> {
        if path.ends_with(crate::pipeline::chunk::chunk_file_name(self.0, "rgba")) {
            return Err(HudError::encode("disk full"));
        }
        RawChunkWriter.open(path)
    }
}

#[test]
fn one_failing_chunk_fails_the_job_without_cancelling_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = inputs(20);
    let chunks = plan_chunks(6.0, 2.0, inputs.fps).unwrap();
    let cancel = CancelToken::new();
    let mut scheduler = ChunkScheduler::new(
        Arc::new(FailOn(1)),
        SchedulerOpts {
            threads: Some(2),
            elide_repeats: true,
        },
    );
    let err = scheduler
        .run(&inputs, &chunks, dir.path(), &cancel, &|_, _| {})
        .unwrap_err();
    assert!(matches!(err, HudError::Render { chunk: 1, .. }), "{err}");
    assert!(err.to_string().contains("disk full"));
    assert!(!cancel.is_cancelled());
    assert_eq!(scheduler.state(), JobState::Failed);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    // The same token still drives a clean run afterwards.
    let mut retry = ChunkScheduler::new(Arc::new(RawChunkWriter), SchedulerOpts::default());
    let results = retry
        .run(&inputs, &chunks, dir.path(), &cancel, &|_, _| {})
        .unwrap();
    assert_eq!(results.len(), 3);
}

struct AlwaysFails;

impl ChunkWriter for AlwaysFails {
    fn extension(&self) -> &str {
        "rgba"
    }

    fn open(&self, _path: &Path) -> HudResult<Box<dyn FrameSink>> {
        Err(HudError::encode("boom"))
    }
}

#[test]
fn failed_run_leaves_a_shared_token_clean() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = inputs(20);
    let chunks = plan_chunks(6.0, 2.0, inputs.fps).unwrap();
    let shared = CancelToken::new();
    let observer = shared.clone();
    let mut scheduler = ChunkScheduler::new(
        Arc::new(AlwaysFails),
        SchedulerOpts {
            threads: Some(3),
            elide_repeats: true,
        },
    );
    let err = scheduler
        .run(&inputs, &chunks, dir.path(), &shared, &|_, _| {})
        .unwrap_err();
    assert!(err.to_string().contains("boom"), "{err}");
    assert!(!err.is_cancelled());
    assert!(!observer.is_cancelled());
}

#[test]
fn cancelled_token_stops_the_job() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = inputs(20);
    let chunks = plan_chunks(6.0, 2.0, inputs.fps).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut scheduler = ChunkScheduler::new(Arc::new(RawChunkWriter), SchedulerOpts::default());
    let err = scheduler
        .run(&inputs, &chunks, dir.path(), &cancel, &|_, _| {})
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn zero_threads_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&inputs(20), 0, true, dir.path()).unwrap_err();
    assert_eq!(err.phase(), "validate");
}
