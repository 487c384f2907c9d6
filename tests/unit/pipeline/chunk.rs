use super::*;

fn fps(num: u32, den: u32) -> Fps {
    Fps::new(num, den).unwrap()
}

#[test]
fn last_chunk_is_shorter() {
    let chunks = plan_chunks(65.0, 30.0, fps(30, 1)).unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].frames, FrameRange::new(FrameIndex(0), FrameIndex(900)).unwrap());
    assert_eq!(chunks[1].frames.start, FrameIndex(900));
    assert_eq!(chunks[2].frames, FrameRange::new(FrameIndex(1800), FrameIndex(1950)).unwrap());
    approx::assert_relative_eq!(chunks[2].duration(), 5.0);
    assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), [0, 1, 2]);
}

#[test]
fn fractional_rates_tile_without_gaps() {
    let rate = fps(30000, 1001);
    let duration = 125.3;
    let chunks = plan_chunks(duration, 30.0, rate).unwrap();
    let mut next = 0;
    for c in &chunks {
        assert_eq!(c.frames.start.0, next);
        for k in [c.frames.start.0, c.frames.end.0 - 1] {
            let t = rate.frame_to_secs(FrameIndex(k));
            assert!(t >= c.start - 1e-9 && t < c.end, "frame {k} at {t} outside chunk {}", c.index);
        }
        next = c.frames.end.0;
    }
    assert_eq!(next, rate.secs_to_frames_ceil(duration));
}

#[test]
fn short_video_is_one_chunk() {
    let chunks = plan_chunks(4.0, 30.0, fps(25, 1)).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].frames.len_frames(), 100);
    approx::assert_relative_eq!(chunks[0].local_time(fps(25, 1), FrameIndex(50)), 2.0);
}

#[test]
fn names_sort_by_index() {
    assert_eq!(chunk_file_name(7, "mov"), "overlay_chunk_00007.mov");
    assert!(chunk_file_name(9, "mov") < chunk_file_name(10, "mov"));
}

#[test]
fn rejects_bad_parameters() {
    assert!(plan_chunks(0.0, 30.0, fps(30, 1)).is_err());
    assert!(plan_chunks(f64::NAN, 30.0, fps(30, 1)).is_err());
    assert!(plan_chunks(10.0, 0.01, fps(30, 1)).is_err());
    assert!(plan_chunks(10.0, 0.0, fps(30, 1)).is_err());
}
