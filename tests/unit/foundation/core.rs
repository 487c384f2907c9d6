use super::*;

#[test]
fn fps_parses_ffprobe_rates() {
    assert_eq!(Fps::parse_rational("30000/1001").unwrap(), Fps { num: 30000, den: 1001 });
    assert_eq!(Fps::parse_rational("25").unwrap(), Fps { num: 25, den: 1 });
    assert!(Fps::parse_rational("0/0").is_err());
    assert!(Fps::parse_rational("abc").is_err());
}

#[test]
fn secs_to_frames_ceil_snaps_whole_frames() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
    assert_eq!(fps.secs_to_frames_ceil(30.0), 900);
    assert_eq!(fps.secs_to_frames_ceil(1.01), 31);

    let ntsc = Fps::new(30000, 1001).unwrap();
    // 30 s at 29.97 is 899.1 frames; frame 900 is the first at or after 30 s.
    assert_eq!(ntsc.secs_to_frames_ceil(30.0), 900);
    let t = ntsc.frame_to_secs(FrameIndex(900));
    assert_eq!(ntsc.secs_to_frames_ceil(t), 900);
}

#[test]
fn frame_range_len_and_contains() {
    let r = FrameRange::new(FrameIndex(3), FrameIndex(7)).unwrap();
    assert_eq!(r.len_frames(), 4);
    assert!(r.contains(FrameIndex(3)));
    assert!(!r.contains(FrameIndex(7)));
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(4)).is_err());
}

#[test]
fn canvas_rejects_degenerate_sizes() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert_eq!(Canvas::new(4, 2).unwrap().rgba_len(), 32);
}
