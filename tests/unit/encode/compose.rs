use super::*;

fn request(quality: EncodeQuality, bitrate: Option<u64>) -> ComposeRequest {
    ComposeRequest {
        source: "in.mp4".into(),
        overlay: "ovr.mov".into(),
        output: "out.mp4".into(),
        quality,
        source_bitrate: bitrate,
        duration_secs: 10.0,
    }
}

fn window(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1).cloned())
}

#[test]
fn quality_presets() {
    let crf = request(EncodeQuality::CrfVisuallyLossless, None).args();
    assert_eq!(window(&crf, "-crf").as_deref(), Some("18"));
    assert_eq!(window(&crf, "-preset").as_deref(), Some("slow"));

    let fast = request(EncodeQuality::FastPreview, None).args();
    assert_eq!(window(&fast, "-crf").as_deref(), Some("28"));
    assert_eq!(window(&fast, "-preset").as_deref(), Some("ultrafast"));

    let matched = request(EncodeQuality::MatchSourceBitrate, Some(20_000_000)).args();
    assert_eq!(window(&matched, "-b:v").as_deref(), Some("20000000"));

    let fallback = request(EncodeQuality::MatchSourceBitrate, None).args();
    assert_eq!(window(&fallback, "-crf").as_deref(), Some("18"));
    assert!(window(&fallback, "-b:v").is_none());
}

#[test]
fn filter_graph_maps_overlay_and_optional_audio() {
    let args = request(EncodeQuality::FastPreview, None).args();
    assert_eq!(window(&args, "-filter_complex").as_deref(), Some(OVERLAY_FILTER));
    assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "0:a?"));
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    assert!(args.iter().any(|a| a == "-shortest"));
}

#[test]
fn progress_lines() {
    assert_eq!(parse_progress_line("out_time_us=2500000"), Some(2.5));
    assert_eq!(parse_progress_line("out_time_ms=1000000"), Some(1.0));
    assert_eq!(parse_progress_line("out_time=00:01:02.500000"), Some(62.5));
    assert_eq!(parse_progress_line("out_time=N/A"), None);
    assert_eq!(parse_progress_line("progress=continue"), None);
}

#[test]
fn quality_names_round_trip() {
    for q in [
        EncodeQuality::CrfVisuallyLossless,
        EncodeQuality::MatchSourceBitrate,
        EncodeQuality::FastPreview,
    ] {
        assert_eq!(q.as_str().parse::<EncodeQuality>().unwrap(), q);
    }
    assert!("lossless".parse::<EncodeQuality>().is_err());
}

#[test]
fn progress_reader_turns_output_time_into_fractions() {
    let lines = "frame=12\nout_time_us=2500000\nprogress=continue\nout_time_us=20000000\n";
    let out = std::io::Cursor::new(lines.as_bytes().to_vec());
    let (rx, handle) = progress_reader(out, 10.0);
    handle.join().unwrap();
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), [0.25, 1.0]);
}

#[cfg(unix)]
#[test]
fn silent_child_is_killed_on_cancel() {
    let mut child = Command::new("sleep")
        .arg("30")
        .stdout(Stdio::null())
        .spawn()
        .unwrap();
    let (_tx, rx) = mpsc::channel::<f64>();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let started = std::time::Instant::now();
    let timer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        trigger.cancel();
    });
    let err = supervise(&mut child, &rx, &cancel, &mut |_| {}).unwrap_err();
    timer.join().unwrap();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(child.try_wait().unwrap().is_some());
}

#[cfg(unix)]
#[test]
fn exit_status_and_progress_come_through() {
    let mut child = Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
    let (tx, rx) = mpsc::channel();
    tx.send(0.4).unwrap();
    let mut seen = Vec::new();
    let status = supervise(&mut child, &rx, &CancelToken::new(), &mut |f| seen.push(f)).unwrap();
    assert_eq!(status.code(), Some(3));
    assert_eq!(seen, [0.4]);
}

#[test]
fn cancelled_token_stops_compose_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let mut req = request(EncodeQuality::FastPreview, None);
    req.output = dir.path().join("out.mp4");
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = compose(&req, &cancel, &mut |_| {}).unwrap_err();
    assert!(err.is_cancelled());
    assert!(!req.output.exists());
}
