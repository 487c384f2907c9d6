use super::*;

const GOPRO: &str = r#"{
  "streams": [
    {"codec_type": "audio", "duration": "61.0"},
    {
      "codec_type": "video",
      "width": 3840,
      "height": 2160,
      "avg_frame_rate": "30000/1001",
      "r_frame_rate": "30000/1001",
      "duration": "60.060000",
      "bit_rate": "60000000",
      "tags": {"creation_time": "2024-06-01T09:30:18.000000Z"}
    }
  ],
  "format": {
    "duration": "60.100000",
    "bit_rate": "60200000",
    "tags": {"creation_time": "2024-06-01T09:30:20.000000Z"}
  }
}"#;

#[test]
fn reads_the_video_stream_and_container_tags() {
    let meta = VideoMetadata::from_ffprobe_json(GOPRO).unwrap();
    assert_eq!((meta.width, meta.height), (3840, 2160));
    assert_eq!(meta.fps, Fps::new(30000, 1001).unwrap());
    approx::assert_relative_eq!(meta.duration, 60.06);
    assert_eq!(meta.bitrate, Some(60_000_000));
    // Container tag wins over the stream tag.
    assert_eq!(
        meta.creation_time.unwrap().to_rfc3339(),
        "2024-06-01T09:30:20+00:00"
    );
}

#[test]
fn falls_back_to_container_duration_and_stream_tag() {
    let json = r#"{
      "streams": [{
        "codec_type": "video", "width": 1920, "height": 1080,
        "avg_frame_rate": "0/0", "r_frame_rate": "25/1",
        "tags": {"creation_time": "2024-06-01 09:30:18"}
      }],
      "format": {"duration": "12.5"}
    }"#;
    let meta = VideoMetadata::from_ffprobe_json(json).unwrap();
    approx::assert_relative_eq!(meta.duration, 12.5);
    assert_eq!(meta.fps, Fps::new(25, 1).unwrap());
    assert!(meta.creation_time.is_some());
    assert_eq!(meta.bitrate, None);
}

#[test]
fn missing_creation_time_is_not_an_error() {
    let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360,
        "avg_frame_rate": "30/1", "duration": "3.0"}]}"#;
    let meta = VideoMetadata::from_ffprobe_json(json).unwrap();
    assert_eq!(meta.creation_time, None);
}

#[test]
fn rejects_unusable_streams() {
    let audio_only = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3"}}"#;
    assert_eq!(
        VideoMetadata::from_ffprobe_json(audio_only).unwrap_err().phase(),
        "ingest"
    );
    let no_size = r#"{"streams": [{"codec_type": "video", "avg_frame_rate": "30/1", "duration": "3"}]}"#;
    assert!(VideoMetadata::from_ffprobe_json(no_size).is_err());
    assert!(VideoMetadata::from_ffprobe_json("not json").is_err());
}

#[test]
fn missing_video_file_is_an_input_error() {
    let err = probe_video(Path::new("/definitely/not/here.mp4")).unwrap_err();
    assert_eq!(err.phase(), "ingest");
}
