use super::*;
use crate::telemetry::sample::RawRecord;
use chrono::{TimeDelta, TimeZone, Utc};

fn climb(with_altitude: bool) -> TelemetryTrack {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let records: Vec<RawRecord> = (0..100)
        .map(|s| RawRecord {
            distance: Some(s as f64 * 10.0),
            altitude: with_altitude.then_some(100.0 + s as f64),
            ..RawRecord::at(t0 + TimeDelta::seconds(s))
        })
        .collect();
    TelemetryTrack::from_records(&records).unwrap()
}

fn alpha(img: &image::RgbaImage, x: u32, y: u32) -> u8 {
    img.get_pixel(x, y).0[3]
}

#[test]
fn no_altitude_means_no_profile() {
    assert!(build_elevation_asset(&climb(false), 200, 50).unwrap().is_none());
}

#[test]
fn profile_fills_below_the_curve() {
    let asset = build_elevation_asset(&climb(true), 200, 50).unwrap().unwrap();
    assert_eq!(asset.min_distance, 0.0);
    assert_eq!(asset.max_distance, 990.0);
    let mut raster = asset.raster.clone();
    let img = raster.at_size(200, 50);
    // Rising line: the bottom-right is filled, the top-left is empty.
    assert!(alpha(img, 190, 45) > 0);
    assert_eq!(alpha(img, 10, 5), 0);
}

#[test]
fn marker_tracks_current_distance() {
    let mut asset = build_elevation_asset(&climb(true), 200, 50).unwrap().unwrap();
    let mut frame = FrameRGBA::transparent(300, 100);
    let mut layer = VectorLayer::new();
    layer.begin(300, 100).unwrap();
    let rect = PixelRect {
        x: 50,
        y: 40,
        width: 200,
        height: 50,
    };
    draw_elevation(
        &mut frame,
        &mut layer,
        &mut asset,
        &ComponentConfig::default(),
        rect,
        Some(495.0),
    )
    .unwrap();
    let overlay = layer.finish().unwrap();
    let px = |x: u32, y: u32| {
        let i = ((y * 300 + x) * 4) as usize;
        [overlay[i], overlay[i + 1], overlay[i + 2], overlay[i + 3]]
    };
    // 495 m of 990 m lands halfway across the strip.
    assert_eq!(px(150, 45), [255, 255, 0, 255]);
    assert_eq!(px(140, 45)[3], 0);
}
