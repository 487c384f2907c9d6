use super::*;

#[test]
fn metric_positions_scale_with_output_height() {
    let grade = METRIC_SLOTS[4];
    assert_eq!(grade.origin(1.0), (50, 850));
    assert_eq!(grade.origin(0.5), (25, 425));
    assert_eq!(METRIC_SLOTS[0].label(SpeedUnit::Kph), "KM/H");
    assert_eq!(grade.label(SpeedUnit::Mph), "GRADIENT");
}

#[test]
fn values_format_to_fixed_precision() {
    let speed = METRIC_SLOTS[0];
    let grade = METRIC_SLOTS[4];
    assert_eq!(speed.format(Some(23.6)), "24");
    assert_eq!(speed.format(None), "0");
    assert_eq!(speed.format(Some(f64::NAN)), "0");
    assert_eq!(grade.format(Some(4.24)), "4.2%");
    assert_eq!(grade.format(Some(-3.0)), "-3.0%");
    assert_eq!(grade.format(Some(-0.01)), "0.0%");
    assert_eq!(grade.format(None), "0.0%");
}

#[test]
fn map_and_elevation_boxes() {
    let cfg = ComponentConfig::default();
    assert_eq!(
        map_rect(&cfg, 1.0, 1920),
        PixelRect {
            x: 1920 - 300 - 50,
            y: 50,
            width: 300,
            height: 300
        }
    );
    let e = elevation_rect(&cfg, 2.0, 3840, 2160);
    assert_eq!((e.x, e.y, e.width, e.height), (100, 2160 - 300 - 100, 3640, 300));
    assert_eq!(marker_radius(&cfg, 0.5), 4.0);
    assert_eq!(marker_radius(&cfg, 2.0), 12.0);
}
