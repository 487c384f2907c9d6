use super::*;
use chrono::TimeZone;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn track_with(n: i64, f: impl Fn(i64, &mut RawRecord)) -> TelemetryTrack {
    let records: Vec<RawRecord> = (0..n)
        .map(|s| {
            let mut r = RawRecord::at(t0() + TimeDelta::seconds(s));
            f(s, &mut r);
            r
        })
        .collect();
    TelemetryTrack::from_records(&records).unwrap()
}

#[test]
fn midpoint_queries_resolve_to_the_earlier_sample() {
    let track = track_with(5, |s, r| r.power = Some(s as f64));
    let q = t0() + TimeDelta::milliseconds(2500);
    assert_eq!(track.nearest_index(q), 2);
    assert_eq!(track.nearest(q).power, Some(2.0));

    let q = t0() + TimeDelta::milliseconds(2501);
    assert_eq!(track.nearest_index(q), 3);
}

#[test]
fn queries_outside_the_track_clamp() {
    let track = track_with(5, |_, _| {});
    assert_eq!(track.nearest_index_at_offset(-30.0), 0);
    assert_eq!(track.nearest_index_at_offset(1e6), 4);
    assert_eq!(track.nearest_index_at_offset(f64::NAN), 0);
    assert_eq!(track.duration_secs(), 4.0);
    assert_eq!(track.end() - track.start(), TimeDelta::seconds(4));
}

#[test]
fn geo_bounds_skip_null_island_and_pad() {
    let track = track_with(4, |s, r| {
        if s > 0 {
            r.position_lat = Some(1 << 28);
            r.position_long = Some((1 << 28) + (s as i32) * 1000);
        }
    });
    let b = track.geo_bounds().unwrap();
    assert_eq!(b.min_lat, b.max_lat);
    assert!(b.min_lat > 20.0);

    let padded = b.padded(MAP_PADDING_FRACTION, MAP_MIN_PADDING_DEG);
    assert!((padded.max_lat - padded.min_lat - 0.002).abs() < 1e-12);
    assert!(padded.contains(GeoPoint::new(b.min_lat, b.min_lon)));
    assert_eq!(track.polyline(5).len(), 1);
}

#[test]
fn elevation_profile_is_down_sampled() {
    let track = track_with(2000, |s, r| {
        r.altitude = Some(s as f64);
        r.distance = Some(s as f64 * 4.0);
    });
    let profile = track.elevation_profile(500);
    assert_eq!(profile.len(), 500);
    assert_eq!(profile[1], (16.0, 4.0));

    let flat = track_with(3, |_, _| {});
    assert!(flat.elevation_profile(500).is_empty());
}

#[test]
fn elevation_profile_never_exceeds_its_budget() {
    for n in [499, 501, 999, 1001] {
        let track = track_with(n, |s, r| r.altitude = Some(s as f64));
        let profile = track.elevation_profile(500);
        assert!(profile.len() <= 500, "{n} samples gave {}", profile.len());
        assert!(profile.len() >= 250, "{n} samples gave {}", profile.len());
    }
}

#[test]
fn from_samples_rejects_gaps() {
    let a = TelemetrySample::empty(t0());
    let b = TelemetrySample::empty(t0() + TimeDelta::seconds(2));
    assert!(TelemetryTrack::from_samples(vec![a.clone(), b]).is_err());
    assert!(TelemetryTrack::from_samples(Vec::new()).is_err());
    assert_eq!(TelemetryTrack::from_samples(vec![a]).unwrap().len(), 1);
}
