use super::*;
use chrono::TimeZone;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn at(secs: i64) -> RawRecord {
    RawRecord::at(t0() + TimeDelta::seconds(secs))
}

#[test]
fn grid_has_one_sample_per_second() {
    let records: Vec<RawRecord> = [0i64, 1, 4, 9]
        .iter()
        .map(|&s| RawRecord {
            speed: Some(5.0),
            ..at(s)
        })
        .collect();
    let samples = resample(&records).unwrap();
    assert_eq!(samples.len(), 10);
    for (i, s) in samples.iter().enumerate() {
        assert_eq!(s.timestamp, t0() + TimeDelta::seconds(i as i64));
    }
}

#[test]
fn sub_second_records_are_averaged_into_their_bucket() {
    let mut a = at(0);
    a.power = Some(100.0);
    let mut b = RawRecord::at(t0() + TimeDelta::milliseconds(600));
    b.power = Some(200.0);
    let samples = resample(&[b, a]).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].power, Some(150.0));
}

#[test]
fn long_speed_gap_becomes_zero_while_heart_rate_interpolates() {
    let mut records = Vec::new();
    for s in 0..=10i64 {
        let mut r = at(s);
        if !(3..=7).contains(&s) {
            r.speed = Some(8.0);
        }
        if s != 5 {
            r.heart_rate = Some(if s < 5 { 120.0 } else { 130.0 });
        }
        records.push(r);
    }
    let samples = resample(&records).unwrap();
    for s in 3..=7 {
        assert_eq!(samples[s].speed, Some(0.0), "second {s}");
    }
    assert_eq!(samples[2].speed, Some(8.0));
    assert_eq!(samples[5].heart_rate, Some(125.0));
}

#[test]
fn short_dynamic_gaps_are_interpolated() {
    let mut records = vec![at(0), at(3)];
    records[0].cadence = Some(60.0);
    records[1].cadence = Some(90.0);
    let samples = resample(&records).unwrap();
    let cad: Vec<f64> = samples.iter().map(|s| s.cadence.unwrap()).collect();
    assert_eq!(cad, vec![60.0, 70.0, 80.0, 90.0]);
}

#[test]
fn bounded_interpolation_leaves_edges_and_long_runs() {
    let mut v = vec![None, Some(1.0), None, None, None, Some(5.0), None];
    interpolate_bounded(&mut v, 2);
    assert_eq!(v, vec![None, Some(1.0), None, None, None, Some(5.0), None]);
}

#[test]
fn heart_rate_holds_after_last_reading_but_not_before_first() {
    let mut v = vec![None, Some(100.0), None, Some(110.0), None, None];
    interpolate_full(&mut v);
    assert_eq!(
        v,
        vec![
            None,
            Some(100.0),
            Some(105.0),
            Some(110.0),
            Some(110.0),
            Some(110.0)
        ]
    );
}

#[test]
fn positions_forward_fill_and_convert_from_semicircles() {
    let mut a = at(0);
    a.position_lat = Some(1 << 30);
    a.position_long = Some(-(1 << 30));
    let b = at(2);
    let samples = resample(&[a, b]).unwrap();
    let p = samples[2].position.unwrap();
    assert_eq!(p.lat, 90.0);
    assert_eq!(p.lon, -90.0);
}

#[test]
fn enhanced_values_supersede_legacy() {
    let mut r = at(0);
    r.speed = Some(1.0);
    r.enhanced_speed = Some(2.0);
    r.altitude = Some(10.0);
    r.enhanced_altitude = Some(20.0);
    let samples = resample(&[r]).unwrap();
    assert_eq!(samples[0].speed, Some(2.0));
    assert_eq!(samples[0].altitude, Some(20.0));
}

#[test]
fn never_present_fields_stay_absent() {
    let mut r = at(0);
    r.speed = Some(3.0);
    let samples = resample(&[r, at(1)]).unwrap();
    assert_eq!(samples[1].speed, Some(0.0));
    assert!(samples.iter().all(|s| s.power.is_none()));
    assert!(samples.iter().all(|s| s.position.is_none()));
    assert!(samples.iter().all(|s| s.grade.is_none()));
}

#[test]
fn steep_climb_clamps_grade_to_forty() {
    let records: Vec<RawRecord> = (0..12i64)
        .map(|s| RawRecord {
            altitude: Some(100.0 + 10.0 * s as f64),
            distance: Some(10.0 * s as f64),
            ..at(s)
        })
        .collect();
    let samples = resample(&records).unwrap();
    for s in &samples[3..samples.len() - 2] {
        assert_eq!(s.grade, Some(40.0));
    }
    assert_eq!(samples[0].grade, Some(0.0));
    assert_eq!(samples[1].grade, Some(0.0));
    assert_eq!(samples[samples.len() - 1].grade, Some(0.0));
}

#[test]
fn stationary_seconds_do_not_produce_grade() {
    let alt = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
    let dist = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.2];
    assert!(derive_grade_pct(&alt, &dist).iter().all(|&g| g == 0.0));
}

#[test]
fn records_without_timestamps_are_discarded() {
    let stray = RawRecord {
        power: Some(999.0),
        ..RawRecord::default()
    };
    let mut r = at(0);
    r.power = Some(10.0);
    let samples = resample(&[stray, r]).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].power, Some(10.0));
}

#[test]
fn empty_input_is_an_input_error() {
    let err = resample(&[RawRecord::default()]).unwrap_err();
    assert_eq!(err.phase(), "ingest");
}
