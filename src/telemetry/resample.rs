//! 1 Hz resampling and gap filling.
//!
//! Order matters and is fixed: bucket means, then per-field-class fill (forward-fill for
//! positional/cumulative fields, bounded interpolation for dynamic fields, full interpolation
//! for heart rate), then zero for whatever is still undefined, then the derived grade.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::foundation::error::{HudError, HudResult};
use crate::telemetry::sample::{GeoPoint, RawRecord, TelemetrySample};

/// Dynamic fields are interpolated across at most this many missing seconds.
pub const DYNAMIC_GAP_LIMIT_SECS: usize = 2;
/// A second only yields a grade when the rider covered more than this distance.
pub const GRADE_MIN_DISTANCE_M: f64 = 0.5;
/// Grade clamp in percent.
pub const GRADE_CLAMP_PCT: f64 = 40.0;
/// Centered moving-average window for grade.
pub const GRADE_SMOOTH_WINDOW: usize = 5;
/// Upper bound on the grid length; a corrupt timestamp must not allocate for years.
pub const MAX_TRACK_SECONDS: i64 = 7 * 24 * 3600;

/// Per-field column on the 1 Hz grid. `present` records whether any raw record carried the
/// field, which is what separates "missing" from "zero" after filling.
#[derive(Clone, Debug)]
pub(crate) struct Column {
    pub(crate) values: Vec<Option<f64>>,
    pub(crate) present: bool,
}

impl Column {
    fn bucket_mean(
        records: &[(i64, &RawRecord)],
        len: usize,
        get: impl Fn(&RawRecord) -> Option<f64>,
    ) -> Self {
        let mut sums = vec![0.0f64; len];
        let mut counts = vec![0u32; len];
        for (slot, rec) in records {
            if let Some(v) = get(rec) {
                sums[*slot as usize] += v;
                counts[*slot as usize] += 1;
            }
        }
        let present = counts.iter().any(|&c| c > 0);
        let values = sums
            .into_iter()
            .zip(counts)
            .map(|(s, c)| (c > 0).then(|| s / f64::from(c)))
            .collect();
        Self { values, present }
    }

    fn fill_zero(mut self) -> Vec<Option<f64>> {
        if self.present {
            for v in &mut self.values {
                v.get_or_insert(0.0);
            }
        }
        self.values
    }
}

/// Build the uniform 1 Hz sample grid from raw records.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn resample(records: &[RawRecord]) -> HudResult<Vec<TelemetrySample>> {
    let mut stamped: Vec<(DateTime<Utc>, &RawRecord)> = records
        .iter()
        .filter_map(|r| r.timestamp.map(|ts| (ts, r)))
        .collect();
    let dropped = records.len() - stamped.len();
    if dropped > 0 {
        debug!(dropped, "discarded telemetry records without timestamp");
    }
    if stamped.is_empty() {
        return Err(HudError::input(
            "telemetry contains no timestamped records",
        ));
    }
    stamped.sort_by_key(|(ts, _)| *ts);

    let start = floor_to_second(stamped[0].0);
    let end = floor_to_second(stamped[stamped.len() - 1].0);
    let span = (end - start).num_seconds();
    if span > MAX_TRACK_SECONDS {
        return Err(HudError::input(format!(
            "telemetry spans {span} s, more than the supported {MAX_TRACK_SECONDS} s"
        )));
    }
    let len = span as usize + 1;

    let slotted: Vec<(i64, &RawRecord)> = stamped
        .iter()
        .map(|(ts, r)| ((floor_to_second(*ts) - start).num_seconds(), *r))
        .collect();

    let mut lat = Column::bucket_mean(&slotted, len, RawRecord::latitude_deg);
    let mut lon = Column::bucket_mean(&slotted, len, RawRecord::longitude_deg);
    let mut altitude = Column::bucket_mean(&slotted, len, RawRecord::effective_altitude);
    let mut distance = Column::bucket_mean(&slotted, len, |r| r.distance);
    let mut speed = Column::bucket_mean(&slotted, len, RawRecord::effective_speed);
    let mut power = Column::bucket_mean(&slotted, len, |r| r.power);
    let mut cadence = Column::bucket_mean(&slotted, len, |r| r.cadence);
    let mut heart_rate = Column::bucket_mean(&slotted, len, |r| r.heart_rate);
    let source_grade = Column::bucket_mean(&slotted, len, |r| r.grade);

    for col in [&mut lat, &mut lon, &mut altitude, &mut distance] {
        forward_fill(&mut col.values);
    }
    for col in [&mut speed, &mut power, &mut cadence] {
        interpolate_bounded(&mut col.values, DYNAMIC_GAP_LIMIT_SECS);
    }
    interpolate_full(&mut heart_rate.values);

    let has_position = lat.present && lon.present;
    let derive_grade = altitude.present && distance.present;

    let lat = lat.fill_zero();
    let lon = lon.fill_zero();
    let altitude = altitude.fill_zero();
    let distance = distance.fill_zero();
    let speed = speed.fill_zero();
    let power = power.fill_zero();
    let cadence = cadence.fill_zero();
    let heart_rate = heart_rate.fill_zero();

    let grade: Vec<Option<f64>> = if derive_grade {
        let alt: Vec<f64> = altitude.iter().map(|v| v.unwrap_or(0.0)).collect();
        let dist: Vec<f64> = distance.iter().map(|v| v.unwrap_or(0.0)).collect();
        derive_grade_pct(&alt, &dist).into_iter().map(Some).collect()
    } else {
        source_grade.fill_zero()
    };

    let samples = (0..len)
        .map(|i| TelemetrySample {
            timestamp: start + TimeDelta::seconds(i as i64),
            speed: speed[i],
            power: power[i],
            cadence: cadence[i],
            heart_rate: heart_rate[i],
            altitude: altitude[i],
            grade: grade[i],
            position: if has_position {
                Some(GeoPoint::new(
                    lat[i].unwrap_or(0.0),
                    lon[i].unwrap_or(0.0),
                ))
            } else {
                None
            },
            distance: distance[i],
        })
        .collect();
    Ok(samples)
}

pub(crate) fn floor_to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(ts)
}

/// Last known value holds; leading gaps stay undefined.
pub(crate) fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
}

/// Linear interpolation across interior runs of at most `limit` undefined values.
///
/// Longer runs, and runs touching either end, are left undefined.
pub(crate) fn interpolate_bounded(values: &mut [Option<f64>], limit: usize) {
    for_each_interior_gap(values, |values, left, right| {
        if right - left - 1 <= limit {
            fill_linear(values, left, right);
        }
    });
}

/// Linear interpolation across every interior gap; a trailing gap holds the last value.
pub(crate) fn interpolate_full(values: &mut [Option<f64>]) {
    for_each_interior_gap(values, fill_linear);
    if let Some(last_known) = values.iter().rposition(Option::is_some) {
        let hold = values[last_known];
        for v in &mut values[last_known + 1..] {
            *v = hold;
        }
    }
}

fn for_each_interior_gap(
    values: &mut [Option<f64>],
    mut f: impl FnMut(&mut [Option<f64>], usize, usize),
) {
    let mut left: Option<usize> = None;
    let mut i = 0;
    while i < values.len() {
        if values[i].is_some() {
            if let Some(l) = left
                && i > l + 1
            {
                f(values, l, i);
            }
            left = Some(i);
        }
        i += 1;
    }
}

fn fill_linear(values: &mut [Option<f64>], left: usize, right: usize) {
    let (Some(a), Some(b)) = (values[left], values[right]) else {
        return;
    };
    let span = (right - left) as f64;
    for k in left + 1..right {
        let frac = (k - left) as f64 / span;
        values[k] = Some(a + (b - a) * frac);
    }
}

/// Grade in percent from per-second altitude and cumulative distance.
///
/// Seconds covering `<= 0.5 m` have no raw grade and count as 0; raw grades are clamped to
/// ±40 and smoothed with a centered 5-sample mean whose incomplete edge windows yield 0.
pub(crate) fn derive_grade_pct(altitude: &[f64], distance: &[f64]) -> Vec<f64> {
    let n = altitude.len().min(distance.len());
    let mut raw = vec![0.0f64; n];
    for i in 1..n {
        let dd = distance[i] - distance[i - 1];
        if dd > GRADE_MIN_DISTANCE_M {
            let g = (altitude[i] - altitude[i - 1]) / dd * 100.0;
            raw[i] = g.clamp(-GRADE_CLAMP_PCT, GRADE_CLAMP_PCT);
        }
    }
    centered_mean_strict(&raw, GRADE_SMOOTH_WINDOW)
}

fn centered_mean_strict(values: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    let n = values.len();
    let mut out = vec![0.0f64; n];
    if n < window {
        return out;
    }
    for i in half..n - half {
        let sum: f64 = values[i - half..=i + half].iter().sum();
        out[i] = sum / window as f64;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/telemetry/resample.rs"]
mod tests;
