use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::foundation::error::{HudError, HudResult};
use crate::telemetry::fit::read_fit_file;
use crate::telemetry::resample::resample;
use crate::telemetry::sample::{GeoPoint, RawRecord, TelemetrySample};

/// Fraction of the lat/lon span added on each side of the map bounds.
pub const MAP_PADDING_FRACTION: f64 = 0.1;
/// Padding floor in degrees, so a stationary track still has a non-degenerate box.
pub const MAP_MIN_PADDING_DEG: f64 = 0.001;

/// Lat/lon bounding box in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Grow each side by `fraction` of the span, or by `floor` degrees when that is larger.
    pub fn padded(self, fraction: f64, floor: f64) -> Self {
        let pad_lat = ((self.max_lat - self.min_lat) * fraction).max(floor);
        let pad_lon = ((self.max_lon - self.min_lon) * fraction).max(floor);
        Self {
            min_lat: self.min_lat - pad_lat,
            max_lat: self.max_lat + pad_lat,
            min_lon: self.min_lon - pad_lon,
            max_lon: self.max_lon + pad_lon,
        }
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lon..=self.max_lon).contains(&p.lon)
    }
}

/// Immutable 1 Hz telemetry grid.
///
/// Every second in `[start, end]` has exactly one sample. Cloning is cheap to share through
/// `Arc`; nothing mutates a track after construction.
#[derive(Clone, Debug)]
pub struct TelemetryTrack {
    samples: Vec<TelemetrySample>,
}

impl TelemetryTrack {
    /// Decode and resample a FIT activity file.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn from_fit_file(path: &Path) -> HudResult<Self> {
        let records = read_fit_file(path)?;
        let track = Self::from_records(&records)?;
        info!(
            records = records.len(),
            seconds = track.len(),
            start = %track.start(),
            "telemetry loaded"
        );
        Ok(track)
    }

    pub fn from_records(records: &[RawRecord]) -> HudResult<Self> {
        Ok(Self {
            samples: resample(records)?,
        })
    }

    /// Wrap an already-resampled grid, checking the one-sample-per-second invariant.
    pub fn from_samples(samples: Vec<TelemetrySample>) -> HudResult<Self> {
        if samples.is_empty() {
            return Err(HudError::input("telemetry track is empty"));
        }
        for pair in samples.windows(2) {
            if pair[1].timestamp - pair[0].timestamp != TimeDelta::seconds(1) {
                return Err(HudError::validation(format!(
                    "telemetry grid is not contiguous at {}",
                    pair[1].timestamp
                )));
            }
        }
        Ok(Self { samples })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.samples[0].timestamp
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.samples[self.samples.len() - 1].timestamp
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; constructors reject empty input.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Seconds between first and last sample.
    pub fn duration_secs(&self) -> f64 {
        (self.len() - 1) as f64
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    /// Index of the sample closest to `query`; ties go to the earlier sample and queries
    /// outside the track clamp to its ends.
    pub fn nearest_index(&self, query: DateTime<Utc>) -> usize {
        let idx = self.samples.partition_point(|s| s.timestamp < query);
        if idx == 0 {
            return 0;
        }
        if idx == self.samples.len() {
            return idx - 1;
        }
        let before = query - self.samples[idx - 1].timestamp;
        let after = self.samples[idx].timestamp - query;
        if after < before { idx } else { idx - 1 }
    }

    pub fn nearest(&self, query: DateTime<Utc>) -> &TelemetrySample {
        &self.samples[self.nearest_index(query)]
    }

    /// Nearest index for `start + secs`, with `secs` possibly negative or fractional.
    pub fn nearest_index_at_offset(&self, secs: f64) -> usize {
        self.nearest_index(self.time_at_offset(secs))
    }

    /// Absolute time `secs` after the track start, at microsecond precision.
    pub fn time_at_offset(&self, secs: f64) -> DateTime<Utc> {
        let micros = (secs * 1e6).round();
        let micros = if micros.is_finite() {
            micros.clamp(i64::MIN as f64, i64::MAX as f64) as i64
        } else {
            0
        };
        let fallback = if micros < 0 { self.start() } else { self.end() };
        self.start()
            .checked_add_signed(TimeDelta::microseconds(micros))
            .unwrap_or(fallback)
    }

    /// Bounds of every real position fix, or `None` when the track has none.
    pub fn geo_bounds(&self) -> Option<GeoBounds> {
        let mut fixes = self.samples.iter().filter_map(TelemetrySample::fix);
        let first = fixes.next()?;
        let init = GeoBounds {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        Some(fixes.fold(init, |b, p| GeoBounds {
            min_lat: b.min_lat.min(p.lat),
            max_lat: b.max_lat.max(p.lat),
            min_lon: b.min_lon.min(p.lon),
            max_lon: b.max_lon.max(p.lon),
        }))
    }

    /// Every `step`-th real position fix, in track order.
    pub fn polyline(&self, step: usize) -> Vec<GeoPoint> {
        self.samples
            .iter()
            .filter_map(TelemetrySample::fix)
            .step_by(step.max(1))
            .collect()
    }

    /// `(distance, altitude)` pairs, at most `max_points` of them.
    ///
    /// Empty when the track carries no altitude. Missing distance counts as 0 m.
    pub fn elevation_profile(&self, max_points: usize) -> Vec<(f64, f64)> {
        if self.samples.iter().all(|s| s.altitude.is_none()) {
            return Vec::new();
        }
        let step = self.samples.len().div_ceil(max_points.max(1)).max(1);
        self.samples
            .iter()
            .step_by(step)
            .map(|s| (s.distance.unwrap_or(0.0), s.altitude.unwrap_or(0.0)))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/telemetry/track.rs"]
mod tests;
