//! Clock alignment between the video and the telemetry track.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::telemetry::track::TelemetryTrack;

/// Signed seconds from telemetry start to video start.
///
/// A video-local time `t` maps to the absolute telemetry time `track.start + t + offset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SyncOffset(pub f64);

impl SyncOffset {
    pub const ZERO: Self = Self(0.0);

    /// `creation - start` in seconds, at microsecond resolution.
    pub fn between(creation: DateTime<Utc>, start: DateTime<Utc>) -> Self {
        let delta = creation - start;
        match delta.num_microseconds() {
            Some(us) => Self(us as f64 / 1e6),
            None => Self(delta.num_milliseconds() as f64 / 1e3),
        }
    }

    pub fn secs(self) -> f64 {
        self.0
    }
}

/// Why an offset of zero was substituted for a real measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DegradedReason {
    MissingCreationTime,
    EmptyTrack,
}

impl DegradedReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingCreationTime => "Could not extract creation time from video",
            Self::EmptyTrack => "FIT file empty or invalid",
        }
    }
}

/// Where the offset came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncSource {
    Computed,
    Manual,
    Degraded(DegradedReason),
}

/// Offset plus the anchors it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncOutcome {
    pub offset: SyncOffset,
    pub video_created: Option<DateTime<Utc>>,
    pub fit_start: Option<DateTime<Utc>>,
    pub source: SyncSource,
}

impl SyncOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, SyncSource::Degraded(_))
    }

    /// Replace the offset with a user-supplied value.
    pub fn with_manual_offset(mut self, secs: f64) -> Self {
        self.offset = SyncOffset(secs);
        self.source = SyncSource::Manual;
        self
    }

    pub fn report(&self) -> SyncReport {
        let message = match self.source {
            SyncSource::Computed => String::new(),
            SyncSource::Manual => "manual offset".to_string(),
            SyncSource::Degraded(reason) => reason.message().to_string(),
        };
        SyncReport {
            offset: self.offset.secs(),
            video_created: self.video_created.map(|t| t.to_rfc3339()),
            fit_start: self.fit_start.map(|t| t.to_rfc3339()),
            success: !self.is_degraded(),
            message,
        }
    }
}

/// JSON shape printed by `ridehud sync`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SyncReport {
    pub offset: f64,
    pub video_created: Option<String>,
    pub fit_start: Option<String>,
    pub success: bool,
    pub message: String,
}

/// Compute the offset between a video creation time and a track start.
///
/// Missing inputs yield a zero offset flagged as degraded, never a silent zero.
pub fn synchronize(
    creation_time: Option<DateTime<Utc>>,
    track: Option<&TelemetryTrack>,
) -> SyncOutcome {
    let fit_start = track.filter(|t| !t.is_empty()).map(TelemetryTrack::start);
    let source = match (creation_time, fit_start) {
        (None, _) => SyncSource::Degraded(DegradedReason::MissingCreationTime),
        (Some(_), None) => SyncSource::Degraded(DegradedReason::EmptyTrack),
        (Some(_), Some(_)) => SyncSource::Computed,
    };
    let offset = match (creation_time, fit_start) {
        (Some(c), Some(s)) => SyncOffset::between(c, s),
        _ => SyncOffset::ZERO,
    };
    if let SyncSource::Degraded(reason) = source {
        warn!(reason = reason.message(), "sync degraded, using zero offset");
    }
    SyncOutcome {
        offset,
        video_created: creation_time,
        fit_start,
        source,
    }
}

/// Parse a container `creation_time` tag (ISO-8601; a bare timestamp is taken as UTC).
pub fn parse_creation_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "../tests/unit/sync.rs"]
mod tests;
