use chrono::{DateTime, Utc};

/// FIT positions are signed 32-bit semicircles; `2^31` semicircles span 180 degrees.
pub const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// m/s to km/h.
pub const MPS_TO_KPH: f64 = 3.6;
/// m/s to mph.
pub const MPS_TO_MPH: f64 = 2.23694;

/// One decoded activity record before resampling.
///
/// Fields mirror the source format: speed/altitude may come in a legacy and an "enhanced"
/// flavour, positions are semicircles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub speed: Option<f64>,
    pub enhanced_speed: Option<f64>,
    pub altitude: Option<f64>,
    pub enhanced_altitude: Option<f64>,
    pub power: Option<f64>,
    pub cadence: Option<f64>,
    pub heart_rate: Option<f64>,
    pub grade: Option<f64>,
    pub position_lat: Option<i32>,
    pub position_long: Option<i32>,
    pub distance: Option<f64>,
}

impl RawRecord {
    /// Record stamped at `timestamp` with no measurements.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    /// Speed in m/s, preferring the enhanced field.
    pub fn effective_speed(&self) -> Option<f64> {
        self.enhanced_speed.or(self.speed)
    }

    /// Altitude in metres, preferring the enhanced field.
    pub fn effective_altitude(&self) -> Option<f64> {
        self.enhanced_altitude.or(self.altitude)
    }

    pub fn latitude_deg(&self) -> Option<f64> {
        self.position_lat
            .map(|s| f64::from(s) * SEMICIRCLES_TO_DEGREES)
    }

    pub fn longitude_deg(&self) -> Option<f64> {
        self.position_long
            .map(|s| f64::from(s) * SEMICIRCLES_TO_DEGREES)
    }
}

/// Geographic position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `(0°, 0°)` is what zero-filled "no fix" seconds collapse to.
    pub fn is_null_island(self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

/// One second of telemetry on the resampled grid.
///
/// `None` means the source never carried that field at all; fields the source did carry are
/// always defined after gap filling.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    /// m/s.
    pub speed: Option<f64>,
    /// Watts.
    pub power: Option<f64>,
    /// rpm.
    pub cadence: Option<f64>,
    /// bpm.
    pub heart_rate: Option<f64>,
    /// Metres.
    pub altitude: Option<f64>,
    /// Percent, smoothed.
    pub grade: Option<f64>,
    pub position: Option<GeoPoint>,
    /// Cumulative metres.
    pub distance: Option<f64>,
}

impl TelemetrySample {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            speed: None,
            power: None,
            cadence: None,
            heart_rate: None,
            altitude: None,
            grade: None,
            position: None,
            distance: None,
        }
    }

    pub fn speed_kph(&self) -> Option<f64> {
        self.speed.map(|v| v * MPS_TO_KPH)
    }

    pub fn speed_mph(&self) -> Option<f64> {
        self.speed.map(|v| v * MPS_TO_MPH)
    }

    /// Position with a real fix (null island excluded).
    pub fn fix(&self) -> Option<GeoPoint> {
        self.position.filter(|p| !p.is_null_island())
    }
}
