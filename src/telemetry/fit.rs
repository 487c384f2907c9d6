use std::path::Path;

use anyhow::Context as _;
use chrono::Utc;
use fitparser::Value;
use fitparser::profile::MesgNum;

use crate::foundation::error::{HudError, HudResult};
use crate::telemetry::sample::RawRecord;

/// Read and decode a FIT activity file into raw records.
pub fn read_fit_file(path: &Path) -> HudResult<Vec<RawRecord>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read telemetry file '{}'", path.display()))
        .map_err(|e| HudError::input(format!("{e:#}")))?;
    parse_fit_records(&bytes)
        .map_err(|e| HudError::input(format!("'{}': {e}", path.display())))
}

/// Decode `record` messages from FIT bytes.
///
/// Records lacking a timestamp are kept here and discarded by the resampler, so the drop count
/// shows up in one place.
pub fn parse_fit_records(input: &[u8]) -> HudResult<Vec<RawRecord>> {
    let messages = fitparser::de::from_bytes(input)
        .map_err(|e| HudError::input(format!("failed to parse FIT data: {e}")))?;

    let mut out = Vec::new();
    for message in messages {
        if message.kind() != MesgNum::Record {
            continue;
        }
        let mut row = RawRecord::default();
        for field in message.fields() {
            let value = field.value();
            match field.name() {
                "timestamp" => {
                    if let Value::Timestamp(ts) = value {
                        row.timestamp = Some(ts.with_timezone(&Utc));
                    }
                }
                "speed" => row.speed = fit_value_to_f64(value),
                "enhanced_speed" => row.enhanced_speed = fit_value_to_f64(value),
                "altitude" => row.altitude = fit_value_to_f64(value),
                "enhanced_altitude" => row.enhanced_altitude = fit_value_to_f64(value),
                "power" => row.power = fit_value_to_f64(value),
                "cadence" => row.cadence = fit_value_to_f64(value),
                "heart_rate" => row.heart_rate = fit_value_to_f64(value),
                "grade" => row.grade = fit_value_to_f64(value),
                "distance" => row.distance = fit_value_to_f64(value),
                "position_lat" => row.position_lat = fit_value_to_semicircles(value),
                "position_long" => row.position_long = fit_value_to_semicircles(value),
                _ => {}
            }
        }
        out.push(row);
    }
    Ok(out)
}

fn fit_value_to_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Float32(v) => f64::from(*v),
        Value::Float64(v) => *v,
        Value::SInt8(v) => f64::from(*v),
        Value::SInt16(v) => f64::from(*v),
        Value::SInt32(v) => f64::from(*v),
        Value::SInt64(v) => *v as f64,
        Value::UInt8(v) => f64::from(*v),
        Value::UInt8z(v) => f64::from(*v),
        Value::Byte(v) => f64::from(*v),
        Value::UInt16(v) => f64::from(*v),
        Value::UInt16z(v) => f64::from(*v),
        Value::UInt32(v) => f64::from(*v),
        Value::UInt32z(v) => f64::from(*v),
        Value::UInt64(v) => *v as f64,
        Value::UInt64z(v) => *v as f64,
        Value::String(s) => s.trim().parse().ok()?,
        Value::Array(values) => return values.iter().find_map(fit_value_to_f64),
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn fit_value_to_semicircles(value: &Value) -> Option<i32> {
    match value {
        Value::SInt32(v) => Some(*v),
        other => {
            let v = fit_value_to_f64(other)?;
            (v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX)).then(|| v.round() as i32)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/telemetry/fit.rs"]
mod tests;
