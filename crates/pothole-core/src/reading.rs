//! Telemetry reading model and lenient input coercion.
//!
//! Submissions arrive from lossy hardware links, so nothing in a raw
//! submission is trusted: each numeric field is coerced independently and
//! falls back to zero when it is missing or garbled. The fallbacks are
//! reported alongside the coerced sample so callers can log and count them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Largest accepted severity; the reading log stores signed 64-bit integers.
pub const MAX_SEVERITY: u64 = i64::MAX as u64;

/// Position of a reading in the append-only log.
///
/// Strictly increasing in append order. Cursor `0` precedes every record.
pub type RecordId = i64;

/// A reading after stamping: caller measurements plus detection results
/// and the server-assigned timestamp.
///
/// Serializes to the persisted record shape
/// `{distance, speed, severity, roadScore, potholes, potholeEvent, timestamp}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampedReading {
    pub distance: f64,
    pub speed: f64,
    pub severity: u64,
    pub road_score: f64,
    /// Cumulative pothole count after this reading was processed.
    #[serde(rename = "potholes")]
    pub pothole_count: u64,
    /// True iff this reading is the leading edge of a new pothole event.
    pub pothole_event: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// A persisted reading together with its log position.
///
/// Serializes as the record shape with an extra `id` field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct StoredReading {
    pub id: RecordId,
    pub reading: StampedReading,
}

/// Flat wire form of [`StoredReading`].
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    id: RecordId,
    distance: f64,
    speed: f64,
    severity: u64,
    road_score: f64,
    potholes: u64,
    pothole_event: bool,
    timestamp: i64,
}

impl From<StoredReading> for StoredRecord {
    fn from(stored: StoredReading) -> Self {
        let r = stored.reading;
        Self {
            id: stored.id,
            distance: r.distance,
            speed: r.speed,
            severity: r.severity,
            road_score: r.road_score,
            potholes: r.pothole_count,
            pothole_event: r.pothole_event,
            timestamp: r.timestamp,
        }
    }
}

impl From<StoredRecord> for StoredReading {
    fn from(record: StoredRecord) -> Self {
        Self {
            id: record.id,
            reading: StampedReading {
                distance: record.distance,
                speed: record.speed,
                severity: record.severity,
                road_score: record.road_score,
                pothole_count: record.potholes,
                pothole_event: record.pothole_event,
                timestamp: record.timestamp,
            },
        }
    }
}

/// Caller-supplied measurements after coercion, before stamping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSample {
    pub distance: f64,
    pub speed: f64,
    pub severity: u64,
    pub road_score: f64,
}

impl SensorSample {
    /// Combine the sample with detection results and a timestamp.
    pub fn stamp(self, pothole_event: bool, pothole_count: u64, timestamp: i64) -> StampedReading {
        StampedReading {
            distance: self.distance,
            speed: self.speed,
            severity: self.severity,
            road_score: self.road_score,
            pothole_count,
            pothole_event,
            timestamp,
        }
    }
}

/// Raw submission as received, every field left untyped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub distance: Option<Value>,
    #[serde(default)]
    pub speed: Option<Value>,
    #[serde(default)]
    pub severity: Option<Value>,
    #[serde(default, rename = "roadScore")]
    pub road_score: Option<Value>,
}

/// Why a field was replaced with zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackCause {
    /// The field was absent or `null`.
    Missing,
    /// The field was present but not usable; carries the reason.
    Invalid(String),
}

/// A field that was defaulted during coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub field: &'static str,
    pub cause: FallbackCause,
}

/// Result of coercing a [`RawReading`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub sample: SensorSample,
    pub fallbacks: Vec<Fallback>,
}

impl Normalized {
    /// Fields that were present but garbled (missing fields excluded).
    pub fn invalid_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fallbacks
            .iter()
            .filter(|f| matches!(f.cause, FallbackCause::Invalid(_)))
            .map(|f| f.field)
    }
}

impl RawReading {
    /// Parse a submission body.
    ///
    /// Bodies that are not JSON, or JSON that is not an object, are treated
    /// as an empty object.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, and numbers are kept
    /// verbatim until coercion, so one garbled field never costs the
    /// others.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_str::<Value>(&String::from_utf8_lossy(body)) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::default(),
        }
    }

    /// Interpret an already-parsed JSON value.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Coerce every field, defaulting unusable ones to zero.
    pub fn normalize(&self) -> Normalized {
        let mut fallbacks = Vec::new();

        let distance =
            coerce_field("distance", self.distance.as_ref(), coerce_float, &mut fallbacks);
        let speed = coerce_field("speed", self.speed.as_ref(), coerce_float, &mut fallbacks);
        let severity = coerce_field(
            "severity",
            self.severity.as_ref(),
            |_, v| coerce_severity(v),
            &mut fallbacks,
        );
        let road_score =
            coerce_field("roadScore", self.road_score.as_ref(), coerce_float, &mut fallbacks);

        Normalized {
            sample: SensorSample {
                distance,
                speed,
                severity,
                road_score,
            },
            fallbacks,
        }
    }
}

fn coerce_field<T, F>(
    field: &'static str,
    value: Option<&Value>,
    coerce: F,
    fallbacks: &mut Vec<Fallback>,
) -> T
where
    T: Default,
    F: FnOnce(&'static str, &Value) -> Result<T>,
{
    let Some(value) = value.filter(|v| !v.is_null()) else {
        fallbacks.push(Fallback {
            field,
            cause: FallbackCause::Missing,
        });
        return T::default();
    };

    match coerce(field, value) {
        Ok(v) => v,
        Err(err) => {
            fallbacks.push(Fallback {
                field,
                cause: FallbackCause::Invalid(err.to_string()),
            });
            T::default()
        }
    }
}

/// Numbers are taken as-is, strings are parsed as decimals.
fn coerce_float(field: &'static str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InvalidField {
            field,
            reason: format!("not a finite number: {value}"),
        }),
    }
}

/// Integers are taken as-is, floats truncate toward zero, strings must
/// hold an integer. Negative values (the sensor's `-1` calibration marker
/// included) are not severities, nor is anything above [`MAX_SEVERITY`].
fn coerce_severity(value: &Value) -> Result<u64> {
    let invalid = |reason: String| Error::InvalidField {
        field: "severity",
        reason,
    };

    let severity = match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else if n.is_i64() {
                return Err(invalid(format!("negative severity: {n}")));
            } else {
                match n.as_f64().map(f64::trunc) {
                    // Saturates, so oversized floats fail the range check below.
                    Some(t) if t.is_finite() && t >= 0.0 => t as u64,
                    Some(t) if t.is_finite() => {
                        return Err(invalid(format!("negative severity: {n}")));
                    }
                    _ => return Err(invalid(format!("not a finite number: {n}"))),
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid(format!("not a non-negative integer: {value}")))?,
        other => return Err(invalid(format!("not a number: {other}"))),
    };

    if severity > MAX_SEVERITY {
        return Err(invalid(format!("severity out of range: {value}")));
    }
    Ok(severity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> Normalized {
        RawReading::from_value(value).normalize()
    }

    #[test]
    fn well_formed_submission_passes_through() {
        let n = normalize(json!({
            "distance": 21.5,
            "speed": 150,
            "severity": 2,
            "roadScore": 87
        }));
        assert_eq!(
            n.sample,
            SensorSample {
                distance: 21.5,
                speed: 150.0,
                severity: 2,
                road_score: 87.0,
            }
        );
        assert!(n.fallbacks.is_empty());
    }

    #[test]
    fn garbled_severity_defaults_to_zero() {
        let n = normalize(json!({ "severity": "oops" }));
        assert_eq!(n.sample.severity, 0);
        assert_eq!(n.invalid_fields().collect::<Vec<_>>(), vec!["severity"]);
    }

    #[test]
    fn missing_fields_are_reported_as_missing() {
        let n = normalize(json!({ "speed": 12 }));
        assert_eq!(n.sample.speed, 12.0);
        assert_eq!(n.fallbacks.len(), 3);
        assert!(n.fallbacks.iter().all(|f| f.cause == FallbackCause::Missing));
        assert_eq!(n.invalid_fields().count(), 0);
    }

    #[test]
    fn null_counts_as_missing() {
        let n = normalize(json!({ "distance": null }));
        assert_eq!(n.sample.distance, 0.0);
        assert_eq!(
            n.fallbacks[0],
            Fallback {
                field: "distance",
                cause: FallbackCause::Missing,
            }
        );
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let n = normalize(json!({
            "distance": " 18.25 ",
            "speed": "140",
            "severity": "3",
            "roadScore": "66.5"
        }));
        assert_eq!(n.sample.distance, 18.25);
        assert_eq!(n.sample.speed, 140.0);
        assert_eq!(n.sample.severity, 3);
        assert_eq!(n.sample.road_score, 66.5);
        assert!(n.fallbacks.is_empty());
    }

    #[test]
    fn fractional_severity_truncates() {
        assert_eq!(normalize(json!({ "severity": 2.9 })).sample.severity, 2);
        assert_eq!(normalize(json!({ "severity": 0.4 })).sample.severity, 0);
    }

    #[test]
    fn negative_severity_is_invalid() {
        let n = normalize(json!({ "severity": -1 }));
        assert_eq!(n.sample.severity, 0);
        assert_eq!(n.invalid_fields().collect::<Vec<_>>(), vec!["severity"]);

        let n = normalize(json!({ "severity": -2.5 }));
        assert_eq!(n.sample.severity, 0);
        assert_eq!(n.invalid_fields().count(), 1);
    }

    #[test]
    fn non_finite_strings_are_invalid() {
        let n = normalize(json!({ "distance": "NaN", "speed": "inf" }));
        assert_eq!(n.sample.distance, 0.0);
        assert_eq!(n.sample.speed, 0.0);
        assert_eq!(n.invalid_fields().count(), 2);
    }

    #[test]
    fn booleans_and_containers_are_invalid() {
        let n = normalize(json!({ "distance": true, "speed": [1], "roadScore": {"v": 1} }));
        assert_eq!(n.sample, SensorSample::default());
        assert_eq!(n.invalid_fields().count(), 3);
    }

    #[test]
    fn non_object_bodies_become_empty() {
        assert_eq!(RawReading::from_slice(b"[1,2,3]").normalize().sample, SensorSample::default());
        assert_eq!(RawReading::from_slice(b"not json").normalize().sample, SensorSample::default());
        assert_eq!(RawReading::from_slice(b"").normalize().fallbacks.len(), 4);
    }

    #[test]
    fn stamped_reading_uses_external_field_names() {
        let reading = SensorSample {
            distance: 20.0,
            speed: 130.0,
            severity: 1,
            road_score: 90.0,
        }
        .stamp(true, 4, 1_700_000_000_000);

        let value = serde_json::to_value(reading).unwrap();
        assert_eq!(
            value,
            json!({
                "distance": 20.0,
                "speed": 130.0,
                "severity": 1,
                "roadScore": 90.0,
                "potholes": 4,
                "potholeEvent": true,
                "timestamp": 1_700_000_000_000i64
            })
        );
    }

    #[test]
    fn stored_reading_flattens_the_record() {
        let stored = StoredReading {
            id: 7,
            reading: SensorSample::default().stamp(false, 0, 1),
        };
        let value = serde_json::to_value(stored).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["potholes"], 0);
        assert_eq!(value["potholeEvent"], false);

        let back: StoredReading = serde_json::from_value(value).unwrap();
        assert_eq!(back, stored);
    }

    #[test]
    fn overflowing_number_only_defaults_its_own_field() {
        let n = RawReading::from_slice(br#"{"distance": 1e400, "severity": 2, "speed": 140}"#)
            .normalize();
        assert_eq!(n.sample.severity, 2);
        assert_eq!(n.sample.speed, 140.0);
        assert_eq!(n.sample.distance, 0.0);
        assert_eq!(n.invalid_fields().collect::<Vec<_>>(), vec!["distance"]);
    }

    #[test]
    fn invalid_utf8_only_defaults_its_own_field() {
        let n = RawReading::from_slice(b"{\"speed\":\"\xff\",\"severity\":2}").normalize();
        assert_eq!(n.sample.severity, 2);
        assert_eq!(n.sample.speed, 0.0);
        assert_eq!(n.invalid_fields().collect::<Vec<_>>(), vec!["speed"]);
    }

    #[test]
    fn severity_above_storable_range_is_invalid() {
        let n = RawReading::from_slice(br#"{"severity": 10000000000000000000}"#).normalize();
        assert_eq!(n.sample.severity, 0);
        assert_eq!(n.invalid_fields().collect::<Vec<_>>(), vec!["severity"]);

        let out_of_range: [&[u8]; 3] = [
            br#"{"severity": "9223372036854775808"}"#,
            br#"{"severity": 1e30}"#,
            br#"{"severity": 123456789012345678901234567890}"#,
        ];
        for body in out_of_range {
            assert_eq!(RawReading::from_slice(body).normalize().sample.severity, 0);
        }

        let max = format!(r#"{{"severity": {MAX_SEVERITY}}}"#);
        assert_eq!(
            RawReading::from_slice(max.as_bytes()).normalize().sample.severity,
            MAX_SEVERITY
        );
    }
}
