//! Time series input records

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ChartError, ChartResult};

/// One time bucket of input data: an ISO-8601 timestamp plus one numeric
/// (or null) field per series key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Option<f64>>) -> Self {
        let value = match value.into() {
            Some(v) => Value::from(v),
            None => Value::Null,
        };
        self.values.insert(key.into(), value);
        self
    }

    /// Numeric value for a series key. Missing keys, nulls and non-numeric
    /// fields all read as `None`.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Parsed wall-clock time of this bucket
    pub fn time(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse an ISO-8601 timestamp as wall-clock time.
///
/// A trailing `Z` or numeric offset is dropped rather than converted, so a
/// bucket stamped `00:00Z` is labelled `00:00` regardless of where the chart
/// is viewed.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    let stripped = raw.trim_end_matches('Z');
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stripped, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(stripped, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Milliseconds on the chart's time axis
pub fn to_millis(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

pub fn from_millis(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// Parse a JSON array of points
pub fn points_from_json(json: &str) -> ChartResult<Vec<TimeSeriesPoint>> {
    let points: Vec<TimeSeriesPoint> =
        serde_json::from_str(json).inspect_err(|err| warn!(%err, "points rejected"))?;
    for (index, point) in points.iter().enumerate() {
        if point.time().is_none() {
            warn!(index, timestamp = %point.timestamp, "unparseable timestamp");
            return Err(ChartError::InvalidTimestamp {
                index,
                value: point.timestamp.clone(),
            });
        }
    }
    debug!(points = points.len(), "points parsed");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_timestamp_variants() {
        let zulu = parse_timestamp("2023-03-01T12:30:00.000Z").unwrap();
        assert_eq!(zulu.hour(), 12);
        assert_eq!(zulu.minute(), 30);

        let offset = parse_timestamp("2023-03-01T12:30:00+05:00").unwrap();
        assert_eq!(offset.hour(), 12);

        let naive = parse_timestamp("2023-03-01T08:00:00").unwrap();
        assert_eq!(naive.hour(), 8);

        let date_only = parse_timestamp("2023-03-01").unwrap();
        assert_eq!(date_only.hour(), 0);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_point_values() {
        let json = r#"{"timestamp": "2023-01-01T00:00:00Z", "a": 1.5, "b": null, "note": "x"}"#;
        let point: TimeSeriesPoint = serde_json::from_str(json).unwrap();

        assert_eq!(point.value("a"), Some(1.5));
        assert_eq!(point.value("b"), None);
        assert_eq!(point.value("note"), None);
        assert_eq!(point.value("missing"), None);
        assert!(point.has_key("b"));
    }

    #[test]
    fn test_millis_round_trip_keeps_wall_clock() {
        let dt = parse_timestamp("2023-06-15T18:00:00Z").unwrap();
        let ms = to_millis(&dt);
        assert_eq!(from_millis(ms), Some(dt));
    }

    #[test]
    fn test_points_from_json_rejects_bad_timestamp() {
        let err = points_from_json(r#"[{"timestamp": "soon", "a": 1}]"#).unwrap_err();
        assert!(matches!(err, ChartError::InvalidTimestamp { index: 0, .. }));
    }
}
