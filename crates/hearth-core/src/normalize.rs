//! Result normalization: epoch columns → instants, JSON columns → values.
//!
//! A payload that is not JSON never fails the row; the raw text is kept.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use tracing::debug;

use crate::config::NormalizeConfig;
use crate::errors::{InspectError, InspectResult};
use crate::models::{CellValue, RawValue};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Largest magnitude accepted, in seconds. Keeps the microsecond product in `i64`.
const MAX_EPOCH_SECONDS: f64 = 9.0e12;

/// Epoch seconds (fractional) → instant, at microsecond resolution.
///
/// Whole and fractional seconds are converted separately so the rounding
/// error of a single large multiplication never shifts the microsecond.
pub fn epoch_to_instant(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs.abs() > MAX_EPOCH_SECONDS {
        return None;
    }
    let whole = secs.floor();
    let frac_micros = ((secs - whole) * MICROS_PER_SECOND).round() as i64;
    let micros = (whole as i64).checked_mul(1_000_000)?.checked_add(frac_micros)?;
    DateTime::from_timestamp_micros(micros)
}

/// Instant → epoch seconds. Inverse of [`epoch_to_instant`] for any value
/// representable at microsecond resolution.
pub fn instant_to_epoch(t: DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / MICROS_PER_SECOND
}

/// Decode one payload cell.
pub fn decode_payload(column: &str, raw: &str) -> InspectResult<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| InspectError::MalformedPayload {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

/// Decode a payload cell, falling back to the raw text.
pub fn decode_or_raw(column: &str, raw: String) -> serde_json::Value {
    match decode_payload(column, &raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(column, error = %e, "payload kept as raw text");
            serde_json::Value::String(raw)
        }
    }
}

/// Legacy text timestamps (`2024-03-01 00:00:00.123456`, RFC 3339).
pub fn parse_text_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Column-aware cell converter bound to the reference timezone.
#[derive(Debug, Clone)]
pub struct Normalizer {
    tz: FixedOffset,
    timestamp_columns: HashSet<String>,
    json_columns: HashSet<String>,
}

/// One normalized row plus how many payload cells fell back to raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub cells: Vec<CellValue>,
    pub malformed: usize,
}

impl Normalizer {
    pub fn new(config: &NormalizeConfig, tz: FixedOffset) -> Self {
        Self {
            tz,
            timestamp_columns: config.timestamp_columns.iter().cloned().collect(),
            json_columns: config.json_columns.iter().cloned().collect(),
        }
    }

    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    /// Instant in the reference timezone.
    pub fn localize(&self, t: DateTime<Utc>) -> DateTime<FixedOffset> {
        t.with_timezone(&self.tz)
    }

    /// Normalize one cell. The flag is set when a payload was not valid JSON.
    pub fn normalize_cell(&self, column: &str, raw: RawValue) -> (CellValue, bool) {
        if self.timestamp_columns.contains(column) {
            let instant = match &raw {
                RawValue::Real(secs) => epoch_to_instant(*secs),
                RawValue::Integer(secs) => epoch_to_instant(*secs as f64),
                RawValue::Text(text) => parse_text_instant(text),
                RawValue::Null | RawValue::Blob(_) => None,
            };
            if let Some(t) = instant {
                return (CellValue::Instant(self.localize(t)), false);
            }
        }

        if self.json_columns.contains(column) {
            if let RawValue::Text(text) = raw {
                return match decode_payload(column, &text) {
                    Ok(value) => (CellValue::Json(value), false),
                    Err(e) => {
                        debug!(column, error = %e, "payload kept as raw text");
                        (CellValue::Text(text), true)
                    }
                };
            }
        }

        let cell = match raw {
            RawValue::Null => CellValue::Null,
            RawValue::Integer(i) => CellValue::Integer(i),
            RawValue::Real(f) => CellValue::Real(f),
            RawValue::Text(s) => CellValue::Text(s),
            RawValue::Blob(b) => CellValue::Blob(b),
        };
        (cell, false)
    }

    pub fn normalize_row(&self, columns: &[String], raw: Vec<RawValue>) -> NormalizedRow {
        let mut malformed = 0;
        let cells = columns
            .iter()
            .zip(raw)
            .map(|(column, value)| {
                let (cell, bad) = self.normalize_cell(column, value);
                malformed += usize::from(bad);
                cell
            })
            .collect();
        NormalizedRow { cells, malformed }
    }
}
