use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A column value as read from storage, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// A display-ready column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Epoch column converted to the reference timezone.
    Instant(DateTime<FixedOffset>),
    /// Decoded JSON payload column.
    Json(serde_json::Value),
    Blob(Vec<u8>),
}

/// Rows returned by one query, with the limit that was actually enforced.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Which query shape produced the rows.
    pub shape: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub row_count: usize,
    pub row_limit_applied: u32,
    /// Payload cells that were not valid JSON and were passed through as text.
    pub malformed_payloads: usize,
}

impl QueryResult {
    /// One row as a `{column: value}` object, for detail views.
    pub fn row_as_json(&self, index: usize) -> Option<serde_json::Value> {
        let row = self.rows.get(index)?;
        let object = self
            .columns
            .iter()
            .zip(row)
            .map(|(col, cell)| {
                let value = serde_json::to_value(cell).unwrap_or(serde_json::Value::Null);
                (col.clone(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        Some(serde_json::Value::Object(object))
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
