//! Row reading: statement execution into raw values, and typed record parsing.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};

use hearth_core::models::RawValue;
use hearth_core::normalize::{decode_or_raw, epoch_to_instant};
use hearth_core::{InspectError, InspectResult, StateRecord};

use super::builder::BuiltQuery;
use crate::to_query_err;

pub fn raw_value(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null => RawValue::Null,
        ValueRef::Integer(i) => RawValue::Integer(i),
        ValueRef::Real(f) => RawValue::Real(f),
        ValueRef::Text(t) => RawValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => RawValue::Blob(b.to_vec()),
    }
}

/// Column names and raw rows produced by a built query.
#[derive(Debug, Clone, Default)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

/// Run `query` and collect every row as raw values.
pub fn run_raw(conn: &Connection, query: &BuiltQuery) -> InspectResult<RawRows> {
    let mut stmt = conn.prepare(&query.sql).map_err(to_query_err("prepare query"))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let params = query.bound_params();
    let mut cursor = stmt
        .query(params.as_slice())
        .map_err(to_query_err("execute query"))?;

    let mut rows = Vec::new();
    while let Some(row) = cursor.next().map_err(to_query_err("read row"))? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(raw_value(row.get_ref(i).map_err(to_query_err("read column"))?));
        }
        rows.push(values);
    }
    Ok(RawRows { columns, rows })
}

/// Optional text column; non-text scalars are rendered, blobs are dropped.
pub fn optional_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
    })
}

/// Epoch-seconds column as an instant; `None` when missing or out of range.
pub fn instant_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<chrono::DateTime<chrono::Utc>>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Real(f) => epoch_to_instant(f),
        ValueRef::Integer(i) => epoch_to_instant(i as f64),
        _ => None,
    })
}

/// Parse a row of `state_id, entity_id, state, attributes, last_updated_ts, last_changed_ts`.
pub fn parse_state_row(row: &Row<'_>) -> rusqlite::Result<InspectResult<StateRecord>> {
    let state_id: i64 = row.get(0)?;
    let entity_id = optional_text(row, 1)?.unwrap_or_default();
    let state = optional_text(row, 2)?.unwrap_or_default();
    let attributes = optional_text(row, 3)?
        .map(|raw| decode_or_raw("attributes", raw))
        .unwrap_or(serde_json::Value::Null);
    let last_updated = instant_column(row, 4)?;
    let last_changed = instant_column(row, 5)?;

    Ok(match last_updated {
        Some(last_updated) => Ok(StateRecord {
            state_id,
            entity_id,
            state,
            attributes,
            last_updated,
            last_changed: last_changed.unwrap_or(last_updated),
        }),
        None => Err(InspectError::QueryExecutionFailed {
            context: format!("state {state_id} has no usable last_updated_ts"),
            source: "missing timestamp".into(),
        }),
    })
}
