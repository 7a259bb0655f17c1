//! Event fetches for logbook reconstruction.

use rusqlite::Connection;
use tracing::warn;

use hearth_core::normalize::decode_or_raw;
use hearth_core::{EventRecord, FilterSpec, InspectResult, TimeWindow};

use super::builder::build_logbook_events;
use super::rows::{instant_column, optional_text};
use crate::to_query_err;

/// Events fired inside `window` (inclusive), newest first, capped by the row limit.
///
/// The entity id comes from the payload's `entity_id`; events without one
/// are kept with `entity_id = None`.
pub fn fetch_logbook_events(
    conn: &Connection,
    window: &TimeWindow,
    filter: &FilterSpec,
) -> InspectResult<Vec<EventRecord>> {
    let query = build_logbook_events(window, filter)?;
    let mut stmt = conn
        .prepare(&query.sql)
        .map_err(to_query_err("prepare logbook events"))?;
    let params = query.bound_params();
    let rows = stmt
        .query_map(params.as_slice(), |row| {
            let event_id: i64 = row.get(0)?;
            let event_type = optional_text(row, 1)?.unwrap_or_default();
            let time_fired = instant_column(row, 2)?;
            let data = optional_text(row, 3)?
                .map(|raw| decode_or_raw("event_data", raw))
                .unwrap_or(serde_json::Value::Null);
            let context_id = optional_text(row, 4)?;
            let entity_id = optional_text(row, 5)?;
            Ok(time_fired.map(|time_fired| EventRecord {
                event_id,
                event_type,
                time_fired,
                entity_id,
                data,
                context_id,
            }))
        })
        .map_err(to_query_err("fetch logbook events"))?;

    let mut events = Vec::new();
    for row in rows {
        match row.map_err(to_query_err("read logbook event"))? {
            Some(event) => events.push(event),
            None => warn!("skipping event without a usable time_fired_ts"),
        }
    }
    Ok(events)
}
