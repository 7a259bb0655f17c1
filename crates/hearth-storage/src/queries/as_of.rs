//! As-of state slices: per entity, just enough history to answer a batch of
//! as-of requests in memory through [`AsOfIndex`].

use chrono::{DateTime, Utc};
use rusqlite::{named_params, Connection};
use tracing::debug;

use hearth_core::as_of::{request_spans, AsOfIndex, AsOfRequest};
use hearth_core::normalize::instant_to_epoch;
use hearth_core::{InspectResult, StateRecord};

use super::rows::parse_state_row;
use crate::to_query_err;

/// Stored timestamps may carry sub-microsecond digits; bounds are widened by
/// this much and the index makes the exact decision on rounded instants.
const SLACK_SECONDS: f64 = 1e-6;

const SLICE_SQL: &str = "
SELECT s.state_id, sm.entity_id, s.state,
       COALESCE(sa.shared_attrs, s.attributes) AS attributes,
       s.last_updated_ts,
       COALESCE(s.last_changed_ts, s.last_updated_ts) AS last_changed_ts
FROM states s
JOIN states_meta sm ON s.metadata_id = sm.metadata_id
LEFT JOIN state_attributes sa ON s.attributes_id = sa.attributes_id
WHERE sm.entity_id = :entity_id
  AND s.last_updated_ts <= :hi
  AND s.last_updated_ts >= COALESCE(
        (SELECT MAX(s2.last_updated_ts)
         FROM states s2
         JOIN states_meta sm2 ON s2.metadata_id = sm2.metadata_id
         WHERE sm2.entity_id = :entity_id AND s2.last_updated_ts <= :lo),
        :lo) - :slack
ORDER BY s.last_updated_ts, s.state_id";

/// State records of `entity_id` from the one in effect at `lo` through `hi`.
pub fn load_entity_slice(
    conn: &Connection,
    entity_id: &str,
    lo: DateTime<Utc>,
    hi: DateTime<Utc>,
) -> InspectResult<Vec<StateRecord>> {
    let mut stmt = conn
        .prepare_cached(SLICE_SQL)
        .map_err(to_query_err("prepare as-of slice"))?;
    let rows = stmt
        .query_map(
            named_params! {
                ":entity_id": entity_id,
                ":lo": instant_to_epoch(lo) - SLACK_SECONDS,
                ":hi": instant_to_epoch(hi) + SLACK_SECONDS,
                ":slack": SLACK_SECONDS,
            },
            |row| parse_state_row(row),
        )
        .map_err(to_query_err("load as-of slice"))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(to_query_err("read as-of slice"))??);
    }
    Ok(records)
}

/// Load every slice a batch of requests needs, one statement per entity.
pub fn load_index(conn: &Connection, requests: &[AsOfRequest]) -> InspectResult<AsOfIndex> {
    let spans = request_spans(requests);
    let mut records = Vec::new();
    for (entity_id, (lo, hi)) in &spans {
        records.extend(load_entity_slice(conn, entity_id, *lo, *hi)?);
    }
    debug!(
        entities = spans.len(),
        requests = requests.len(),
        records = records.len(),
        "loaded as-of slices"
    );
    Ok(AsOfIndex::from_records(records))
}

/// Resolve a batch of requests against the store.
pub fn resolve_many(
    conn: &Connection,
    requests: &[AsOfRequest],
) -> InspectResult<Vec<Option<StateRecord>>> {
    let index = load_index(conn, requests)?;
    Ok(index
        .resolve_batch(requests)
        .into_iter()
        .map(|r| r.cloned())
        .collect())
}

/// The state of `entity_id` in effect at `at`, if any.
pub fn state_as_of(
    conn: &Connection,
    entity_id: &str,
    at: DateTime<Utc>,
) -> InspectResult<Option<StateRecord>> {
    let request = AsOfRequest::new(entity_id, at);
    Ok(resolve_many(conn, std::slice::from_ref(&request))?
        .pop()
        .flatten())
}
