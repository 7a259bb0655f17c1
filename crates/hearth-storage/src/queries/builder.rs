//! Query builder: a closed set of query shapes over the recorder tables.
//!
//! Every shape binds `:limit`; every filter value is a bound parameter. The
//! only identifier ever spliced into SQL is a [`TableName`] that the catalog
//! has already vouched for.

use std::fmt;

use rusqlite::types::{ToSql, Value};

use hearth_core::normalize::instant_to_epoch;
use hearth_core::{FilterSpec, InspectResult, RowLimit, TimeWindow};

use crate::catalog::TableName;

/// Which query to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    /// Most recent rows of `states`, no time filter.
    PlainStateHistory,
    /// `states` joined to `states_meta` for the entity id.
    JoinedStateHistory,
    /// `events` with optional payload and event-type lookups.
    JoinedEventLog,
    /// `SELECT *` from a catalog-validated table.
    NamedTable(TableName),
}

impl QueryShape {
    pub fn label(&self) -> String {
        match self {
            Self::PlainStateHistory => "plain_state_history".to_string(),
            Self::JoinedStateHistory => "joined_state_history".to_string(),
            Self::JoinedEventLog => "joined_event_log".to_string(),
            Self::NamedTable(name) => format!("table:{name}"),
        }
    }
}

/// Query text plus its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub label: String,
    pub sql: String,
    pub params: Vec<(&'static str, Value)>,
    pub row_limit: RowLimit,
}

impl BuiltQuery {
    /// Parameters in the form rusqlite binds by name.
    pub fn bound_params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (*name, value as &dyn ToSql))
            .collect()
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Query text and parameters, for debugging output.
    pub fn describe(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|(name, value)| format!("{name} = {value:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}\n-- params: {params}", self.sql.trim())
    }
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Accumulates WHERE clauses and parameters for one statement.
#[derive(Default)]
struct Clauses {
    conditions: Vec<&'static str>,
    params: Vec<(&'static str, Value)>,
}

impl Clauses {
    fn push(&mut self, condition: &'static str, params: Vec<(&'static str, Value)>) {
        self.conditions.push(condition);
        self.params.extend(params);
    }

    fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("\nWHERE {}", self.conditions.join("\n  AND "))
        }
    }

    fn window(&mut self, column: &'static str, window: &TimeWindow) -> InspectResult<()> {
        if let Some((start, end)) = window.filter_bounds()? {
            self.push(
                column,
                vec![
                    (":start_ts", Value::Real(instant_to_epoch(start))),
                    (":end_ts", Value::Real(instant_to_epoch(end))),
                ],
            );
        }
        Ok(())
    }
}

fn like_pattern(raw: &str) -> Value {
    Value::Text(format!("%{raw}%"))
}

fn limit_param(limit: RowLimit) -> (&'static str, Value) {
    (":limit", Value::Integer(i64::from(limit.get())))
}

/// Build the statement for `shape`.
///
/// Windowed shapes reject a window whose start is after its end
/// (`InvalidRange`) and filter only when both bounds are set, inclusively.
pub fn build(shape: &QueryShape, window: &TimeWindow, filter: &FilterSpec) -> InspectResult<BuiltQuery> {
    let label = shape.label();
    let row_limit = filter.row_limit;

    let (sql, mut params) = match shape {
        QueryShape::PlainStateHistory => (
            "SELECT state_id, state, entity_id, attributes, last_updated_ts, last_changed_ts
FROM states
ORDER BY last_updated_ts DESC
LIMIT :limit"
                .to_string(),
            Vec::new(),
        ),

        QueryShape::JoinedStateHistory => {
            let mut clauses = Clauses::default();
            if let Some(pattern) = &filter.entity_include_pattern {
                clauses.push(
                    "sm.entity_id LIKE :entity_pattern",
                    vec![(":entity_pattern", like_pattern(pattern))],
                );
            }
            clauses.window("s.last_updated_ts BETWEEN :start_ts AND :end_ts", window)?;
            let sql = format!(
                "SELECT s.state_id, sm.entity_id, s.state, s.attributes_id,
       s.last_changed_ts, s.last_updated_ts, s.metadata_id
FROM states s
JOIN states_meta sm ON s.metadata_id = sm.metadata_id{}
ORDER BY s.last_updated_ts DESC
LIMIT :limit",
                clauses.where_sql()
            );
            (sql, clauses.params)
        }

        QueryShape::JoinedEventLog => {
            let mut clauses = Clauses::default();
            if let Some(pattern) = &filter.event_type_pattern {
                clauses.push(
                    "(e.event_type LIKE :event_type_pattern OR et.event_type LIKE :event_type_pattern)",
                    vec![(":event_type_pattern", like_pattern(pattern))],
                );
            }
            clauses.window("e.time_fired_ts BETWEEN :start_ts AND :end_ts", window)?;
            let sql = format!(
                "SELECT e.event_id, COALESCE(et.event_type, e.event_type) AS event_type_name,
       e.time_fired_ts, COALESCE(ed.shared_data, e.event_data) AS event_data, e.context_id
FROM events e
LEFT JOIN event_data ed ON e.data_id = ed.data_id
LEFT JOIN event_types et ON e.event_type_id = et.event_type_id{}
ORDER BY e.time_fired_ts DESC
LIMIT :limit",
                clauses.where_sql()
            );
            (sql, clauses.params)
        }

        QueryShape::NamedTable(table) => (
            format!("SELECT *\nFROM {}\nLIMIT :limit", table.quoted()),
            Vec::new(),
        ),
    };

    params.push(limit_param(row_limit));
    Ok(BuiltQuery {
        label,
        sql,
        params,
        row_limit,
    })
}

/// Events for logbook reconstruction.
///
/// Same joins as [`QueryShape::JoinedEventLog`], with the entity id lifted
/// out of the payload so the include pattern can filter on it. Payloads that
/// are not valid JSON, or whose `entity_id` is not a string, yield a NULL
/// entity id rather than an error.
pub fn build_logbook_events(window: &TimeWindow, filter: &FilterSpec) -> InspectResult<BuiltQuery> {
    let mut inner = Clauses::default();
    inner.window("e.time_fired_ts BETWEEN :start_ts AND :end_ts", window)?;

    let mut outer = Clauses::default();
    if let Some(pattern) = &filter.entity_include_pattern {
        outer.push(
            "ev.entity_id LIKE :entity_pattern",
            vec![(":entity_pattern", like_pattern(pattern))],
        );
    }
    if let Some(pattern) = &filter.event_type_pattern {
        outer.push(
            "ev.event_type LIKE :event_type_pattern",
            vec![(":event_type_pattern", like_pattern(pattern))],
        );
    }

    let sql = format!(
        "SELECT ev.event_id, ev.event_type, ev.time_fired_ts, ev.event_data, ev.context_id, ev.entity_id
FROM (
  SELECT e.event_id AS event_id,
         COALESCE(et.event_type, e.event_type) AS event_type,
         e.time_fired_ts AS time_fired_ts,
         COALESCE(ed.shared_data, e.event_data) AS event_data,
         e.context_id AS context_id,
         CASE WHEN json_valid(COALESCE(ed.shared_data, e.event_data))
              THEN CASE WHEN json_type(COALESCE(ed.shared_data, e.event_data), '$.entity_id') = 'text'
                        THEN json_extract(COALESCE(ed.shared_data, e.event_data), '$.entity_id')
                   END
         END AS entity_id
  FROM events e
  LEFT JOIN event_data ed ON e.data_id = ed.data_id
  LEFT JOIN event_types et ON e.event_type_id = et.event_type_id{}
) ev{}
ORDER BY ev.time_fired_ts DESC, ev.event_id DESC
LIMIT :limit",
        inner.where_sql(),
        outer.where_sql()
    );

    let mut params = inner.params;
    params.extend(outer.params);
    params.push(limit_param(filter.row_limit));
    Ok(BuiltQuery {
        label: "logbook_events".to_string(),
        sql,
        params,
        row_limit: filter.row_limit,
    })
}
