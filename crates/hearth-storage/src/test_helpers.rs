//! Recorder fixtures for tests: the schema subset the store reads, and a
//! small writer that fills it.
//!
//! Used by this crate's tests and by `hearth-logbook` to avoid depending on
//! a real `home-assistant_v2.db`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use hearth_core::normalize::instant_to_epoch;
use hearth_core::InspectResult;

use crate::to_query_err;

/// Tables and columns of the recorder schema touched by the store.
pub const RECORDER_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS states_meta (
    metadata_id INTEGER PRIMARY KEY,
    entity_id   VARCHAR(255)
);
CREATE TABLE IF NOT EXISTS state_attributes (
    attributes_id INTEGER PRIMARY KEY,
    hash          BIGINT,
    shared_attrs  TEXT
);
CREATE TABLE IF NOT EXISTS states (
    state_id        INTEGER PRIMARY KEY,
    entity_id       CHAR(0),
    state           VARCHAR(255),
    attributes      CHAR(0),
    event_id        SMALLINT,
    last_changed_ts FLOAT,
    last_updated_ts FLOAT,
    old_state_id    INTEGER,
    attributes_id   INTEGER,
    context_id      VARCHAR(36),
    origin_idx      SMALLINT,
    metadata_id     INTEGER
);
CREATE INDEX IF NOT EXISTS ix_states_metadata_id_last_updated_ts
    ON states (metadata_id, last_updated_ts);
CREATE TABLE IF NOT EXISTS event_types (
    event_type_id INTEGER PRIMARY KEY,
    event_type    VARCHAR(64)
);
CREATE TABLE IF NOT EXISTS event_data (
    data_id     INTEGER PRIMARY KEY,
    hash        BIGINT,
    shared_data TEXT
);
CREATE TABLE IF NOT EXISTS events (
    event_id      INTEGER PRIMARY KEY,
    event_type    CHAR(0),
    event_data    CHAR(0),
    origin_idx    SMALLINT,
    time_fired_ts FLOAT,
    context_id    VARCHAR(36),
    data_id       INTEGER,
    event_type_id INTEGER
);
CREATE INDEX IF NOT EXISTS ix_events_time_fired_ts ON events (time_fired_ts);
";

/// Writes recorder rows through a writable connection.
///
/// Entity ids and event types are interned into their lookup tables the way
/// the recorder does it.
pub struct RecorderWriter<'a> {
    conn: &'a Connection,
    metadata_ids: HashMap<String, i64>,
    event_type_ids: HashMap<String, i64>,
}

impl<'a> RecorderWriter<'a> {
    /// Create the schema (idempotent) and wrap `conn`.
    pub fn new(conn: &'a Connection) -> InspectResult<Self> {
        conn.execute_batch(RECORDER_SCHEMA)
            .map_err(to_query_err("create recorder schema"))?;
        Ok(Self {
            conn,
            metadata_ids: HashMap::new(),
            event_type_ids: HashMap::new(),
        })
    }

    fn metadata_id(&mut self, entity_id: &str) -> InspectResult<i64> {
        if let Some(id) = self.metadata_ids.get(entity_id) {
            return Ok(*id);
        }
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT metadata_id FROM states_meta WHERE entity_id = ?1",
                params![entity_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_query_err("lookup states_meta"))?;
        let id = match existing {
            Some(id) => id,
            None => {
                self.conn
                    .execute("INSERT INTO states_meta (entity_id) VALUES (?1)", params![entity_id])
                    .map_err(to_query_err("insert states_meta"))?;
                self.conn.last_insert_rowid()
            }
        };
        self.metadata_ids.insert(entity_id.to_string(), id);
        Ok(id)
    }

    fn event_type_id(&mut self, event_type: &str) -> InspectResult<i64> {
        if let Some(id) = self.event_type_ids.get(event_type) {
            return Ok(*id);
        }
        self.conn
            .execute("INSERT INTO event_types (event_type) VALUES (?1)", params![event_type])
            .map_err(to_query_err("insert event_types"))?;
        let id = self.conn.last_insert_rowid();
        self.event_type_ids.insert(event_type.to_string(), id);
        Ok(id)
    }

    /// Insert a state at an exact epoch-seconds value. Returns its `state_id`.
    ///
    /// `attributes` goes to `state_attributes.shared_attrs` verbatim, so it
    /// may be deliberately malformed.
    pub fn state_at_epoch(
        &mut self,
        entity_id: &str,
        state: &str,
        attributes: Option<&str>,
        last_updated_ts: f64,
    ) -> InspectResult<i64> {
        let metadata_id = self.metadata_id(entity_id)?;
        let attributes_id = match attributes {
            Some(shared) => {
                self.conn
                    .execute(
                        "INSERT INTO state_attributes (hash, shared_attrs) VALUES (0, ?1)",
                        params![shared],
                    )
                    .map_err(to_query_err("insert state_attributes"))?;
                Some(self.conn.last_insert_rowid())
            }
            None => None,
        };
        self.conn
            .execute(
                "INSERT INTO states (state, last_changed_ts, last_updated_ts, attributes_id, metadata_id)
                 VALUES (?1, ?2, ?2, ?3, ?4)",
                params![state, last_updated_ts, attributes_id, metadata_id],
            )
            .map_err(to_query_err("insert state"))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn state(
        &mut self,
        entity_id: &str,
        state: &str,
        attributes: Option<&str>,
        last_updated: DateTime<Utc>,
    ) -> InspectResult<i64> {
        self.state_at_epoch(entity_id, state, attributes, instant_to_epoch(last_updated))
    }

    /// Insert an event with a raw `shared_data` payload. Returns its `event_id`.
    pub fn event(
        &mut self,
        event_type: &str,
        data: Option<&str>,
        time_fired: DateTime<Utc>,
        context_id: Option<&str>,
    ) -> InspectResult<i64> {
        self.event_at_epoch(event_type, data, instant_to_epoch(time_fired), context_id)
    }

    pub fn event_at_epoch(
        &mut self,
        event_type: &str,
        data: Option<&str>,
        time_fired_ts: f64,
        context_id: Option<&str>,
    ) -> InspectResult<i64> {
        let event_type_id = self.event_type_id(event_type)?;
        let data_id = match data {
            Some(shared) => {
                self.conn
                    .execute(
                        "INSERT INTO event_data (hash, shared_data) VALUES (0, ?1)",
                        params![shared],
                    )
                    .map_err(to_query_err("insert event_data"))?;
                Some(self.conn.last_insert_rowid())
            }
            None => None,
        };
        self.conn
            .execute(
                "INSERT INTO events (origin_idx, time_fired_ts, context_id, data_id, event_type_id)
                 VALUES (0, ?1, ?2, ?3, ?4)",
                params![time_fired_ts, context_id, data_id, event_type_id],
            )
            .map_err(to_query_err("insert event"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// A `state_changed` event carrying `entity_id` and the new state.
    pub fn state_changed(
        &mut self,
        entity_id: &str,
        new_state: &str,
        time_fired: DateTime<Utc>,
    ) -> InspectResult<i64> {
        let payload = serde_json::json!({
            "entity_id": entity_id,
            "new_state": { "state": new_state },
        });
        self.event("state_changed", Some(&payload.to_string()), time_fired, None)
    }
}
