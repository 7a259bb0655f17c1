//! HistoryStore: read-only handle on a recorder database.
//!
//! One primary connection reused across requests, plus optional read-only
//! readers selected round-robin. Nothing else is shared between calls; every
//! query takes a fully-formed window and filter.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OpenFlags};
use tracing::{debug, info, warn};

use hearth_core::as_of::{AsOfLookup, AsOfRequest};
use hearth_core::config::QueryConfig;
use hearth_core::models::QueryResult;
use hearth_core::normalize::Normalizer;
use hearth_core::{
    EventRecord, FilterSpec, HearthConfig, InspectError, InspectResult, RowLimit, StateRecord,
    TimeWindow,
};

use crate::catalog::Catalog;
use crate::pragmas::configure_readonly_connection;
use crate::queries::builder::{self, BuiltQuery, QueryShape};
use crate::queries::rows::{self, RawRows};
use crate::queries::{as_of, events};
use crate::to_query_err;

/// SQLite VM steps between deadline checks.
const PROGRESS_OPS: i32 = 1_000;

pub struct HistoryStore {
    primary: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
    query: QueryConfig,
    normalizer: Normalizer,
}

impl HistoryStore {
    /// Open the recorder database at `path` read-only.
    pub fn open(path: &Path, config: &HearthConfig) -> InspectResult<Self> {
        config.validate()?;
        let open_reader = |what: &str| -> InspectResult<Connection> {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| InspectError::query_failed(format!("open {what} {}", path.display()), e))?;
            configure_readonly_connection(&conn, config.storage.busy_timeout_ms)?;
            Ok(conn)
        };

        let primary = open_reader("primary")?;
        let mut readers = Vec::with_capacity(config.storage.read_pool_size);
        for i in 0..config.storage.read_pool_size {
            readers.push(Mutex::new(open_reader(&format!("reader {i}"))?));
        }

        info!(path = %path.display(), readers = readers.len(), "opened recorder store");
        Self::assemble(primary, readers, config)
    }

    /// Wrap an already-open connection (e.g. in-memory). It is switched to
    /// `query_only` before use.
    pub fn from_connection(conn: Connection, config: &HearthConfig) -> InspectResult<Self> {
        config.validate()?;
        configure_readonly_connection(&conn, config.storage.busy_timeout_ms)?;
        Self::assemble(conn, Vec::new(), config)
    }

    fn assemble(
        primary: Connection,
        readers: Vec<Mutex<Connection>>,
        config: &HearthConfig,
    ) -> InspectResult<Self> {
        let tz = config.time.reference_timezone()?;
        Ok(Self {
            primary: Mutex::new(primary),
            readers,
            read_index: AtomicUsize::new(0),
            query: config.query.clone(),
            normalizer: Normalizer::new(&config.normalize, tz),
        })
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// An empty filter with this store's default row limit.
    pub fn filter(&self) -> InspectResult<FilterSpec> {
        FilterSpec::new(&self.query)
    }

    /// Execute a closure with a connection (round-robin over readers, else primary).
    pub fn with_reader<F, T>(&self, f: F) -> InspectResult<T>
    where
        F: FnOnce(&Connection) -> InspectResult<T>,
    {
        let slot = if self.readers.is_empty() {
            &self.primary
        } else {
            let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
            &self.readers[index]
        };
        let conn = slot.lock().map_err(|e| {
            InspectError::Config(format!("connection lock poisoned: {e}"))
        })?;
        f(&conn)
    }

    /// Run `f` under the configured per-query deadline, if any.
    fn bounded<T>(
        &self,
        conn: &Connection,
        context: &str,
        f: impl FnOnce(&Connection) -> InspectResult<T>,
    ) -> InspectResult<T> {
        let Some(timeout_ms) = self.query.query_timeout_ms else {
            return f(conn);
        };
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
        let result = f(conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        match result {
            Err(e) if is_interrupted(&e) => {
                warn!(context, timeout_ms, "query interrupted by deadline");
                Err(InspectError::QueryTimedOut {
                    context: context.to_string(),
                    timeout_ms,
                })
            }
            other => other,
        }
    }

    /// SQLite library version; doubles as a connectivity check.
    pub fn ping(&self) -> InspectResult<String> {
        self.with_reader(|conn| {
            conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))
                .map_err(to_query_err("ping"))
        })
    }

    pub fn catalog(&self) -> InspectResult<Catalog> {
        self.with_reader(Catalog::load)
    }

    pub fn list_tables(&self) -> InspectResult<Vec<String>> {
        Ok(self.catalog()?.names().map(String::from).collect())
    }

    /// Re-apply this store's ceiling so a filter built elsewhere cannot exceed it.
    fn clamp(&self, filter: &FilterSpec) -> InspectResult<FilterSpec> {
        let mut filter = filter.clone();
        filter.row_limit = RowLimit::resolve(Some(filter.row_limit.get()), &self.query)?;
        Ok(filter)
    }

    /// Build the statement for `shape` without running it.
    pub fn prepare(
        &self,
        shape: &QueryShape,
        window: &TimeWindow,
        filter: &FilterSpec,
    ) -> InspectResult<BuiltQuery> {
        builder::build(shape, window, &self.clamp(filter)?)
    }

    /// Run one of the tagged query shapes and normalize the result.
    pub fn run(
        &self,
        shape: &QueryShape,
        window: &TimeWindow,
        filter: &FilterSpec,
    ) -> InspectResult<QueryResult> {
        let query = self.prepare(shape, window, filter)?;
        debug!(query = %query.describe(), "built query");

        let started = Instant::now();
        let raw = self.with_reader(|conn| {
            self.bounded(conn, &query.label, |conn| rows::run_raw(conn, &query))
        })?;
        let result = self.normalize(&query, raw);

        info!(
            shape = %query.label,
            rows = result.row_count,
            row_limit = result.row_limit_applied,
            malformed_payloads = result.malformed_payloads,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query complete"
        );
        Ok(result)
    }

    /// `SELECT *` from a table named by the caller, after catalog validation.
    /// An unknown name fails before any statement touches the table.
    pub fn run_table(&self, name: &str, filter: &FilterSpec) -> InspectResult<QueryResult> {
        let table = self.catalog()?.validate(name)?;
        self.run(&QueryShape::NamedTable(table), &TimeWindow::unbounded(), filter)
    }

    fn normalize(&self, query: &BuiltQuery, raw: RawRows) -> QueryResult {
        let RawRows { columns, rows } = raw;
        let mut malformed_payloads = 0;
        let rows: Vec<_> = rows
            .into_iter()
            .map(|row| {
                let normalized = self.normalizer.normalize_row(&columns, row);
                malformed_payloads += normalized.malformed;
                normalized.cells
            })
            .collect();

        QueryResult {
            shape: query.label.clone(),
            columns,
            row_count: rows.len(),
            rows,
            row_limit_applied: query.row_limit.get(),
            malformed_payloads,
        }
    }

    /// Events in `window` for logbook reconstruction.
    pub fn fetch_logbook_events(
        &self,
        window: &TimeWindow,
        filter: &FilterSpec,
    ) -> InspectResult<Vec<EventRecord>> {
        let filter = self.clamp(filter)?;
        let events = self.with_reader(|conn| {
            self.bounded(conn, "logbook_events", |conn| {
                events::fetch_logbook_events(conn, window, &filter)
            })
        })?;
        debug!(count = events.len(), window = %window, "fetched logbook events");
        Ok(events)
    }

    /// The state of `entity_id` in effect at `at`.
    pub fn state_as_of(&self, entity_id: &str, at: DateTime<Utc>) -> InspectResult<Option<StateRecord>> {
        self.with_reader(|conn| {
            self.bounded(conn, "state_as_of", |conn| as_of::state_as_of(conn, entity_id, at))
        })
    }
}

impl AsOfLookup for HistoryStore {
    fn resolve_many(&self, requests: &[AsOfRequest]) -> InspectResult<Vec<Option<StateRecord>>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        self.with_reader(|conn| {
            self.bounded(conn, "as_of_batch", |conn| as_of::resolve_many(conn, requests))
        })
    }
}

fn is_interrupted(e: &InspectError) -> bool {
    match e {
        InspectError::QueryExecutionFailed { source, .. } => {
            source
                .downcast_ref::<rusqlite::Error>()
                .and_then(rusqlite::Error::sqlite_error_code)
                == Some(ErrorCode::OperationInterrupted)
        }
        _ => false,
    }
}
