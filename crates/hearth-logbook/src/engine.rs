//! LogbookEngine: the entry point tying the store, the remote client and the
//! reconstruction rules together.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use hearth_core::normalize::Normalizer;
use hearth_core::{
    FilterSpec, HearthConfig, InspectError, InspectResult, LogbookEntry, RangeSelector,
    TimeWindow,
};
use hearth_remote::{resolve_remote_window, RemoteClient, StateListing};
use hearth_storage::HistoryStore;

use crate::reconstruct::{entry_from_remote, finalize, reconstruct};

pub struct LogbookEngine {
    store: HistoryStore,
    remote: Option<RemoteClient>,
    normalizer: Normalizer,
    remote_lookback: Duration,
}

impl LogbookEngine {
    /// Open the store at `storage.db_path`; the remote client is built only
    /// when `remote.base_url` is set.
    pub fn from_config(config: &HearthConfig) -> InspectResult<Self> {
        let path = config
            .storage
            .db_path
            .as_deref()
            .ok_or_else(|| InspectError::Config("storage.db_path is not set".to_string()))?;
        let store = HistoryStore::open(Path::new(path), config)?;
        let remote = match config.remote.base_url {
            Some(_) => Some(RemoteClient::from_config(&config.remote)?),
            None => None,
        };
        Ok(Self::new(store, remote, config))
    }

    pub fn new(store: HistoryStore, remote: Option<RemoteClient>, config: &HearthConfig) -> Self {
        Self {
            normalizer: store.normalizer().clone(),
            store,
            remote,
            remote_lookback: Duration::hours(i64::from(config.time.remote_default_lookback_hours)),
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Resolve a selector against `now` in the reference timezone.
    pub fn window(&self, selector: &RangeSelector, now: DateTime<Utc>) -> InspectResult<TimeWindow> {
        selector.resolve(now, self.normalizer.timezone())
    }

    /// Logbook reconstructed from the recorder store.
    pub fn logbook(&self, window: &TimeWindow, filter: &FilterSpec) -> InspectResult<Vec<LogbookEntry>> {
        let events = self.store.fetch_logbook_events(window, filter)?;
        let fetched = events.len();
        let entries = reconstruct(events, &self.store, filter, &self.normalizer)?;
        info!(window = %window, fetched, entries = entries.len(), "logbook reconstructed");
        Ok(entries)
    }

    fn remote(&self) -> InspectResult<&RemoteClient> {
        self.remote
            .as_ref()
            .ok_or_else(|| InspectError::Config("remote.base_url is not set".to_string()))
    }

    /// Logbook read from the live system.
    ///
    /// `entity_id` narrows the request server-side to one entity. The
    /// include pattern is applied locally as a case-insensitive substring,
    /// matching the store's `LIKE`. Output is capped at the row limit.
    pub fn remote_logbook(
        &self,
        window: &TimeWindow,
        filter: &FilterSpec,
        entity_id: Option<&str>,
    ) -> InspectResult<Vec<LogbookEntry>> {
        let remote = self.remote()?;
        let (start, end) = resolve_remote_window(window, Utc::now(), self.remote_lookback)?;
        let raw = remote.fetch_logbook(start, end, self.normalizer.timezone(), entity_id)?;
        let fetched = raw.len();

        let needle = filter
            .entity_include_pattern
            .as_deref()
            .map(str::to_ascii_lowercase);
        let entries: Vec<LogbookEntry> = raw
            .into_iter()
            .filter_map(|entry| entry_from_remote(entry, &self.normalizer))
            .filter(|entry| match (&needle, &entry.entity_id) {
                (None, _) => true,
                (Some(n), Some(id)) => id.to_ascii_lowercase().contains(n.as_str()),
                (Some(_), None) => false,
            })
            .collect();

        let mut entries = finalize(entries, filter, &self.normalizer);
        entries.truncate(filter.row_limit.get() as usize);
        info!(fetched, entries = entries.len(), "remote logbook assembled");
        Ok(entries)
    }

    /// Current states from the live system.
    pub fn remote_states(&self) -> InspectResult<StateListing> {
        self.remote()?.fetch_states()
    }
}
