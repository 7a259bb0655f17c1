//! Blocking REST client for the live system.

use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, Utc};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use tracing::{debug, info};

use hearth_core::config::RemoteConfig;
use hearth_core::{InspectError, InspectResult, TimeWindow};

use crate::entry::{parse_logbook, RemoteLogbookEntry};
use crate::states::{parse_states, StateListing};

/// Concrete bounds for a remote logbook call.
///
/// An unset end means `now`; an unset start means `end - lookback`.
pub fn resolve_remote_window(
    window: &TimeWindow,
    now: DateTime<Utc>,
    lookback: Duration,
) -> InspectResult<(DateTime<Utc>, DateTime<Utc>)> {
    window.validate()?;
    let end = window.end.unwrap_or(now);
    let start = match window.start {
        Some(start) => start,
        None => end.checked_sub_signed(lookback).ok_or_else(|| InspectError::InvalidRange {
            start: format!("{end} minus {lookback}"),
            end: end.to_rfc3339(),
        })?,
    };
    TimeWindow::between(start, end).validate()?;
    Ok((start, end))
}

pub struct RemoteClient {
    base: Url,
    token: String,
    http: Client,
}

impl RemoteClient {
    /// Build from config. Both `base_url` and `token` are required.
    pub fn from_config(config: &RemoteConfig) -> InspectResult<Self> {
        let raw = config
            .base_url
            .as_deref()
            .ok_or_else(|| InspectError::Config("remote.base_url is not set".to_string()))?;
        let token = config
            .token
            .clone()
            .ok_or_else(|| InspectError::Config("remote.token is not set".to_string()))?;
        let base = Url::parse(raw)
            .map_err(|e| InspectError::Config(format!("invalid remote.base_url {raw:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(InspectError::Config(format!(
                "remote.base_url {raw:?} cannot carry a path"
            )));
        }

        let http = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InspectError::remote_failed("build http client", e))?;

        Ok(Self { base, token, http })
    }

    fn endpoint(&self, segments: &[&str]) -> InspectResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| InspectError::Config(format!("base url {} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET {base}/api/logbook/{start}?end_time={end}[&entity={id}]`, with
    /// both instants rendered in `tz`.
    pub fn logbook_url(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        tz: FixedOffset,
        entity_id: Option<&str>,
    ) -> InspectResult<Url> {
        let iso = |t: DateTime<Utc>| t.with_timezone(&tz).to_rfc3339_opts(SecondsFormat::Secs, false);
        let mut url = self.endpoint(&["api", "logbook", &iso(start)])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("end_time", &iso(end));
            if let Some(entity_id) = entity_id.map(str::trim).filter(|e| !e.is_empty()) {
                query.append_pair("entity", entity_id);
            }
        }
        Ok(url)
    }

    fn get_text(&self, url: Url, what: &str) -> InspectResult<String> {
        let started = Instant::now();
        debug!(url = %url, "remote request");
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .map_err(|e| InspectError::remote_failed(format!("GET {what}"), e))?
            .error_for_status()
            .map_err(|e| InspectError::remote_failed(format!("GET {what}"), e))?;
        let body = response
            .text()
            .map_err(|e| InspectError::remote_failed(format!("read {what} body"), e))?;
        info!(
            endpoint = what,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "remote request complete"
        );
        Ok(body)
    }

    /// Raw logbook entries for the window. No filtering is applied here.
    pub fn fetch_logbook(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        tz: FixedOffset,
        entity_id: Option<&str>,
    ) -> InspectResult<Vec<RemoteLogbookEntry>> {
        let url = self.logbook_url(start, end, tz, entity_id)?;
        let entries = parse_logbook(&self.get_text(url, "/api/logbook")?)?;
        debug!(count = entries.len(), "remote logbook entries");
        Ok(entries)
    }

    /// Every entity's current state.
    pub fn fetch_states(&self) -> InspectResult<StateListing> {
        let url = self.endpoint(&["api", "states"])?;
        parse_states(&self.get_text(url, "/api/states")?)
    }
}
