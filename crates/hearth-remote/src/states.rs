//! Current state listing from `/api/states`, with a per-domain size summary.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use hearth_core::models::domain_of;
use hearth_core::{InspectError, InspectResult};

/// One entity's current state. `payload` is the object exactly as served.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteState {
    pub entity_id: String,
    pub domain: String,
    pub state: String,
    pub last_updated: Option<String>,
    /// Size of `payload` re-serialized as compact JSON.
    pub payload_bytes: usize,
    pub payload: serde_json::Value,
}

impl RemoteState {
    /// `None` for objects without a string `entity_id`.
    fn from_payload(payload: serde_json::Value) -> Option<Self> {
        let entity_id = payload.get("entity_id")?.as_str()?.to_string();
        let domain = domain_of(&entity_id).unwrap_or_default().to_string();
        let text = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(String::from);
        let state = text("state").unwrap_or_default();
        let last_updated = text("last_updated");
        let payload_bytes = serde_json::to_vec(&payload).map(|b| b.len()).unwrap_or(0);
        Some(Self {
            entity_id,
            domain,
            state,
            last_updated,
            payload_bytes,
            payload,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainSummary {
    pub domain: String,
    pub entity_count: usize,
    pub payload_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateListing {
    pub states: Vec<RemoteState>,
}

impl StateListing {
    /// Every domain present, sorted by name.
    pub fn domains(&self) -> BTreeSet<&str> {
        self.states.iter().map(|s| s.domain.as_str()).collect()
    }

    /// Entity count and payload bytes per domain, sorted by domain.
    pub fn summary(&self) -> Vec<DomainSummary> {
        let mut by_domain: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for state in &self.states {
            let slot = by_domain.entry(state.domain.as_str()).or_default();
            slot.0 += 1;
            slot.1 += state.payload_bytes;
        }
        by_domain
            .into_iter()
            .map(|(domain, (entity_count, payload_bytes))| DomainSummary {
                domain: domain.to_string(),
                entity_count,
                payload_bytes,
            })
            .collect()
    }

    /// States in `domains` (all when `None`) whose entity id contains
    /// `entity_filter`, case-insensitively.
    pub fn select(
        &self,
        domains: Option<&BTreeSet<String>>,
        entity_filter: Option<&str>,
    ) -> Vec<&RemoteState> {
        let needle = entity_filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);
        self.states
            .iter()
            .filter(|s| domains.map_or(true, |d| d.contains(&s.domain)))
            .filter(|s| {
                needle
                    .as_deref()
                    .map_or(true, |n| s.entity_id.to_lowercase().contains(n))
            })
            .collect()
    }

    /// Sum of payload bytes over a selection.
    pub fn total_bytes(selection: &[&RemoteState]) -> usize {
        selection.iter().map(|s| s.payload_bytes).sum()
    }
}

/// Decode a `/api/states` response body. Objects without an entity id are skipped.
pub fn parse_states(body: &str) -> InspectResult<StateListing> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| InspectError::remote_failed("decode states response", e))?;
    let total = raw.len();
    let states: Vec<RemoteState> = raw.into_iter().filter_map(RemoteState::from_payload).collect();
    if states.len() < total {
        tracing::debug!(skipped = total - states.len(), "states without entity_id");
    }
    Ok(StateListing { states })
}
