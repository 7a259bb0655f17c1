//! Logbook entries as returned by `/api/logbook`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hearth_core::normalize::{epoch_to_instant, parse_text_instant};
use hearth_core::{InspectError, InspectResult};

/// `when` arrives as ISO 8601 text on current servers, epoch seconds on some
/// older ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteInstant {
    Epoch(f64),
    Text(String),
}

impl RemoteInstant {
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(secs) => epoch_to_instant(*secs),
            Self::Text(text) => parse_text_instant(text.trim()),
        }
    }
}

/// One logbook entry. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteLogbookEntry {
    pub when: Option<RemoteInstant>,
    pub entity_id: Option<String>,
    pub state: Option<String>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub message: Option<String>,
    pub context_id: Option<String>,
}

impl RemoteLogbookEntry {
    /// `when` as an instant; `None` when missing or unparseable.
    pub fn when_instant(&self) -> Option<DateTime<Utc>> {
        self.when.as_ref().and_then(RemoteInstant::to_instant)
    }
}

/// Decode a `/api/logbook` response body.
pub fn parse_logbook(body: &str) -> InspectResult<Vec<RemoteLogbookEntry>> {
    serde_json::from_str(body)
        .map_err(|e| InspectError::remote_failed("decode logbook response", e))
}
