use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::StateRecord;

/// Sentinel state the recorder writes when an integration loses its device.
pub const UNAVAILABLE_STATE: &str = "unavailable";

/// One line of the reconstructed logbook. Built per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookEntry {
    /// When the event fired, in the reference timezone.
    pub when: DateTime<FixedOffset>,
    pub entity_id: Option<String>,
    pub domain: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub event_type: Option<String>,
    pub context_id: Option<String>,
    /// Store event id; absent for entries read from the remote API.
    pub event_id: Option<i64>,
    /// State in effect for `entity_id` when the event fired.
    pub correlated_state: Option<StateRecord>,
}

impl LogbookEntry {
    /// True when the entry's own state or its correlated state is `unavailable`.
    pub fn is_unavailable(&self) -> bool {
        self.state.as_deref() == Some(UNAVAILABLE_STATE)
            || self
                .correlated_state
                .as_ref()
                .is_some_and(|s| s.state == UNAVAILABLE_STATE)
    }
}
