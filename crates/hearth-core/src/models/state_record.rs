use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of an entity's state history. Owned by the recorder; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state_id: i64,
    pub entity_id: String,
    pub state: String,
    /// Decoded attribute payload. Raw text when the stored value is not JSON.
    pub attributes: serde_json::Value,
    pub last_updated: DateTime<Utc>,
    pub last_changed: DateTime<Utc>,
}

impl StateRecord {
    /// `friendly_name` attribute, if the payload carries one.
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(|v| v.as_str())
    }
}
