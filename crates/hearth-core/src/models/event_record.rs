use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fired event. Not every event is scoped to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: i64,
    pub event_type: String,
    pub time_fired: DateTime<Utc>,
    pub entity_id: Option<String>,
    /// Decoded event payload (`Null` when the event carries none).
    pub data: serde_json::Value,
    pub context_id: Option<String>,
}

impl EventRecord {
    /// State carried by the event itself: `state`, or `new_state.state` for
    /// state-change payloads.
    pub fn embedded_state(&self) -> Option<&str> {
        self.data
            .get("state")
            .and_then(|v| v.as_str())
            .or_else(|| {
                self.data
                    .get("new_state")
                    .and_then(|s| s.get("state"))
                    .and_then(|v| v.as_str())
            })
    }

    pub fn embedded_name(&self) -> Option<&str> {
        self.data.get("name").and_then(|v| v.as_str())
    }

    pub fn embedded_domain(&self) -> Option<&str> {
        self.data.get("domain").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(data: serde_json::Value) -> EventRecord {
        EventRecord {
            event_id: 1,
            event_type: "state_changed".to_string(),
            time_fired: DateTime::from_timestamp(100, 0).unwrap(),
            entity_id: Some("light.kitchen".to_string()),
            data,
            context_id: None,
        }
    }

    #[test]
    fn embedded_state_prefers_top_level() {
        let e = event(json!({"state": "on", "new_state": {"state": "off"}}));
        assert_eq!(e.embedded_state(), Some("on"));
    }

    #[test]
    fn embedded_state_falls_back_to_new_state() {
        let e = event(json!({"new_state": {"state": "off"}}));
        assert_eq!(e.embedded_state(), Some("off"));
    }

    #[test]
    fn missing_payload_has_nothing_embedded() {
        let e = event(serde_json::Value::Null);
        assert_eq!(e.embedded_state(), None);
        assert_eq!(e.embedded_name(), None);
        assert_eq!(e.embedded_domain(), None);
    }
}
