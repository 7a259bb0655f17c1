//! Column classification for the result normalizer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Columns holding epoch seconds that should become instants.
    pub timestamp_columns: Vec<String>,
    /// Columns holding JSON text that should be decoded.
    pub json_columns: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            timestamp_columns: [
                "last_updated_ts",
                "last_changed_ts",
                "last_reported_ts",
                "time_fired_ts",
                "last_updated",
                "last_changed",
                "time_fired",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            json_columns: ["attributes", "shared_attrs", "shared_data", "event_data"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
