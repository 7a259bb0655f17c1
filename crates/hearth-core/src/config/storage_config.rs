//! Storage connection configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the recorder database (`home-assistant_v2.db`).
    pub db_path: Option<String>,
    /// SQLite busy_timeout applied to every connection.
    pub busy_timeout_ms: u32,
    /// Extra read-only connections. Zero keeps a single shared handle.
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: 5000,
            read_pool_size: 0,
        }
    }
}
