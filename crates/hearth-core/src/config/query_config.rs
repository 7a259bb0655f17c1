//! Query subsystem configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{InspectError, InspectResult};

/// Row-limit policy and execution bounds applied to every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Limit used when a request names none.
    pub default_row_limit: u32,
    /// Hard ceiling; larger requests are clamped to it.
    pub max_row_limit: u32,
    /// Per-query wall-clock budget. `None` disables the interrupt.
    pub query_timeout_ms: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_row_limit: 100,
            max_row_limit: 500_000,
            query_timeout_ms: None,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> InspectResult<()> {
        if self.default_row_limit == 0 || self.max_row_limit == 0 {
            return Err(InspectError::Config(
                "row limits must be positive".to_string(),
            ));
        }
        if self.default_row_limit > self.max_row_limit {
            return Err(InspectError::Config(format!(
                "default_row_limit {} exceeds max_row_limit {}",
                self.default_row_limit, self.max_row_limit
            )));
        }
        if self.query_timeout_ms == Some(0) {
            return Err(InspectError::Config(
                "query_timeout_ms must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
