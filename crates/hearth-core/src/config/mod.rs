pub mod normalize_config;
pub mod observability_config;
pub mod query_config;
pub mod remote_config;
pub mod storage_config;
pub mod time_config;

use serde::{Deserialize, Serialize};

use crate::errors::InspectResult;

pub use normalize_config::NormalizeConfig;
pub use observability_config::ObservabilityConfig;
pub use query_config::QueryConfig;
pub use remote_config::RemoteConfig;
pub use storage_config::StorageConfig;
pub use time_config::TimeConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HearthConfig {
    pub query: QueryConfig,
    pub time: TimeConfig,
    pub normalize: NormalizeConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub observability: ObservabilityConfig,
}

impl HearthConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    /// The result is validated before it is returned.
    pub fn from_toml(toml_str: &str) -> InspectResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> InspectResult<()> {
        self.query.validate()?;
        self.time.validate()?;
        Ok(())
    }
}
