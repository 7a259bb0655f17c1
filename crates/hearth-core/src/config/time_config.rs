//! Reference timezone and window defaults.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{InspectError, InspectResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// UTC offset every displayed instant is normalized to, e.g. `+09:00`.
    pub reference_offset: String,
    /// Lookback used for the remote logbook when the window has no start.
    pub remote_default_lookback_hours: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            reference_offset: "+09:00".to_string(),
            remote_default_lookback_hours: 24,
        }
    }
}

/// Ten years; anything longer is a misconfiguration.
pub const MAX_REMOTE_LOOKBACK_HOURS: u32 = 87_600;

impl TimeConfig {
    pub fn validate(&self) -> InspectResult<()> {
        self.reference_timezone()?;
        if self.remote_default_lookback_hours > MAX_REMOTE_LOOKBACK_HOURS {
            return Err(InspectError::Config(format!(
                "remote_default_lookback_hours {} exceeds {MAX_REMOTE_LOOKBACK_HOURS}",
                self.remote_default_lookback_hours
            )));
        }
        Ok(())
    }

    /// Parse `reference_offset` into a usable timezone.
    pub fn reference_timezone(&self) -> InspectResult<FixedOffset> {
        parse_offset(&self.reference_offset)
    }
}

/// Parse `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HHMM` into a fixed offset.
pub fn parse_offset(raw: &str) -> InspectResult<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    raw.parse::<FixedOffset>()
        .map_err(|e| InspectError::Config(format!("invalid reference_offset {raw:?}: {e}")))
}
