//! Filter specs: optional predicates plus an always-present, capped row limit.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::QueryConfig;
use crate::errors::{InspectError, InspectResult};

/// Row cap applied server-side by every query shape.
///
/// Only constructible through [`RowLimit::resolve`], so a value in hand is
/// always positive and at most the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RowLimit(u32);

impl RowLimit {
    /// Pick the configured default when nothing was requested, clamp anything
    /// above the ceiling, reject zero.
    pub fn resolve(requested: Option<u32>, config: &QueryConfig) -> InspectResult<Self> {
        match requested {
            None => Ok(Self(config.default_row_limit.min(config.max_row_limit))),
            Some(0) => Err(InspectError::InvalidFilter(
                "row_limit must be positive".to_string(),
            )),
            Some(n) => Ok(Self(n.min(config.max_row_limit))),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Predicates attached to one query request. Held by the caller, never by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    /// Substring matched against entity ids (SQL `LIKE %pattern%`).
    pub entity_include_pattern: Option<String>,
    /// Exact entity ids removed from logbook output.
    pub entity_exclude_set: BTreeSet<String>,
    /// Substring matched against raw or looked-up event types.
    pub event_type_pattern: Option<String>,
    pub row_limit: RowLimit,
}

impl FilterSpec {
    /// No predicates, default row limit.
    pub fn new(config: &QueryConfig) -> InspectResult<Self> {
        Ok(Self {
            entity_include_pattern: None,
            entity_exclude_set: BTreeSet::new(),
            event_type_pattern: None,
            row_limit: RowLimit::resolve(None, config)?,
        })
    }

    pub fn with_row_limit(mut self, requested: u32, config: &QueryConfig) -> InspectResult<Self> {
        self.row_limit = RowLimit::resolve(Some(requested), config)?;
        Ok(self)
    }

    /// Blank patterns are treated as absent.
    pub fn with_entity_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.entity_include_pattern = non_blank(pattern.into());
        self
    }

    pub fn with_event_type_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.event_type_pattern = non_blank(pattern.into());
        self
    }

    pub fn excluding<I, S>(mut self, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_exclude_set.extend(
            entity_ids
                .into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.trim().is_empty()),
        );
        self
    }

    /// Exclusions typed as free text, separated by commas and/or whitespace.
    pub fn excluding_text(self, text: &str) -> Self {
        self.excluding(parse_exclusions(text))
    }

    pub fn is_excluded(&self, entity_id: &str) -> bool {
        self.entity_exclude_set.contains(entity_id)
    }
}

/// Split `"sensor.temp1, binary_sensor.motion sensor.x"` into exact ids.
pub fn parse_exclusions(text: &str) -> BTreeSet<String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueryConfig {
        QueryConfig {
            default_row_limit: 100,
            max_row_limit: 1000,
            query_timeout_ms: None,
        }
    }

    #[test]
    fn missing_limit_uses_default() {
        assert_eq!(RowLimit::resolve(None, &config()).unwrap().get(), 100);
    }

    #[test]
    fn oversized_limit_is_clamped() {
        assert_eq!(RowLimit::resolve(Some(50_000), &config()).unwrap().get(), 1000);
        assert_eq!(RowLimit::resolve(Some(7), &config()).unwrap().get(), 7);
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(
            RowLimit::resolve(Some(0), &config()),
            Err(InspectError::InvalidFilter(_))
        ));
    }

    #[test]
    fn exclusion_text_splits_on_commas_and_spaces() {
        let set = parse_exclusions(" sensor.temp1, binary_sensor.motion\tsensor.x,, ");
        let expected: BTreeSet<String> = ["binary_sensor.motion", "sensor.temp1", "sensor.x"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn exclusion_is_exact_match() {
        let spec = FilterSpec::new(&config()).unwrap().excluding_text("sensor.temp1");
        assert!(spec.is_excluded("sensor.temp1"));
        assert!(!spec.is_excluded("sensor.temp10"));
        assert!(!spec.is_excluded("sensor.temp"));
    }

    #[test]
    fn blank_patterns_are_dropped() {
        let spec = FilterSpec::new(&config())
            .unwrap()
            .with_entity_pattern("   ")
            .with_event_type_pattern(" call_service ");
        assert_eq!(spec.entity_include_pattern, None);
        assert_eq!(spec.event_type_pattern.as_deref(), Some("call_service"));
    }
}
