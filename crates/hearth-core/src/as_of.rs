//! As-of state resolution: the state in effect for an entity at an instant.
//!
//! The contract is pointwise: for entity `E` and instant `T`, the record with
//! the greatest `last_updated <= T` (ties → greatest `state_id`), or nothing.
//! [`resolve_pointwise`] is that definition verbatim; [`AsOfIndex`] answers
//! the same question in bulk and must agree with it on every input.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::errors::InspectResult;
use crate::models::StateRecord;

/// One as-of question.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsOfRequest {
    pub entity_id: String,
    pub at: DateTime<Utc>,
}

impl AsOfRequest {
    pub fn new(entity_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            entity_id: entity_id.into(),
            at,
        }
    }
}

/// Anything that can answer as-of questions in bulk.
///
/// The result is parallel to `requests`.
pub trait AsOfLookup {
    fn resolve_many(&self, requests: &[AsOfRequest]) -> InspectResult<Vec<Option<StateRecord>>>;
}

/// Reference definition: a linear scan over every record.
pub fn resolve_pointwise<'a>(
    states: &'a [StateRecord],
    entity_id: &str,
    at: DateTime<Utc>,
) -> Option<&'a StateRecord> {
    states
        .iter()
        .filter(|s| s.entity_id == entity_id && s.last_updated <= at)
        .max_by_key(|s| (s.last_updated, s.state_id))
}

/// Earliest and latest requested instant per entity.
///
/// A store only has to load, per entity, the records from the as-of record at
/// the earliest instant through the latest instant to answer every request.
pub fn request_spans(requests: &[AsOfRequest]) -> BTreeMap<&str, (DateTime<Utc>, DateTime<Utc>)> {
    let mut spans: BTreeMap<&str, (DateTime<Utc>, DateTime<Utc>)> = BTreeMap::new();
    for req in requests {
        spans
            .entry(req.entity_id.as_str())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(req.at);
                *hi = (*hi).max(req.at);
            })
            .or_insert((req.at, req.at));
    }
    spans
}

/// Per-entity timelines sorted by `(last_updated, state_id)`.
#[derive(Debug, Default, Clone)]
pub struct AsOfIndex {
    timelines: HashMap<String, Vec<StateRecord>>,
}

impl AsOfIndex {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = StateRecord>,
    {
        let mut timelines: HashMap<String, Vec<StateRecord>> = HashMap::new();
        for record in records {
            timelines.entry(record.entity_id.clone()).or_default().push(record);
        }
        for timeline in timelines.values_mut() {
            timeline.sort_by_key(|s| (s.last_updated, s.state_id));
        }
        Self { timelines }
    }

    pub fn entity_count(&self) -> usize {
        self.timelines.len()
    }

    pub fn record_count(&self) -> usize {
        self.timelines.values().map(Vec::len).sum()
    }

    /// Single lookup by binary search.
    pub fn resolve(&self, entity_id: &str, at: DateTime<Utc>) -> Option<&StateRecord> {
        let timeline = self.timelines.get(entity_id)?;
        let idx = timeline.partition_point(|s| s.last_updated <= at);
        idx.checked_sub(1).map(|i| &timeline[i])
    }

    /// Bulk lookup: requests are grouped per entity, ordered by instant, and
    /// answered in one forward merge over that entity's timeline.
    pub fn resolve_batch(&self, requests: &[AsOfRequest]) -> Vec<Option<&StateRecord>> {
        let mut out: Vec<Option<&StateRecord>> = vec![None; requests.len()];

        let mut by_entity: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, req) in requests.iter().enumerate() {
            by_entity.entry(req.entity_id.as_str()).or_default().push(i);
        }

        for (entity_id, mut indices) in by_entity {
            let Some(timeline) = self.timelines.get(entity_id) else {
                continue;
            };
            indices.sort_by_key(|&i| requests[i].at);

            let mut cursor = 0usize;
            for i in indices {
                let at = requests[i].at;
                while cursor < timeline.len() && timeline[cursor].last_updated <= at {
                    cursor += 1;
                }
                out[i] = cursor.checked_sub(1).map(|c| &timeline[c]);
            }
        }

        out
    }
}

impl AsOfLookup for AsOfIndex {
    fn resolve_many(&self, requests: &[AsOfRequest]) -> InspectResult<Vec<Option<StateRecord>>> {
        Ok(self
            .resolve_batch(requests)
            .into_iter()
            .map(|r| r.cloned())
            .collect())
    }
}
