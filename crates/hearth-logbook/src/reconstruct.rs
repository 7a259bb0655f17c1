//! Event → logbook entry conversion and the shared post-processing step.

use std::cmp::Ordering;

use tracing::debug;

use hearth_core::as_of::{AsOfLookup, AsOfRequest};
use hearth_core::models::domain_of;
use hearth_core::normalize::Normalizer;
use hearth_core::{EventRecord, FilterSpec, InspectResult, LogbookEntry, StateRecord};
use hearth_remote::RemoteLogbookEntry;

/// One entry from a store event and the state correlated with it.
///
/// Domain comes from the entity id, else the payload. Name comes from the
/// payload, else the correlated state's `friendly_name`.
pub fn entry_from_event(
    event: EventRecord,
    correlated_state: Option<StateRecord>,
    normalizer: &Normalizer,
) -> LogbookEntry {
    let domain = event
        .entity_id
        .as_deref()
        .and_then(domain_of)
        .or_else(|| event.embedded_domain())
        .map(String::from);
    let name = event
        .embedded_name()
        .or_else(|| correlated_state.as_ref().and_then(StateRecord::friendly_name))
        .map(String::from);
    let state = event.embedded_state().map(String::from);

    LogbookEntry {
        when: normalizer.localize(event.time_fired),
        domain,
        name,
        state,
        event_type: Some(event.event_type),
        context_id: event.context_id,
        event_id: Some(event.event_id),
        entity_id: event.entity_id,
        correlated_state,
    }
}

/// One entry from the remote API. Entries without a usable `when` are dropped.
pub fn entry_from_remote(entry: RemoteLogbookEntry, normalizer: &Normalizer) -> Option<LogbookEntry> {
    let Some(when) = entry.when_instant() else {
        debug!(entity_id = ?entry.entity_id, "remote entry without usable time dropped");
        return None;
    };
    let domain = entry
        .domain
        .or_else(|| entry.entity_id.as_deref().and_then(domain_of).map(String::from));
    Some(LogbookEntry {
        when: normalizer.localize(when),
        entity_id: entry.entity_id,
        domain,
        name: entry.name,
        state: entry.state,
        event_type: None,
        context_id: entry.context_id,
        event_id: None,
        correlated_state: None,
    })
}

/// Correlate store events with their as-of state and post-process them.
///
/// Excluded events are set aside before any lookup; the rest are resolved in
/// one batch.
pub fn reconstruct<L>(
    mut events: Vec<EventRecord>,
    lookup: &L,
    filter: &FilterSpec,
    normalizer: &Normalizer,
) -> InspectResult<Vec<LogbookEntry>>
where
    L: AsOfLookup + ?Sized,
{
    events.retain(|e| !is_excluded(e.entity_id.as_deref(), filter));

    let requests: Vec<AsOfRequest> = events
        .iter()
        .filter_map(|e| {
            e.entity_id
                .as_ref()
                .map(|id| AsOfRequest::new(id.clone(), e.time_fired))
        })
        .collect();
    let mut resolved = lookup.resolve_many(&requests)?.into_iter();

    let entries = events
        .into_iter()
        .map(|event| {
            let correlated = match event.entity_id {
                Some(_) => resolved.next().flatten(),
                None => None,
            };
            entry_from_event(event, correlated, normalizer)
        })
        .collect();
    Ok(finalize(entries, filter, normalizer))
}

fn is_excluded(entity_id: Option<&str>, filter: &FilterSpec) -> bool {
    entity_id.is_some_and(|id| filter.is_excluded(id))
}

/// Newest first; equal instants by entity id, then newest event id.
fn newest_first(a: &LogbookEntry, b: &LogbookEntry) -> Ordering {
    b.when
        .cmp(&a.when)
        .then_with(|| a.entity_id.cmp(&b.entity_id))
        .then_with(|| b.event_id.cmp(&a.event_id))
}

/// Post-processing shared by store and remote entries: drop `unavailable`,
/// drop excluded entities, localize, sort.
pub fn finalize(
    mut entries: Vec<LogbookEntry>,
    filter: &FilterSpec,
    normalizer: &Normalizer,
) -> Vec<LogbookEntry> {
    let before = entries.len();
    entries.retain(|e| !e.is_unavailable() && !is_excluded(e.entity_id.as_deref(), filter));

    let tz = normalizer.timezone();
    for entry in &mut entries {
        entry.when = entry.when.with_timezone(&tz);
    }
    entries.sort_by(newest_first);

    debug!(kept = entries.len(), dropped = before - entries.len(), "logbook entries finalized");
    entries
}
