//! Property tests: whatever the input order, the logbook never contains
//! excluded or unavailable entries and is ordered newest first.

use chrono::{DateTime, FixedOffset, Utc};
use proptest::prelude::*;

use hearth_core::as_of::AsOfIndex;
use hearth_core::config::{NormalizeConfig, QueryConfig};
use hearth_core::normalize::Normalizer;
use hearth_core::{EventRecord, FilterSpec, StateRecord};
use hearth_logbook::reconstruct;

const ENTITIES: [&str; 4] = ["light.kitchen", "sensor.temp1", "sensor.temp2", "switch.pump"];
const STATES: [&str; 3] = ["on", "off", "unavailable"];

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn states() -> impl Strategy<Value = Vec<StateRecord>> {
    prop::collection::vec((0usize..ENTITIES.len(), 0usize..STATES.len(), 0i64..50), 0..30)
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (e, s, t))| StateRecord {
                    state_id: i as i64 + 1,
                    entity_id: ENTITIES[e].to_string(),
                    state: STATES[s].to_string(),
                    attributes: serde_json::Value::Null,
                    last_updated: at(t),
                    last_changed: at(t),
                })
                .collect()
        })
}

fn events() -> impl Strategy<Value = Vec<EventRecord>> {
    prop::collection::vec(
        (0usize..ENTITIES.len() + 1, prop::option::of(0usize..STATES.len()), 0i64..60),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (e, s, t))| {
                let entity = ENTITIES.get(e).map(|id| id.to_string());
                let data = match s {
                    Some(s) => serde_json::json!({ "new_state": { "state": STATES[s] } }),
                    None => serde_json::Value::Null,
                };
                EventRecord {
                    event_id: i as i64 + 1,
                    event_type: "state_changed".to_string(),
                    time_fired: at(t),
                    entity_id: entity,
                    data,
                    context_id: None,
                }
            })
            .collect()
    })
}

fn normalizer() -> Normalizer {
    Normalizer::new(&NormalizeConfig::default(), FixedOffset::east_opt(9 * 3600).unwrap())
}

proptest! {
    #[test]
    fn prop_logbook_rules_hold(
        states in states(),
        events in events(),
        excluded in prop::collection::btree_set(0usize..ENTITIES.len(), 0..3),
        reverse in any::<bool>(),
    ) {
        let filter = FilterSpec::new(&QueryConfig::default())
            .unwrap()
            .excluding(excluded.iter().map(|i| ENTITIES[*i]));
        let index = AsOfIndex::from_records(states);
        let mut events = events;
        if reverse {
            events.reverse();
        }

        let entries = reconstruct(events, &index, &filter, &normalizer()).unwrap();

        for entry in &entries {
            prop_assert!(!entry.is_unavailable());
            if let Some(id) = &entry.entity_id {
                prop_assert!(!filter.is_excluded(id));
            }
            prop_assert_eq!(entry.when.offset().local_minus_utc(), 9 * 3600);
        }
        for pair in entries.windows(2) {
            prop_assert!(pair[0].when >= pair[1].when);
        }
    }

    #[test]
    fn prop_order_independent_of_fetch_order(events in events()) {
        let index = AsOfIndex::from_records(Vec::new());
        let filter = FilterSpec::new(&QueryConfig::default()).unwrap();
        let mut reversed = events.clone();
        reversed.reverse();

        let a = reconstruct(events, &index, &filter, &normalizer()).unwrap();
        let b = reconstruct(reversed, &index, &filter, &normalizer()).unwrap();
        let ids = |v: &[hearth_core::LogbookEntry]| v.iter().map(|e| e.event_id).collect::<Vec<_>>();
        prop_assert_eq!(ids(&a), ids(&b));
    }
}
