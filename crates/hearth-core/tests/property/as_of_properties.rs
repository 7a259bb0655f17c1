//! Property tests: bulk as-of resolution agrees with the pointwise definition,
//! resolution is monotonic in time, and epoch conversion round-trips.

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use hearth_core::as_of::{resolve_pointwise, AsOfIndex, AsOfRequest};
use hearth_core::normalize::{epoch_to_instant, instant_to_epoch};
use hearth_core::StateRecord;

const ENTITIES: [&str; 3] = ["light.kitchen", "sensor.temp1", "switch.pump"];

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

// Strategy: a random timeline. Small time domain so identical timestamps occur.
fn timeline() -> impl Strategy<Value = Vec<StateRecord>> {
    prop::collection::vec((0usize..ENTITIES.len(), 0i64..40), 0..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (e, t))| StateRecord {
                state_id: i as i64 + 1,
                entity_id: ENTITIES[e].to_string(),
                state: format!("s{i}"),
                attributes: serde_json::Value::Null,
                last_updated: at(t),
                last_changed: at(t),
            })
            .collect()
    })
}

fn requests() -> impl Strategy<Value = Vec<AsOfRequest>> {
    prop::collection::vec((0usize..ENTITIES.len() + 1, -5i64..50), 0..40).prop_map(|rows| {
        rows.into_iter()
            .map(|(e, t)| {
                let entity = ENTITIES.get(e).copied().unwrap_or("light.absent");
                AsOfRequest::new(entity, at(t))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_batched_matches_pointwise(states in timeline(), reqs in requests()) {
        let index = AsOfIndex::from_records(states.clone());
        let batched = index.resolve_batch(&reqs);
        for (req, got) in reqs.iter().zip(batched) {
            let expected = resolve_pointwise(&states, &req.entity_id, req.at);
            prop_assert_eq!(got, expected);
            prop_assert_eq!(index.resolve(&req.entity_id, req.at), expected);
        }
    }

    #[test]
    fn prop_result_is_latest_not_after_t(states in timeline(), e in 0usize..ENTITIES.len(), t in -5i64..50) {
        let index = AsOfIndex::from_records(states.clone());
        match index.resolve(ENTITIES[e], at(t)) {
            Some(found) => {
                prop_assert!(found.last_updated <= at(t));
                for other in states.iter().filter(|s| s.entity_id == ENTITIES[e]) {
                    prop_assert!(!(other.last_updated > found.last_updated && other.last_updated <= at(t)));
                }
            }
            None => {
                prop_assert!(states
                    .iter()
                    .all(|s| s.entity_id != ENTITIES[e] || s.last_updated > at(t)));
            }
        }
    }

    #[test]
    fn prop_monotonic_in_time(states in timeline(), e in 0usize..ENTITIES.len(), t1 in -5i64..50, dt in 0i64..30) {
        let index = AsOfIndex::from_records(states);
        let early = index.resolve(ENTITIES[e], at(t1));
        let late = index.resolve(ENTITIES[e], at(t1 + dt));
        if let Some(early) = early {
            let late = late.expect("a later instant cannot lose the state");
            prop_assert!((late.last_updated, late.state_id) >= (early.last_updated, early.state_id));
        }
    }

    #[test]
    fn prop_epoch_round_trip(micros in -4_000_000_000_000_000i64..4_000_000_000_000_000i64) {
        let secs = micros as f64 / 1_000_000.0;
        let instant = epoch_to_instant(secs).unwrap();
        prop_assert_eq!(instant.timestamp_micros(), micros);
        prop_assert_eq!(instant_to_epoch(instant), secs);
    }
}
