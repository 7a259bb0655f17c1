//! Response decoding against captured-shape fixtures. No network.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use hearth_core::{InspectError, TimeWindow};
use hearth_remote::{parse_logbook, parse_states, resolve_remote_window, RemoteClient};

const STATES: &str = r#"[
  {"entity_id": "light.kitchen", "state": "on", "attributes": {"friendly_name": "Kitchen"},
   "last_changed": "2024-03-01T00:00:00+00:00", "last_updated": "2024-03-01T00:00:00+00:00"},
  {"entity_id": "light.Hall", "state": "off", "attributes": {},
   "last_updated": "2024-03-01T00:01:00+00:00"},
  {"entity_id": "sensor.temp1", "state": "21.5", "attributes": {"unit_of_measurement": "°C"}},
  {"state": "orphan"}
]"#;

const LOGBOOK: &str = r#"[
  {"when": "2024-03-01T00:00:05.123456+00:00", "name": "Kitchen", "state": "on",
   "entity_id": "light.kitchen", "context_id": "01HQ"},
  {"when": "2024-03-01T00:00:01+00:00", "name": "Home Assistant", "message": "started",
   "domain": "homeassistant"},
  {"name": "no time", "entity_id": "sensor.temp1", "state": "unavailable"}
]"#;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn state_listing_summarizes_by_domain() {
    let listing = parse_states(STATES).unwrap();
    assert_eq!(listing.states.len(), 3);

    let summary = listing.summary();
    let domains: Vec<(&str, usize)> = summary
        .iter()
        .map(|d| (d.domain.as_str(), d.entity_count))
        .collect();
    assert_eq!(domains, vec![("light", 2), ("sensor", 1)]);

    let light_bytes: usize = listing
        .states
        .iter()
        .filter(|s| s.domain == "light")
        .map(|s| serde_json::to_vec(&s.payload).unwrap().len())
        .sum();
    assert_eq!(summary[0].payload_bytes, light_bytes);
}

#[test]
fn state_selection_by_domain_and_case_insensitive_substring() {
    let listing = parse_states(STATES).unwrap();

    let lights: BTreeSet<String> = ["light".to_string()].into();
    let selected = listing.select(Some(&lights), Some("HALL"));
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].entity_id, "light.Hall");

    assert_eq!(listing.select(None, Some("  ")).len(), 3);
    assert_eq!(listing.select(Some(&BTreeSet::new()), None).len(), 0);

    let all = listing.select(None, None);
    let total: usize = listing.summary().iter().map(|d| d.payload_bytes).sum();
    assert_eq!(hearth_remote::StateListing::total_bytes(&all), total);
}

#[test]
fn logbook_fixture_decodes() {
    let entries = parse_logbook(LOGBOOK).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0].when_instant(),
        Some(at("2024-03-01T00:00:05.123456+00:00"))
    );
    assert_eq!(entries[1].domain.as_deref(), Some("homeassistant"));
    assert!(entries[1].entity_id.is_none());
    assert!(entries[2].when_instant().is_none());
}

#[test]
fn unbounded_window_defaults_to_lookback() {
    let now = at("2024-03-02T00:00:00+00:00");
    let (start, end) =
        resolve_remote_window(&TimeWindow::unbounded(), now, Duration::hours(24)).unwrap();
    assert_eq!(end, now);
    assert_eq!(start, at("2024-03-01T00:00:00+00:00"));

    let only_end = TimeWindow {
        start: None,
        end: Some(at("2024-03-01T12:00:00+00:00")),
    };
    let (start, _) = resolve_remote_window(&only_end, now, Duration::hours(24)).unwrap();
    assert_eq!(start, at("2024-02-29T12:00:00+00:00"));
}

#[test]
fn lookback_past_calendar_range_is_invalid_range() {
    let now = at("2024-03-02T00:00:00+00:00");
    let huge = Duration::hours(i64::from(u32::MAX));
    assert!(matches!(
        resolve_remote_window(&TimeWindow::unbounded(), now, huge),
        Err(InspectError::InvalidRange { .. })
    ));
}

#[test]
fn reversed_remote_window_is_invalid_range() {
    let window = TimeWindow::between(at("2024-03-02T00:00:00+00:00"), at("2024-03-01T00:00:00+00:00"));
    assert!(matches!(
        resolve_remote_window(&window, Utc::now(), Duration::hours(24)),
        Err(InspectError::InvalidRange { .. })
    ));
}

#[test]
fn logbook_url_carries_window_and_entity() {
    let mut config = hearth_core::config::RemoteConfig::default();
    config.base_url = Some("http://ha.local:8123/".to_string());
    config.token = Some("secret".to_string());
    let client = RemoteClient::from_config(&config).unwrap();
    let tz = FixedOffset::east_opt(9 * 3600).unwrap();

    let url = client
        .logbook_url(
            at("2024-03-01T00:00:00+00:00"),
            at("2024-03-01T06:00:00+00:00"),
            tz,
            Some("light.kitchen"),
        )
        .unwrap();
    assert_eq!(url.path(), "/api/logbook/2024-03-01T09:00:00+09:00");
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(
        query,
        vec![
            ("end_time".to_string(), "2024-03-01T15:00:00+09:00".to_string()),
            ("entity".to_string(), "light.kitchen".to_string()),
        ]
    );

    let url = client
        .logbook_url(at("2024-03-01T00:00:00+00:00"), at("2024-03-01T06:00:00+00:00"), tz, None)
        .unwrap();
    assert!(!url.query_pairs().any(|(k, _)| k == "entity"));
}

#[test]
fn client_requires_base_url_and_token() {
    let mut config = hearth_core::config::RemoteConfig::default();
    assert!(matches!(
        RemoteClient::from_config(&config),
        Err(InspectError::Config(_))
    ));
    config.base_url = Some("http://ha.local:8123".to_string());
    assert!(matches!(
        RemoteClient::from_config(&config),
        Err(InspectError::Config(_))
    ));
    config.token = Some("t".to_string());
    config.base_url = Some("not a url".to_string());
    assert!(matches!(
        RemoteClient::from_config(&config),
        Err(InspectError::Config(_))
    ));
}
