//! Record types read from the recorder store, the derived logbook entry and
//! the query result surface.

mod event_record;
mod logbook_entry;
mod query_result;
mod state_record;

pub use event_record::EventRecord;
pub use logbook_entry::{LogbookEntry, UNAVAILABLE_STATE};
pub use query_result::{CellValue, QueryResult, RawValue};
pub use state_record::StateRecord;

/// Domain of an entity id: everything before the first `.`.
///
/// An id without a separator is its own domain. Empty ids have none.
pub fn domain_of(entity_id: &str) -> Option<&str> {
    entity_id.split('.').next().filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::domain_of;

    #[test]
    fn domain_is_prefix_before_first_dot() {
        assert_eq!(domain_of("light.living_room"), Some("light"));
        assert_eq!(domain_of("sensor.temp.inner"), Some("sensor"));
        assert_eq!(domain_of("sun"), Some("sun"));
        assert_eq!(domain_of(""), None);
        assert_eq!(domain_of(".orphan"), None);
    }
}
