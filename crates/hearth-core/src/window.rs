//! Time window resolution: symbolic range selection → concrete bounds.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{InspectError, InspectResult};

/// Range choices offered to an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelector {
    Unbounded,
    LastHour,
    Last3Hours,
    Last6Hours,
    Last12Hours,
    Last24Hours,
    Last3Days,
    Last7Days,
    /// Local date-times in the reference timezone, taken literally.
    Custom {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl RangeSelector {
    /// Lookback for relative selectors; `None` for unbounded and custom.
    pub fn lookback(&self) -> Option<Duration> {
        match self {
            Self::LastHour => Some(Duration::hours(1)),
            Self::Last3Hours => Some(Duration::hours(3)),
            Self::Last6Hours => Some(Duration::hours(6)),
            Self::Last12Hours => Some(Duration::hours(12)),
            Self::Last24Hours => Some(Duration::hours(24)),
            Self::Last3Days => Some(Duration::days(3)),
            Self::Last7Days => Some(Duration::days(7)),
            Self::Unbounded | Self::Custom { .. } => None,
        }
    }

    /// Resolve into a window against `now`.
    ///
    /// Custom bounds are converted from `tz` but never reordered or checked;
    /// `start > end` surfaces later as `InvalidRange` when a query is built.
    pub fn resolve(&self, now: DateTime<Utc>, tz: FixedOffset) -> InspectResult<TimeWindow> {
        match self {
            Self::Unbounded => Ok(TimeWindow::unbounded()),
            Self::Custom { start, end } => Ok(TimeWindow {
                start: Some(local_to_utc(start, tz)?),
                end: Some(local_to_utc(end, tz)?),
            }),
            relative => {
                let lookback = relative.lookback().unwrap_or_else(Duration::zero);
                Ok(TimeWindow {
                    start: Some(now - lookback),
                    end: Some(now),
                })
            }
        }
    }
}

impl FromStr for RangeSelector {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "unbounded" => Ok(Self::Unbounded),
            "1h" => Ok(Self::LastHour),
            "3h" => Ok(Self::Last3Hours),
            "6h" => Ok(Self::Last6Hours),
            "12h" => Ok(Self::Last12Hours),
            "24h" | "1d" => Ok(Self::Last24Hours),
            "3d" => Ok(Self::Last3Days),
            "7d" => Ok(Self::Last7Days),
            other => Err(InspectError::InvalidFilter(format!(
                "unknown range selector {other:?}"
            ))),
        }
    }
}

fn local_to_utc(local: &NaiveDateTime, tz: FixedOffset) -> InspectResult<DateTime<Utc>> {
    tz.from_local_datetime(local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| InspectError::InvalidRange {
            start: local.to_string(),
            end: "unrepresentable in reference timezone".to_string(),
        })
}

/// Concrete query bounds. `None` on a side means no bound on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// The entire history.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Both bounds set. Ordering is not checked here.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Reject `start > end` when both are set.
    pub fn validate(&self) -> InspectResult<()> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(InspectError::InvalidRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            }),
            _ => Ok(()),
        }
    }

    /// Bounds usable as a filter: only when both sides are set and ordered.
    pub fn filter_bounds(&self) -> InspectResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        self.validate()?;
        Ok(self.start.zip(self.end))
    }

    /// Inclusive on both ends; an unset side does not constrain.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| s <= t) && self.end.map_or(true, |e| t <= e)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |t: Option<DateTime<Utc>>| t.map_or_else(|| "..".to_string(), |t| t.to_rfc3339());
        write!(f, "[{}, {}]", side(self.start), side(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn seoul() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn relative_selectors_end_at_now() {
        let table = [
            (RangeSelector::LastHour, Duration::hours(1)),
            (RangeSelector::Last3Hours, Duration::hours(3)),
            (RangeSelector::Last6Hours, Duration::hours(6)),
            (RangeSelector::Last12Hours, Duration::hours(12)),
            (RangeSelector::Last24Hours, Duration::hours(24)),
            (RangeSelector::Last3Days, Duration::days(3)),
            (RangeSelector::Last7Days, Duration::days(7)),
        ];
        for (selector, lookback) in table {
            let w = selector.resolve(now(), seoul()).unwrap();
            assert_eq!(w.end, Some(now()));
            assert_eq!(w.start, Some(now() - lookback), "{selector:?}");
        }
    }

    #[test]
    fn unbounded_has_no_sides() {
        let w = RangeSelector::Unbounded.resolve(now(), seoul()).unwrap();
        assert_eq!(w, TimeWindow::unbounded());
        assert_eq!(w.filter_bounds().unwrap(), None);
    }

    #[test]
    fn custom_is_read_in_reference_timezone() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let w = RangeSelector::Custom { start, end }.resolve(now(), seoul()).unwrap();
        assert_eq!(w.start.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(w.end.unwrap().to_rfc3339(), "2024-03-02T00:00:00+00:00");
    }

    #[test]
    fn reversed_custom_resolves_but_fails_validation() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let w = RangeSelector::Custom { start, end }.resolve(now(), seoul()).unwrap();
        assert!(matches!(w.validate(), Err(InspectError::InvalidRange { .. })));
        assert!(w.filter_bounds().is_err());
    }

    #[test]
    fn half_open_window_does_not_filter() {
        let w = TimeWindow { start: Some(now()), end: None };
        assert_eq!(w.filter_bounds().unwrap(), None);
        assert!(w.contains(now() + Duration::days(365)));
    }

    #[test]
    fn contains_is_inclusive() {
        let w = TimeWindow::between(now(), now() + Duration::seconds(10));
        assert!(w.contains(now()));
        assert!(w.contains(now() + Duration::seconds(10)));
        assert!(!w.contains(now() + Duration::seconds(10) + Duration::microseconds(1)));
    }

    #[test]
    fn selector_tokens_parse() {
        assert_eq!("all".parse::<RangeSelector>().unwrap(), RangeSelector::Unbounded);
        assert_eq!("3d".parse::<RangeSelector>().unwrap(), RangeSelector::Last3Days);
        assert!("2w".parse::<RangeSelector>().is_err());
    }
}
