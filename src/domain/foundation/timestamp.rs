//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Adds whole calendar months, keeping the time of day.
    ///
    /// The day of month is preserved when the target month has it. Otherwise
    /// it is clamped to the last day of the target month, so Jan 31 + 1 month
    /// is Feb 28 (Feb 29 in leap years) and Mar 31 + 1 month is Apr 30.
    pub fn add_months(&self, months: u32) -> Result<Self, ValidationError> {
        self.0
            .checked_add_months(Months::new(months))
            .map(Self)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "months",
                    format!("adding {} months overflows the calendar", months),
                )
            })
    }

    /// Whole days from `other` until this timestamp, zero if already passed.
    pub fn days_until(&self, other: &Timestamp) -> u32 {
        let days = self.0.signed_duration_since(other.0).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use proptest::prelude::*;

    fn at(rfc3339: &str) -> Timestamp {
        Timestamp::from_datetime(
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn add_months_keeps_day_of_month_when_it_exists() {
        let start = at("2026-01-15T10:30:00Z");
        let end = start.add_months(1).unwrap();
        assert_eq!(end, at("2026-02-15T10:30:00Z"));
    }

    #[test]
    fn jan_31_plus_one_month_clamps_to_feb_28() {
        let end = at("2026-01-31T09:00:00Z").add_months(1).unwrap();
        assert_eq!(end, at("2026-02-28T09:00:00Z"));
    }

    #[test]
    fn jan_31_plus_one_month_in_leap_year_is_feb_29() {
        let end = at("2028-01-31T09:00:00Z").add_months(1).unwrap();
        assert_eq!(end, at("2028-02-29T09:00:00Z"));
    }

    #[test]
    fn mar_31_plus_one_month_is_apr_30() {
        let end = at("2026-03-31T00:00:00Z").add_months(1).unwrap();
        assert_eq!(end, at("2026-04-30T00:00:00Z"));
    }

    #[test]
    fn clamping_does_not_accumulate_across_a_multi_month_span() {
        // Computed from the start date, not chained month by month.
        let end = at("2026-01-31T00:00:00Z").add_months(3).unwrap();
        assert_eq!(end, at("2026-04-30T00:00:00Z"));
        let end = at("2026-01-31T00:00:00Z").add_months(2).unwrap();
        assert_eq!(end, at("2026-03-31T00:00:00Z"));
    }

    #[test]
    fn twelve_months_crosses_year_boundary() {
        let end = at("2026-11-30T23:59:59Z").add_months(12).unwrap();
        assert_eq!(end, at("2027-11-30T23:59:59Z"));
    }

    #[test]
    fn days_until_is_zero_for_past_timestamps() {
        let earlier = at("2026-01-01T00:00:00Z");
        let later = at("2026-01-11T00:00:00Z");
        assert_eq!(later.days_until(&earlier), 10);
        assert_eq!(earlier.days_until(&later), 0);
    }

    #[test]
    fn ordering_follows_time() {
        let a = at("2026-05-01T00:00:00Z");
        let b = at("2026-05-01T00:00:01Z");
        assert!(b.is_after(&a));
        assert!(!a.is_after(&b));
        assert!(a < b);
    }

    proptest! {
        #[test]
        fn add_months_lands_in_expected_month_and_never_overshoots(
            year in 2000i32..2100,
            month in 1u32..=12,
            day in 1u32..=31,
            months in 1u32..=36,
        ) {
            let Some(date) = chrono::NaiveDate::from_ymd_opt(year, month, day) else {
                return Ok(());
            };
            let start = Timestamp::from_datetime(date.and_hms_opt(12, 0, 0).unwrap().and_utc());
            let end = start.add_months(months).unwrap();

            let total = (year * 12 + month as i32 - 1) + months as i32;
            prop_assert_eq!(end.as_datetime().year(), total.div_euclid(12));
            prop_assert_eq!(end.as_datetime().month() as i32, total.rem_euclid(12) + 1);
            prop_assert!(end.as_datetime().day() <= day);
            prop_assert_eq!(end.as_datetime().hour(), 12);
            prop_assert!(end.is_after(&start));
        }
    }
}
