//! UTC instants with calendar-aware arithmetic for billing periods.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self < other
    }

    /// Signed: negative when `other` is later.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    pub fn minus_days(&self, days: i64) -> Self {
        self.add_days(-days)
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Self(self.0 + Duration::seconds(secs))
    }

    /// Calendar months; a day past the end of the target month clamps to
    /// its last day (Jan 31 + 1 month = Feb 28 or 29).
    pub fn add_months(&self, months: u32) -> Result<Self, ValidationError> {
        self.0
            .checked_add_months(Months::new(months))
            .map(Self)
            .ok_or_else(|| {
                ValidationError::out_of_range("months", 0, i64::from(u32::MAX), i64::from(months))
            })
    }

    /// Calendar years, so Feb 29 + 1 year = Feb 28.
    pub fn add_years(&self, years: u32) -> Result<Self, ValidationError> {
        years
            .checked_mul(12)
            .ok_or_else(|| {
                ValidationError::out_of_range("years", 0, i64::from(u32::MAX / 12), i64::from(years))
            })
            .and_then(|months| self.add_months(months))
    }

    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn as_unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap())
    }

    fn month_day(ts: Timestamp) -> (u32, u32) {
        (ts.as_datetime().month(), ts.as_datetime().day())
    }

    #[test]
    fn one_month_keeps_day_and_time() {
        let end = at(2024, 3, 15).add_months(1).unwrap();
        assert_eq!(month_day(end), (4, 15));
        assert_eq!(end.as_datetime().hour(), 12);
    }

    #[test]
    fn month_end_clamps() {
        assert_eq!(month_day(at(2023, 1, 31).add_months(1).unwrap()), (2, 28));
        assert_eq!(month_day(at(2024, 1, 31).add_months(1).unwrap()), (2, 29));
        assert_eq!(month_day(at(2024, 3, 31).add_months(1).unwrap()), (4, 30));
    }

    #[test]
    fn a_year_across_a_leap_day_is_366_days() {
        let start = at(2024, 1, 10);
        let end = start.add_years(1).unwrap();
        assert_eq!(end.as_datetime().year(), 2025);
        assert_eq!(end.duration_since(&start).num_days(), 366);
    }

    #[test]
    fn leap_day_plus_a_year() {
        assert_eq!(month_day(at(2024, 2, 29).add_years(1).unwrap()), (2, 28));
    }

    #[test]
    fn day_arithmetic_is_symmetric() {
        let start = at(2024, 5, 10);
        assert!(start.minus_days(90).is_before(&start));
        assert_eq!(start.minus_days(90).add_days(90), start);
        assert_eq!(start.duration_since(&start.add_days(1)).num_days(), -1);
    }

    #[test]
    fn plus_secs_moves_forward() {
        let start = at(2024, 5, 10);
        assert_eq!(start.plus_secs(90).as_unix_secs(), start.as_unix_secs() + 90);
    }
}
