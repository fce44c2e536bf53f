//! Business-day ranges.
//!
//! The business runs on a fixed UTC-5 offset with no daylight saving. A
//! business day maps to a half-open UTC range `[gte, lt)`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Offset of the business timezone from UTC, in seconds.
pub const BUSINESS_UTC_OFFSET_SECS: i32 = -5 * 3600;

/// Half-open UTC instant range covering one business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    /// First instant of the day (inclusive).
    pub gte: DateTime<Utc>,
    /// First instant of the next day (exclusive).
    pub lt: DateTime<Utc>,
}

impl DayRange {
    /// Returns true if the instant falls inside the range.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.gte && instant < self.lt
    }
}

/// Error returned when a `yyyy-mm-dd` string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Invalid business date '{0}', expected yyyy-mm-dd")]
pub struct InvalidBusinessDate(pub String);

const BUSINESS_OFFSET: FixedOffset = match FixedOffset::east_opt(BUSINESS_UTC_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("business offset out of range"),
};

/// Calendar date of an instant in the business timezone.
#[must_use]
pub fn business_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&BUSINESS_OFFSET).date_naive()
}

/// Range of the business day containing `instant`.
#[must_use]
pub fn day_range_utc_from_date(instant: DateTime<Utc>) -> DayRange {
    day_range_for(business_date(instant))
}

/// Range of the business day named by a `yyyy-mm-dd` string.
///
/// # Errors
///
/// Returns [`InvalidBusinessDate`] if the string is not a valid date.
pub fn day_range_utc_from_date_only(date: &str) -> Result<DayRange, InvalidBusinessDate> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| InvalidBusinessDate(date.to_string()))?;
    Ok(day_range_for(day))
}

/// Range of a business calendar day.
#[must_use]
pub fn day_range_for(day: NaiveDate) -> DayRange {
    let local_midnight = day.and_time(chrono::NaiveTime::MIN);
    // Midnight at UTC-5 is 05:00 UTC on the same calendar date.
    let gte = Utc.from_utc_datetime(&local_midnight) - Duration::seconds(i64::from(BUSINESS_UTC_OFFSET_SECS));
    DayRange {
        gte,
        lt: gte + Duration::days(1),
    }
}
