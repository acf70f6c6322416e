//! Civil date-time for ACTUS contracts.
//!
//! This module provides:
//! - `ActusDateTime`: type-safe date-time wrapper around `chrono::NaiveDateTime`
//! - ISO 8601 parsing with the ACTUS extension `24:00:00` (end of day)
//! - Day and month arithmetic with end-of-month clamping
//!
//! # Examples
//!
//! ```
//! use actus_core::types::time::ActusDateTime;
//!
//! let dt = ActusDateTime::parse("2024-01-31").unwrap();
//! // Month arithmetic clamps to the end of the target month.
//! assert_eq!(dt.add_months(1), ActusDateTime::from_ymd(2024, 2, 29).unwrap());
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Immutable civil date-time at second resolution.
///
/// ACTUS uses ISO 8601 date-time strings with one extension: `24:00:00`
/// denotes the end of a day and is normalised to midnight of the following
/// day on construction. Values are hashable and totally ordered, and the
/// year/month/day always form a valid Gregorian date.
///
/// # Examples
///
/// ```
/// use actus_core::types::time::ActusDateTime;
///
/// let date = ActusDateTime::from_ymd(2024, 6, 15).unwrap();
/// assert_eq!(date.year(), 2024);
///
/// // Parse from ISO 8601
/// let parsed: ActusDateTime = "2024-06-15T00:00:00".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// // Whole days between dates
/// let later = ActusDateTime::from_ymd(2024, 6, 25).unwrap();
/// assert_eq!(later - date, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActusDateTime(NaiveDateTime);

impl ActusDateTime {
    /// Creates a date at midnight from year, month and day components.
    ///
    /// # Errors
    ///
    /// Returns `DateError::InvalidDate` for impossible calendar dates.
    ///
    /// # Examples
    ///
    /// ```
    /// use actus_core::types::time::ActusDateTime;
    ///
    /// assert!(ActusDateTime::from_ymd(2024, 2, 29).is_ok()); // leap year
    /// assert!(ActusDateTime::from_ymd(2023, 2, 29).is_err());
    /// ```
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(|d| ActusDateTime(d.and_time(NaiveTime::MIN)))
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Creates a date-time from full components.
    ///
    /// `hour == 24` with zero minutes and seconds is accepted and normalised
    /// to midnight of the following day.
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self, DateError> {
        if hour == 24 {
            if minute != 0 || second != 0 {
                return Err(DateError::InvalidTime {
                    hour,
                    minute,
                    second,
                });
            }
            return Ok(Self::from_ymd(year, month, day)?.add_days(1));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(DateError::InvalidDate { year, month, day })?;
        let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or(DateError::InvalidTime {
            hour,
            minute,
            second,
        })?;
        Ok(ActusDateTime(date.and_time(time)))
    }

    /// Parses an ISO 8601 string.
    ///
    /// Supported forms: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` and the
    /// space-separated variant. The ACTUS end-of-day marker `24:00:00` is
    /// normalised to the next midnight.
    pub fn parse(s: &str) -> Result<Self, DateError> {
        let (date_part, time_part) = match s.split_once(['T', ' ']) {
            Some((d, t)) => (d, Some(t)),
            None => (s, None),
        };

        let mut date_fields = date_part.split('-');
        let year = parse_field(date_fields.next(), s)?;
        let month = parse_field(date_fields.next(), s)? as u32;
        let day = parse_field(date_fields.next(), s)? as u32;
        if date_fields.next().is_some() {
            return Err(DateError::Parse(s.to_string()));
        }

        match time_part {
            None => Self::from_ymd(year, month, day),
            Some(t) => {
                let mut time_fields = t.split(':');
                let hour = parse_field(time_fields.next(), s)? as u32;
                let minute = parse_field(time_fields.next(), s)? as u32;
                let second = parse_field(time_fields.next(), s)? as u32;
                if time_fields.next().is_some() {
                    return Err(DateError::Parse(s.to_string()));
                }
                Self::from_ymd_hms(year, month, day, hour, minute, second)
            }
        }
    }

    /// Returns the underlying `NaiveDateTime`.
    pub fn into_inner(self) -> NaiveDateTime {
        self.0
    }

    /// Returns the calendar date component.
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the hour component (0-23).
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Returns the number of whole days from `self` to `other`.
    ///
    /// Positive when `other` is later. Time-of-day components are ignored;
    /// the count is a calendar-date difference.
    pub fn days_between(&self, other: ActusDateTime) -> i64 {
        (other.0.date() - self.0.date()).num_days()
    }

    /// Returns a new date-time shifted by `days` whole days.
    pub fn add_days(self, days: i64) -> Self {
        ActusDateTime(self.0 + chrono::Duration::days(days))
    }

    /// Returns a new date-time shifted by `months` calendar months.
    ///
    /// The day of month is clamped to the length of the target month
    /// (Jan 31 + 1M = Feb 29 in a leap year). The time of day is preserved.
    pub fn add_months(self, months: i32) -> Self {
        let total = self.0.year() * 12 + self.0.month() as i32 - 1 + months;
        let year = total.div_euclid(12);
        let month = (total.rem_euclid(12) + 1) as u32;
        let day = self.0.day().min(days_in_month(year, month));
        // The clamped day always exists in the target month.
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| self.0.date());
        ActusDateTime(date.and_time(self.0.time()))
    }

    /// Returns true when this date is the last day of its month.
    pub fn is_end_of_month(&self) -> bool {
        self.0.day() == days_in_month(self.0.year(), self.0.month())
    }

    /// Returns this date moved to the last day of its month.
    pub fn end_of_month(self) -> Self {
        let day = days_in_month(self.0.year(), self.0.month());
        let date =
            NaiveDate::from_ymd_opt(self.0.year(), self.0.month(), day).unwrap_or(self.0.date());
        ActusDateTime(date.and_time(self.0.time()))
    }
}

/// Returns the number of days in the given month.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

fn parse_field(field: Option<&str>, original: &str) -> Result<i32, DateError> {
    field
        .and_then(|f| f.parse::<i32>().ok())
        .ok_or_else(|| DateError::Parse(original.to_string()))
}

impl Sub for ActusDateTime {
    type Output = i64;

    /// Returns the number of whole days between two date-times.
    fn sub(self, other: Self) -> i64 {
        other.days_between(self)
    }
}

impl FromStr for ActusDateTime {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        ActusDateTime::parse(s)
    }
}

impl fmt::Display for ActusDateTime {
    /// Formats as ISO 8601 (`YYYY-MM-DDTHH:MM:SS`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::ActusDateTime;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for ActusDateTime {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for ActusDateTime {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            ActusDateTime::parse(&s).map_err(de::Error::custom)
        }
    }
}
