//! Holiday calendars.
//!
//! A calendar decides which days count as business days. The engine ships
//! the two calendars the ACTUS test suite exercises: no holidays at all, and
//! weekends-only. Richer calendars implement [`HolidayCalendar`].

use chrono::Datelike;

use crate::types::enums::Calendar;
use crate::types::time::ActusDateTime;

/// Business-day oracle.
pub trait HolidayCalendar: Send + Sync {
    /// True when `date` is a business day.
    fn is_business_day(&self, date: ActusDateTime) -> bool;

    /// Number of business days in the half-open interval `[start, end)`.
    ///
    /// Returns 0 when `start >= end`.
    fn business_days_between(&self, start: ActusDateTime, end: ActusDateTime) -> i64 {
        if start >= end {
            return 0;
        }
        let mut count = 0;
        let mut current = start;
        while current < end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current.add_days(1);
        }
        count
    }
}

/// Calendar with no holidays: every day is a business day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_business_day(&self, _date: ActusDateTime) -> bool {
        true
    }

    fn business_days_between(&self, start: ActusDateTime, end: ActusDateTime) -> i64 {
        start.days_between(end).max(0)
    }
}

/// Calendar where Saturdays and Sundays are holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendsOnly;

impl HolidayCalendar for WeekendsOnly {
    fn is_business_day(&self, date: ActusDateTime) -> bool {
        // chrono: Monday=0 .. Sunday=6
        date.date().weekday().num_days_from_monday() < 5
    }
}

impl Calendar {
    /// Resolves the calendar code to its implementation.
    pub fn resolve(&self) -> &'static dyn HolidayCalendar {
        static NO_HOLIDAYS: NoHolidays = NoHolidays;
        static WEEKENDS_ONLY: WeekendsOnly = WeekendsOnly;
        match self {
            Calendar::NoCalendar => &NO_HOLIDAYS,
            Calendar::MondayToFriday => &WEEKENDS_ONLY,
        }
    }
}
