//! Temporal kernel: calendars, day counts and business-day adjustment.

pub mod business_day;
pub mod calendar;
pub mod day_count;

pub use business_day::{adjust, adjust_event, AdjustedDate};
pub use calendar::{HolidayCalendar, NoHolidays, WeekendsOnly};
pub use day_count::year_fraction;
