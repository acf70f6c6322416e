//! Day count conventions and year fractions.
//!
//! `year_fraction` covers the conventions that need nothing beyond the two
//! dates. [`DayCount`] carries the extra context some conventions require:
//! the maturity date for 30E/360 ISDA and a holiday calendar for B/252.
//!
//! # Examples
//!
//! ```
//! use actus_core::time::day_count::year_fraction;
//! use actus_core::types::enums::DayCountConvention;
//! use actus_core::types::time::ActusDateTime;
//!
//! let start = ActusDateTime::from_ymd(2024, 1, 15).unwrap();
//! let end = ActusDateTime::from_ymd(2024, 7, 15).unwrap();
//!
//! let yf = year_fraction(start, end, DayCountConvention::Actual360);
//! assert!((yf - 182.0 / 360.0).abs() < 1e-12);
//! ```

use chrono::NaiveDate;

use crate::types::enums::{Calendar, DayCountConvention};
use crate::types::time::{days_in_month, ActusDateTime};

/// Day count context: convention plus the auxiliary inputs some conventions
/// need.
#[derive(Debug, Clone, Copy)]
pub struct DayCount {
    /// The convention to apply.
    pub convention: DayCountConvention,
    /// Maturity date, used by 30E/360 ISDA's end-of-February rule.
    pub maturity: Option<ActusDateTime>,
    /// Calendar for the B/252 business-day count.
    pub calendar: Calendar,
}

impl DayCount {
    /// Creates a context with no maturity and the no-holiday calendar.
    pub fn new(convention: DayCountConvention) -> Self {
        DayCount {
            convention,
            maturity: None,
            calendar: Calendar::NoCalendar,
        }
    }

    /// Year fraction from `start` to `end`.
    ///
    /// Zero when `start == end`; negative when `end` precedes `start` (the
    /// sign indicates direction, callers pass ordered dates).
    pub fn year_fraction(&self, start: ActusDateTime, end: ActusDateTime) -> f64 {
        match self.convention {
            DayCountConvention::ActualActual => actual_actual(start, end),
            DayCountConvention::Actual360 => start.days_between(end) as f64 / 360.0,
            DayCountConvention::Actual365 => start.days_between(end) as f64 / 365.0,
            DayCountConvention::ThirtyE360 => thirty_e_360(start, end) / 360.0,
            DayCountConvention::ThirtyE360Isda => {
                thirty_e_360_isda(start, end, self.maturity) / 360.0
            }
            DayCountConvention::Thirty360Us => thirty_360_us(start, end) / 360.0,
            DayCountConvention::Business252 => {
                let cal = self.calendar.resolve();
                if start <= end {
                    cal.business_days_between(start, end) as f64 / 252.0
                } else {
                    -(cal.business_days_between(end, start) as f64) / 252.0
                }
            }
        }
    }
}

/// Year fraction using only the two dates.
///
/// For 30E/360 ISDA this treats `end` as distinct from maturity, and B/252
/// counts over the no-holiday calendar; use [`DayCount`] when those inputs
/// matter.
pub fn year_fraction(start: ActusDateTime, end: ActusDateTime, convention: DayCountConvention) -> f64 {
    DayCount::new(convention).year_fraction(start, end)
}

/// Actual/actual ISDA: day fractions summed per calendar year crossed.
fn actual_actual(start: ActusDateTime, end: ActusDateTime) -> f64 {
    if start == end {
        return 0.0;
    }
    if start > end {
        return -actual_actual(end, start);
    }

    let mut total = 0.0;
    let mut current = start;
    while current.year() < end.year() {
        // Days from `current` to Jan 1 of the following year.
        let next_jan = ActusDateTime::from_ymd(current.year() + 1, 1, 1)
            .unwrap_or(current);
        let days = current.days_between(next_jan);
        total += days as f64 / days_in_year(current.year());
        current = next_jan;
    }
    total += current.days_between(end) as f64 / days_in_year(end.year());
    total
}

fn days_in_year(year: i32) -> f64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    }
}

/// 30E/360: both d1 and d2 capped at 30.
fn thirty_e_360(start: ActusDateTime, end: ActusDateTime) -> f64 {
    let d1 = start.day().min(30);
    let d2 = end.day().min(30);
    day_count_30_360(start, end, d1, d2)
}

/// 30E/360 ISDA: additionally treats the last day of February as day 30,
/// except when `end` is the maturity date.
fn thirty_e_360_isda(start: ActusDateTime, end: ActusDateTime, maturity: Option<ActusDateTime>) -> f64 {
    let is_eofeb = |dt: ActusDateTime| dt.month() == 2 && dt.day() == days_in_month(dt.year(), 2);
    let d1 = if is_eofeb(start) || start.day() == 31 {
        30
    } else {
        start.day()
    };
    let end_is_maturity = maturity.map(|md| md == end).unwrap_or(false);
    let d2 = if (is_eofeb(end) && !end_is_maturity) || end.day() == 31 {
        30
    } else {
        end.day()
    };
    day_count_30_360(start, end, d1, d2)
}

/// 30/360 US bond basis: d1=31 becomes 30; d2=31 becomes 30 only if d1 >= 30.
fn thirty_360_us(start: ActusDateTime, end: ActusDateTime) -> f64 {
    let d1 = if start.day() == 31 { 30 } else { start.day() };
    let d2 = if end.day() == 31 && d1 >= 30 { 30 } else { end.day() };
    day_count_30_360(start, end, d1, d2)
}

fn day_count_30_360(start: ActusDateTime, end: ActusDateTime, d1: u32, d2: u32) -> f64 {
    (360 * (end.year() - start.year())
        + 30 * (end.month() as i32 - start.month() as i32)
        + (d2 as i32 - d1 as i32)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_actual_360() {
        // 2024-01-15 .. 2024-07-15 is 182 days.
        let yf = year_fraction(d(2024, 1, 15), d(2024, 7, 15), DayCountConvention::Actual360);
        assert_relative_eq!(yf, 182.0 / 360.0, epsilon = 1e-12);
    }

    #[test]
    fn test_actual_365() {
        let yf = year_fraction(d(2024, 1, 15), d(2024, 7, 15), DayCountConvention::Actual365);
        assert_relative_eq!(yf, 182.0 / 365.0, epsilon = 1e-12);
    }

    #[test]
    fn test_actual_actual_within_year() {
        // Whole leap year: exactly 1.0.
        let yf = year_fraction(d(2024, 1, 1), d(2025, 1, 1), DayCountConvention::ActualActual);
        assert_relative_eq!(yf, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_actual_actual_across_years() {
        // 2023-07-01 .. 2024-07-01: 184 days in 2023, 182 days in 2024.
        let yf = year_fraction(d(2023, 7, 1), d(2024, 7, 1), DayCountConvention::ActualActual);
        assert_relative_eq!(yf, 184.0 / 365.0 + 182.0 / 366.0, epsilon = 1e-12);
    }

    #[test]
    fn test_thirty_e_360() {
        // Both 31sts capped at 30: 2 months exactly.
        let yf = year_fraction(d(2024, 1, 31), d(2024, 3, 31), DayCountConvention::ThirtyE360);
        assert_relative_eq!(yf, 60.0 / 360.0, epsilon = 1e-12);
        // Half year on 15ths.
        let yf = year_fraction(d(2024, 1, 15), d(2024, 7, 15), DayCountConvention::ThirtyE360);
        assert_relative_eq!(yf, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_thirty_360_us_asymmetric_31() {
        // d1=30, d2=31 with d1 >= 30: d2 capped.
        let yf = year_fraction(d(2024, 1, 30), d(2024, 3, 31), DayCountConvention::Thirty360Us);
        assert_relative_eq!(yf, 60.0 / 360.0, epsilon = 1e-12);
        // d1=15, d2=31: d2 NOT capped.
        let yf = year_fraction(d(2024, 1, 15), d(2024, 3, 31), DayCountConvention::Thirty360Us);
        assert_relative_eq!(yf, 76.0 / 360.0, epsilon = 1e-12);
    }

    #[test]
    fn test_thirty_e_360_isda_end_of_feb() {
        let dc = DayCount {
            convention: DayCountConvention::ThirtyE360Isda,
            maturity: Some(d(2025, 2, 28)),
            calendar: Calendar::NoCalendar,
        };
        // End of February treated as day 30 when not maturity.
        let yf = dc.year_fraction(d(2024, 1, 30), d(2024, 2, 29));
        assert_relative_eq!(yf, 30.0 / 360.0, epsilon = 1e-12);
        // At maturity the actual day number stays.
        let yf = dc.year_fraction(d(2025, 1, 30), d(2025, 2, 28));
        assert_relative_eq!(yf, 28.0 / 360.0, epsilon = 1e-12);
    }

    #[test]
    fn test_business_252() {
        let dc = DayCount {
            convention: DayCountConvention::Business252,
            maturity: None,
            calendar: Calendar::MondayToFriday,
        };
        // 2024-01-08 (Mon) .. 2024-01-15 (Mon): 5 business days.
        assert_relative_eq!(
            dc.year_fraction(d(2024, 1, 8), d(2024, 1, 15)),
            5.0 / 252.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_same_date_is_zero() {
        for convention in [
            DayCountConvention::ActualActual,
            DayCountConvention::Actual360,
            DayCountConvention::Actual365,
            DayCountConvention::ThirtyE360,
            DayCountConvention::Thirty360Us,
            DayCountConvention::Business252,
        ] {
            assert_eq!(year_fraction(d(2024, 6, 15), d(2024, 6, 15), convention), 0.0);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn date_strategy() -> impl Strategy<Value = ActusDateTime> {
            (2000i32..2100, 1u32..13, 1u32..29).prop_map(|(y, m, d)| {
                ActusDateTime::from_ymd(y, m, d).unwrap()
            })
        }

        proptest! {
            #[test]
            fn year_fraction_non_negative(a in date_strategy(), b in date_strategy()) {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                for convention in [
                    DayCountConvention::ActualActual,
                    DayCountConvention::Actual360,
                    DayCountConvention::Actual365,
                    DayCountConvention::ThirtyE360,
                ] {
                    prop_assert!(year_fraction(start, end, convention) >= 0.0);
                }
            }

            #[test]
            fn actual_conventions_are_additive(
                a in date_strategy(),
                b in date_strategy(),
                c in date_strategy(),
            ) {
                let mut dates = [a, b, c];
                dates.sort();
                let [d1, d2, d3] = dates;
                for convention in [DayCountConvention::Actual360, DayCountConvention::Actual365] {
                    let lhs = year_fraction(d1, d3, convention);
                    let rhs = year_fraction(d1, d2, convention) + year_fraction(d2, d3, convention);
                    prop_assert!((lhs - rhs).abs() < 1e-12);
                }
            }

            #[test]
            fn actual_actual_close_to_actual_365(a in date_strategy(), b in date_strategy()) {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                let aa = year_fraction(start, end, DayCountConvention::ActualActual);
                let a365 = year_fraction(start, end, DayCountConvention::Actual365);
                // A/A and A/365 differ by at most a day per year crossed.
                let years = (start.days_between(end) as f64 / 365.0).ceil() + 1.0;
                prop_assert!((aa - a365).abs() <= years / 365.0 + 1e-9);
            }
        }
    }
}
