//! Business-day adjustment.
//!
//! Shift conventions move a schedule date that lands on a non-business day.
//! The modified conventions must not leave the original month: when the
//! shift crosses a month boundary the search restarts from the *original*
//! date in the opposite direction. Restarting from the already-shifted
//! position can construct a date outside the month.
//!
//! The calculate/shift family picks the same adjusted date but keeps the
//! unshifted date as the calculation time, so year fractions run on the
//! original schedule date.

use crate::types::enums::{BusinessDayConvention, Calendar};
use crate::types::time::ActusDateTime;

/// A schedule date after business-day adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustedDate {
    /// The date the event is reported and settled on.
    pub event_time: ActusDateTime,
    /// The date accruals and year fractions are computed from.
    pub calculation_time: ActusDateTime,
}

/// Adjusts a date to a business day under the given convention.
///
/// The calculate/shift conventions select the same date as their
/// shift/calculate counterparts; the distinction only affects which date is
/// recorded as calculation time (see [`adjust_event`]).
///
/// # Examples
///
/// ```
/// use actus_core::time::business_day::adjust;
/// use actus_core::types::enums::{BusinessDayConvention, Calendar};
/// use actus_core::types::time::ActusDateTime;
///
/// let saturday = ActusDateTime::from_ymd(2024, 1, 13).unwrap();
/// let monday = ActusDateTime::from_ymd(2024, 1, 15).unwrap();
/// assert_eq!(
///     adjust(saturday, BusinessDayConvention::Scf, Calendar::MondayToFriday),
///     monday
/// );
/// ```
pub fn adjust(
    date: ActusDateTime,
    convention: BusinessDayConvention,
    calendar: Calendar,
) -> ActusDateTime {
    if convention == BusinessDayConvention::Null {
        return date;
    }
    let cal = calendar.resolve();
    if cal.is_business_day(date) {
        return date;
    }

    let forward = convention.is_following();
    let shifted = shift(date, forward, calendar);

    if convention.is_modified() && shifted.month() != date.month() {
        // Restart from the original date in the opposite direction.
        return shift(date, !forward, calendar);
    }
    shifted
}

/// Adjusts a date and records the calculation time.
///
/// For shift/calculate conventions both times move; for calculate/shift
/// conventions the calculation time stays on the unshifted date.
pub fn adjust_event(
    date: ActusDateTime,
    convention: BusinessDayConvention,
    calendar: Calendar,
) -> AdjustedDate {
    let shifted = adjust(date, convention, calendar);
    let calculation_time = if convention.keeps_calculation_date() {
        date
    } else {
        shifted
    };
    AdjustedDate {
        event_time: shifted,
        calculation_time,
    }
}

fn shift(date: ActusDateTime, forward: bool, calendar: Calendar) -> ActusDateTime {
    let cal = calendar.resolve();
    let step = if forward { 1 } else { -1 };
    let mut current = date;
    while !cal.is_business_day(current) {
        current = current.add_days(step);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_null_and_business_day_pass_through() {
        let saturday = d(2024, 1, 13);
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Null, Calendar::MondayToFriday),
            saturday
        );
        let monday = d(2024, 1, 15);
        assert_eq!(
            adjust(monday, BusinessDayConvention::Scf, Calendar::MondayToFriday),
            monday
        );
    }

    #[test]
    fn test_following_and_preceding() {
        let saturday = d(2024, 1, 13);
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Scf, Calendar::MondayToFriday),
            d(2024, 1, 15)
        );
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Scp, Calendar::MondayToFriday),
            d(2024, 1, 12)
        );
    }

    #[test]
    fn test_modified_following_stays_in_month() {
        // 2024-03-30 is a Saturday; following would land on April 1st, so
        // modified following must go back to Friday the 29th.
        let date = d(2024, 3, 30);
        assert_eq!(
            adjust(date, BusinessDayConvention::Scf, Calendar::MondayToFriday),
            d(2024, 4, 1)
        );
        assert_eq!(
            adjust(date, BusinessDayConvention::Scmf, Calendar::MondayToFriday),
            d(2024, 3, 29)
        );
    }

    #[test]
    fn test_modified_following_restarts_from_original() {
        // 2024-03-31 is a Sunday. A backward search restarted from the
        // already-shifted April 1st would stop at March 29 only by luck; the
        // rule is to restart from the 31st itself.
        let date = d(2024, 3, 31);
        assert_eq!(
            adjust(date, BusinessDayConvention::Scmf, Calendar::MondayToFriday),
            d(2024, 3, 29)
        );
    }

    #[test]
    fn test_modified_preceding_stays_in_month() {
        // 2024-06-01 is a Saturday; preceding would land in May, so modified
        // preceding moves forward to Monday June 3rd.
        let date = d(2024, 6, 1);
        assert_eq!(
            adjust(date, BusinessDayConvention::Scp, Calendar::MondayToFriday),
            d(2024, 5, 31)
        );
        assert_eq!(
            adjust(date, BusinessDayConvention::Scmp, Calendar::MondayToFriday),
            d(2024, 6, 3)
        );
    }

    #[test]
    fn test_calculate_shift_keeps_calculation_time() {
        let saturday = d(2024, 1, 13);
        let adjusted = adjust_event(saturday, BusinessDayConvention::Csf, Calendar::MondayToFriday);
        assert_eq!(adjusted.event_time, d(2024, 1, 15));
        assert_eq!(adjusted.calculation_time, saturday);

        let adjusted = adjust_event(saturday, BusinessDayConvention::Scf, Calendar::MondayToFriday);
        assert_eq!(adjusted.event_time, d(2024, 1, 15));
        assert_eq!(adjusted.calculation_time, d(2024, 1, 15));
    }

    #[test]
    fn test_no_calendar_never_shifts() {
        let saturday = d(2024, 1, 13);
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Scf, Calendar::NoCalendar),
            saturday
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn modified_following_never_crosses_month(
                year in 2000i32..2100,
                month in 1u32..13,
                day in 1u32..29,
            ) {
                let date = ActusDateTime::from_ymd(year, month, day).unwrap();
                let adjusted = adjust(date, BusinessDayConvention::Scmf, Calendar::MondayToFriday);
                prop_assert_eq!(adjusted.month(), date.month());
                prop_assert_eq!(adjusted.year(), date.year());
            }
        }
    }
}
