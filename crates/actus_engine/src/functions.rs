//! Shared payoff/state-transition building blocks.

use actus_core::attributes::ContractAttributes;
use actus_core::state::ContractState;
use actus_core::types::time::ActusDateTime;

/// Year fraction between two dates under the contract's day count context.
pub(crate) fn yf(attrs: &ContractAttributes, from: ActusDateTime, to: ActusDateTime) -> f64 {
    attrs.day_count().year_fraction(from, to)
}

/// Interest accrued over `[state.status_date, to]` on the given base.
pub(crate) fn accrual(
    attrs: &ContractAttributes,
    state: &ContractState,
    to: ActusDateTime,
    base: f64,
) -> f64 {
    yf(attrs, state.status_date, to) * state.nominal_rate * base
}

/// The accrual base of an amortizing contract: the interest calculation base
/// when fixed, the current notional otherwise.
pub(crate) fn interest_base(state: &ContractState) -> f64 {
    if state.interest_calc_base != 0.0 {
        state.interest_calc_base
    } else {
        state.notional
    }
}

/// Advances the state to `to`, accruing interest on the notional.
pub(crate) fn accrue_on_notional(
    attrs: &ContractAttributes,
    state: &ContractState,
    to: ActusDateTime,
) -> ContractState {
    ContractState {
        status_date: to,
        accrued_interest: state.accrued_interest + accrual(attrs, state, to, state.notional),
        ..*state
    }
}

/// Advances the state to `to`, accruing interest on the interest calculation
/// base.
pub(crate) fn accrue_on_base(
    attrs: &ContractAttributes,
    state: &ContractState,
    to: ActusDateTime,
) -> ContractState {
    ContractState {
        status_date: to,
        accrued_interest: state.accrued_interest + accrual(attrs, state, to, interest_base(state)),
        ..*state
    }
}

/// Applies the contract's life floor and cap to a candidate reset rate.
pub(crate) fn clamp_rate(attrs: &ContractAttributes, rate: f64) -> f64 {
    let mut rate = rate;
    if let Some(floor) = attrs.rate_reset_floor {
        rate = rate.max(floor);
    }
    if let Some(cap) = attrs.rate_reset_cap {
        rate = rate.min(cap);
    }
    rate
}

/// The level annuity payment amortizing `notional + accrued` at `rate` over
/// the periods ending at `redemption_dates`.
///
/// Implements `A = (n + a) / sum_i prod_{j<=i} (1 + Y_j * r)^-1`, the ACTUS
/// annuity formula. Near-zero rates degrade to straight-line division.
pub(crate) fn annuity_payment(
    attrs: &ContractAttributes,
    start: ActusDateTime,
    redemption_dates: &[ActusDateTime],
    notional: f64,
    accrued: f64,
    rate: f64,
) -> f64 {
    if redemption_dates.is_empty() {
        return 0.0;
    }
    if rate.abs() < 1e-10 {
        return (notional + accrued) / redemption_dates.len() as f64;
    }
    let mut product = 1.0;
    let mut denominator = 0.0;
    let mut previous = start;
    for &date in redemption_dates {
        product *= 1.0 + yf(attrs, previous, date) * rate;
        denominator += 1.0 / product;
        previous = date;
    }
    (notional + accrued) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::types::enums::{ContractRole, ContractType, DayCountConvention};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn attrs() -> ContractAttributes {
        let mut a = ContractAttributes::new(
            "T-1",
            ContractType::Pam,
            ContractRole::Rpa,
            d(2024, 1, 1),
            "USD",
        );
        a.day_count_convention = Some(DayCountConvention::ThirtyE360);
        a
    }

    #[test]
    fn test_accrue_on_notional() {
        let a = attrs();
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        let next = accrue_on_notional(&a, &state, d(2024, 7, 15));
        assert_relative_eq!(next.accrued_interest, 2_500.0, epsilon = 1e-9);
        assert_eq!(next.status_date, d(2024, 7, 15));
        // Original untouched, notional carried.
        assert_eq!(state.accrued_interest, 0.0);
        assert_eq!(next.notional, 100_000.0);
    }

    #[test]
    fn test_accrue_on_base_prefers_ipcb() {
        let a = attrs();
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 50_000.0;
        state.interest_calc_base = 100_000.0;
        state.nominal_rate = 0.10;
        let next = accrue_on_base(&a, &state, d(2024, 4, 15));
        // Quarter on the base, not the notional.
        assert_relative_eq!(next.accrued_interest, 2_500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clamp_rate() {
        let mut a = attrs();
        a.rate_reset_floor = Some(0.01);
        a.rate_reset_cap = Some(0.06);
        assert_eq!(clamp_rate(&a, 0.005), 0.01);
        assert_eq!(clamp_rate(&a, 0.04), 0.04);
        assert_eq!(clamp_rate(&a, 0.09), 0.06);
    }

    #[test]
    fn test_annuity_zero_rate_is_straight_line() {
        let a = attrs();
        let dates: Vec<ActusDateTime> = (1..=4).map(|k| d(2024, 1 + 3 * k as u32, 15)).collect();
        let payment = annuity_payment(&a, d(2024, 1, 15), &dates, 100_000.0, 0.0, 0.0);
        assert_relative_eq!(payment, 25_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_annuity_twelve_months() {
        let a = attrs();
        let dates: Vec<ActusDateTime> =
            (1..=12).map(|k| d(2024, 1, 15).add_months(k)).collect();
        let payment = annuity_payment(&a, d(2024, 1, 15), &dates, 100_000.0, 0.0, 0.05);
        // Standard 12-month annuity at 5%: about 8,560 per month.
        assert!(payment > 8_500.0 && payment < 8_620.0, "payment = {}", payment);
        // Total repaid exceeds the notional by roughly the interest.
        assert!(payment * 12.0 > 100_000.0);
    }

    #[test]
    fn test_annuity_empty_schedule() {
        let a = attrs();
        assert_eq!(annuity_payment(&a, d(2024, 1, 15), &[], 1.0, 0.0, 0.05), 0.0);
    }
}
