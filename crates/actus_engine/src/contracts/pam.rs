//! Principal-at-maturity (PAM) contracts.
//!
//! PAM is the foundational loan: interest paid on a cycle, the full
//! principal returned at maturity. Its payoff and transition helpers are
//! shared by the amortizing variants (LAM, NAM, ANN, LAX) and the deposit
//! variants (CLM, UMP).

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::{ContractPerformance, EventType, FeeBasis, PenaltyType};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::{apply_window, merge_callouts, SimContext, VariantLogic};
use crate::functions::{accrual, accrue_on_notional, clamp_rate, yf};
use crate::schedule::{expand_cycle, EventBuilder};

/// Principal-at-maturity variant record.
pub(crate) struct Pam;

impl VariantLogic for Pam {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        require_funding_terms(attrs)?;
        if attrs.maturity_date.is_none() {
            return Err(attrs.invalid("maturity_date is required"));
        }
        Ok(())
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let ied = initial_exchange(attrs)?;
        let md = maturity(attrs)?;
        let mut builder = EventBuilder::new(attrs);

        if ied >= attrs.status_date {
            builder.push(EventType::Ied, ied);
        }
        push_interest_events(&mut builder, attrs, ied, md);
        push_rate_reset_events(&mut builder, attrs, ied, md);
        push_fee_events(&mut builder, attrs, ied, md);
        push_scaling_events(&mut builder, attrs, ied, md);
        push_contractual_events(&mut builder, attrs);
        builder.push_unadjusted(EventType::Md, md);

        let mut events = builder.into_events();
        merge_callouts(&mut events, ctx, &[EventType::Pp, EventType::Ce]);
        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        initial_principal_state(ctx.attrs, |_| {})
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        let t = event.calculation_time;
        Ok(match event.event_kind {
            EventType::Ied => pof_initial_exchange(attrs, state),
            EventType::Ip => pof_interest_payment(attrs, state, t, state.notional),
            EventType::Md => pof_maturity(attrs, state, t, state.notional),
            EventType::Fp => pof_fee(attrs, state, t),
            EventType::Pp => pof_prepayment(ctx, event),
            EventType::Py => pof_penalty(ctx, event, state, t)?,
            EventType::Prd => pof_purchase(attrs, state, t, state.notional),
            EventType::Td => pof_termination(attrs, state, t, state.notional),
            _ => 0.0,
        })
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let t = event.calculation_time;
        Ok(match event.event_kind {
            EventType::Ied => stf_initial_exchange(attrs, t),
            EventType::Ip => stf_interest_payment(attrs, state, t),
            EventType::Ipci => stf_capitalization(attrs, state, t, state.notional),
            EventType::Rr => stf_rate_reset(ctx, event, state, t)?,
            EventType::Rrf => stf_rate_fixing(attrs, state, t, state.notional),
            EventType::Fp => stf_fee_payment(attrs, state, t, state.notional),
            EventType::Sc => stf_scaling(ctx, event, state, t)?,
            EventType::Pp => stf_prepayment(ctx, event, state, t),
            EventType::Md => stf_maturity(state, t),
            EventType::Td => stf_termination(state, t),
            EventType::Ce => stf_credit_event(ctx, state, t),
            _ => accrue_on_notional(attrs, state, t),
        })
    }
}

// ---------------------------------------------------------------------------
// Schedule helpers shared with the amortizing family.
// ---------------------------------------------------------------------------

pub(crate) fn initial_exchange(attrs: &ContractAttributes) -> Result<ActusDateTime, EngineError> {
    attrs
        .initial_exchange_date
        .ok_or_else(|| attrs.invalid("initial_exchange_date is required"))
}

pub(crate) fn maturity(attrs: &ContractAttributes) -> Result<ActusDateTime, EngineError> {
    attrs
        .maturity_date
        .ok_or_else(|| attrs.invalid("maturity_date is required"))
}

pub(crate) fn require_funding_terms(attrs: &ContractAttributes) -> Result<(), EngineError> {
    if attrs.initial_exchange_date.is_none() {
        return Err(attrs.invalid("initial_exchange_date is required"));
    }
    if attrs.notional_principal.is_none() {
        return Err(attrs.invalid("notional_principal is required"));
    }
    Ok(())
}

/// IP (and IPCI up to the capitalization end date) events on the interest
/// cycle, strictly inside `(ied, end)`. The accrual of the final period is
/// paid by the maturity event itself.
pub(crate) fn push_interest_events(
    builder: &mut EventBuilder,
    attrs: &ContractAttributes,
    ied: ActusDateTime,
    end: ActusDateTime,
) {
    let Some(cycle) = attrs.interest_payment_cycle else {
        return;
    };
    let anchor = attrs.interest_payment_anchor.unwrap_or(ied);
    let mut dates = expand_cycle(anchor, Some(&cycle), end, attrs.end_of_month_convention);
    if let Some(ipced) = attrs.interest_capitalization_end_date {
        if !dates.contains(&ipced) && ipced > ied && ipced < end {
            dates.push(ipced);
            dates.sort();
        }
    }
    for date in dates {
        if date <= ied || date >= end {
            continue;
        }
        match attrs.interest_capitalization_end_date {
            Some(ipced) if date <= ipced => builder.push(EventType::Ipci, date),
            _ => builder.push(EventType::Ip, date),
        }
    }
}

/// RR/RRF events on the rate reset cycle, strictly before `end`. The first
/// reset becomes a fixing when `rate_reset_next` is given.
pub(crate) fn push_rate_reset_events(
    builder: &mut EventBuilder,
    attrs: &ContractAttributes,
    ied: ActusDateTime,
    end: ActusDateTime,
) {
    let Some(cycle) = attrs.rate_reset_cycle else {
        return;
    };
    let anchor = attrs
        .rate_reset_anchor
        .unwrap_or_else(|| cycle.date_at(ied, 1, attrs.end_of_month_convention));
    let mut first = true;
    for date in expand_cycle(anchor, Some(&cycle), end, attrs.end_of_month_convention) {
        if date <= ied || date >= end {
            continue;
        }
        if first && attrs.rate_reset_next.is_some() {
            builder.push(EventType::Rrf, date);
        } else {
            builder.push(EventType::Rr, date);
        }
        first = false;
    }
}

/// FP events on the fee cycle, inside `(ied, end]`.
pub(crate) fn push_fee_events(
    builder: &mut EventBuilder,
    attrs: &ContractAttributes,
    ied: ActusDateTime,
    end: ActusDateTime,
) {
    let Some(cycle) = attrs.fee_payment_cycle else {
        return;
    };
    let anchor = attrs.fee_payment_anchor.unwrap_or(ied);
    for date in expand_cycle(anchor, Some(&cycle), end, attrs.end_of_month_convention) {
        if date > ied {
            builder.push(EventType::Fp, date);
        }
    }
}

/// SC events on the scaling cycle, inside `(ied, end]`.
pub(crate) fn push_scaling_events(
    builder: &mut EventBuilder,
    attrs: &ContractAttributes,
    ied: ActusDateTime,
    end: ActusDateTime,
) {
    let Some(cycle) = attrs.scaling_index_cycle else {
        return;
    };
    let anchor = attrs.scaling_index_anchor.unwrap_or(ied);
    for date in expand_cycle(anchor, Some(&cycle), end, attrs.end_of_month_convention) {
        if date > ied {
            builder.push(EventType::Sc, date);
        }
    }
}

/// Analysis dates, purchase and termination.
pub(crate) fn push_contractual_events(builder: &mut EventBuilder, attrs: &ContractAttributes) {
    for &ad in &attrs.analysis_dates {
        builder.push_unadjusted(EventType::Ad, ad);
    }
    if let Some(prd) = attrs.purchase_date {
        builder.push_unadjusted(EventType::Prd, prd);
    }
    if let Some(td) = attrs.termination_date {
        builder.push_unadjusted(EventType::Td, td);
    }
}

// ---------------------------------------------------------------------------
// State initialisation.
// ---------------------------------------------------------------------------

/// Initialises the state of a principal-exchanging contract.
///
/// When the initial exchange lies before the status date (or a purchase
/// removes it from the schedule) the state starts as if STF_IED had already
/// run: notional and rate set, interest accrued from the last anchor.
/// `extend` lets the amortizing variants add their redemption cells.
pub(crate) fn initial_principal_state(
    attrs: &ContractAttributes,
    extend: impl FnOnce(&mut ContractState),
) -> Result<ContractState, EngineError> {
    let sd = attrs.status_date;
    let ied = initial_exchange(attrs)?;
    let sign = attrs.role_sign();

    let mut state = ContractState::new(sd);
    state.maturity_date = attrs.maturity_date;

    let pre_existing = ied < sd;
    let purchased = attrs.purchase_date.is_some();
    if pre_existing || purchased {
        state.notional = sign * attrs.notional_principal.unwrap_or(0.0);
        state.nominal_rate = attrs.nominal_interest_rate.unwrap_or(0.0);
        state.accrued_fees = sign * attrs.fee_accrued.unwrap_or(0.0);
        if pre_existing {
            // Accrue from the last interest anchor (or the exchange itself).
            let accrual_start = attrs.interest_payment_anchor.unwrap_or(ied);
            state.accrued_interest = match attrs.accrued_interest {
                Some(ipac) => sign * ipac,
                None if accrual_start < sd => {
                    sign * yf(attrs, accrual_start, sd)
                        * state.nominal_rate
                        * attrs.notional_principal.unwrap_or(0.0)
                }
                None => 0.0,
            };
        } else {
            // Purchased before inception: interest runs from the exchange.
            state.status_date = ied.max(sd);
        }
        extend(&mut state);
    }
    Ok(state)
}

// ---------------------------------------------------------------------------
// Payoff functions. The state is pre-accrual; the explicit year-fraction
// terms bring it up to the event time.
// ---------------------------------------------------------------------------

pub(crate) fn pof_initial_exchange(attrs: &ContractAttributes, state: &ContractState) -> f64 {
    let nt = attrs.notional_principal.unwrap_or(0.0);
    let pdied = attrs.premium_discount_at_ied.unwrap_or(0.0);
    attrs.role_sign() * -1.0 * state.notional_scaling * (nt + pdied)
}

pub(crate) fn pof_interest_payment(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
    base: f64,
) -> f64 {
    state.interest_scaling * (state.accrued_interest + accrual(attrs, state, t, base))
        + state.accrued_fees
}

pub(crate) fn pof_maturity(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
    base: f64,
) -> f64 {
    state.notional_scaling * state.notional
        + state.interest_scaling * (state.accrued_interest + accrual(attrs, state, t, base))
        + state.accrued_fees
}

pub(crate) fn pof_fee(attrs: &ContractAttributes, state: &ContractState, t: ActusDateTime) -> f64 {
    let rate = attrs.fee_rate.unwrap_or(0.0);
    match attrs.fee_basis {
        Some(FeeBasis::Absolute) => attrs.role_sign() * rate,
        Some(FeeBasis::Notional) => {
            yf(attrs, state.status_date, t) * state.notional * rate + state.accrued_fees
        }
        None => state.accrued_fees,
    }
}

pub(crate) fn pof_prepayment(ctx: &SimContext, event: &ContractEvent) -> f64 {
    ctx.attrs.role_sign() * ctx.callout_amount(EventType::Pp, event.event_time)
}

pub(crate) fn pof_penalty(
    ctx: &SimContext,
    event: &ContractEvent,
    state: &ContractState,
    t: ActusDateTime,
) -> Result<f64, EngineError> {
    let attrs = ctx.attrs;
    let rate = attrs.penalty_rate.unwrap_or(0.0);
    let relative = |pyrt: f64| yf(attrs, state.status_date, t) * state.notional * pyrt;
    Ok(match attrs.penalty_type {
        Some(PenaltyType::Absolute) => attrs.role_sign() * rate,
        Some(PenaltyType::RelativeToNotional) => relative(rate),
        Some(PenaltyType::RateDifferential) => {
            let market_object = attrs
                .rate_reset_market_object
                .as_deref()
                .unwrap_or_default();
            match ctx.observe_opt(market_object, event.event_time)? {
                // Penalise the shortfall against the market level.
                Some(observed) => {
                    yf(attrs, state.status_date, t)
                        * state.notional
                        * (state.nominal_rate - observed).max(0.0)
                }
                None => relative(rate),
            }
        }
        _ => 0.0,
    })
}

pub(crate) fn pof_purchase(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
    base: f64,
) -> f64 {
    let pprd = attrs.price_at_purchase_date.unwrap_or(0.0);
    -(attrs.role_sign() * pprd + state.accrued_interest + accrual(attrs, state, t, base))
}

pub(crate) fn pof_termination(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
    base: f64,
) -> f64 {
    let ptd = attrs.price_at_termination_date.unwrap_or(0.0);
    attrs.role_sign() * ptd + state.accrued_interest + accrual(attrs, state, t, base)
}

// ---------------------------------------------------------------------------
// State transition functions.
// ---------------------------------------------------------------------------

pub(crate) fn stf_initial_exchange(attrs: &ContractAttributes, t: ActusDateTime) -> ContractState {
    let sign = attrs.role_sign();
    let nt = sign * attrs.notional_principal.unwrap_or(0.0);
    let ipnr = attrs.nominal_interest_rate.unwrap_or(0.0);

    let mut state = ContractState::new(t);
    state.maturity_date = attrs.maturity_date;
    state.notional = nt;
    state.nominal_rate = ipnr;
    state.accrued_fees = sign * attrs.fee_accrued.unwrap_or(0.0);
    state.accrued_interest = match attrs.accrued_interest {
        Some(ipac) => sign * ipac,
        None => match attrs.interest_payment_anchor {
            // An anchor before the exchange means interest already ran.
            Some(anchor) if anchor < t => yf(attrs, anchor, t) * ipnr * nt,
            _ => 0.0,
        },
    };
    state
}

pub(crate) fn stf_interest_payment(
    _attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
) -> ContractState {
    ContractState {
        status_date: t,
        accrued_interest: 0.0,
        accrued_fees: 0.0,
        ..*state
    }
}

pub(crate) fn stf_capitalization(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
    base: f64,
) -> ContractState {
    let capitalized = state.accrued_interest + accrual(attrs, state, t, base);
    ContractState {
        status_date: t,
        notional: state.notional + capitalized,
        accrued_interest: 0.0,
        ..*state
    }
}

pub(crate) fn stf_rate_reset(
    ctx: &SimContext,
    event: &ContractEvent,
    state: &ContractState,
    t: ActusDateTime,
) -> Result<ContractState, EngineError> {
    let attrs = ctx.attrs;
    let accrued = accrue_on_notional(attrs, state, t);
    let market_object = attrs
        .rate_reset_market_object
        .as_deref()
        .unwrap_or_default();
    let observed = ctx.observe(market_object, event.event_time)?;
    let multiplier = attrs.rate_reset_multiplier.unwrap_or(1.0);
    let spread = attrs.rate_reset_spread.unwrap_or(0.0);
    Ok(ContractState {
        nominal_rate: clamp_rate(attrs, observed * multiplier + spread),
        ..accrued
    })
}

pub(crate) fn stf_rate_fixing(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
    base: f64,
) -> ContractState {
    let accrued = state.accrued_interest + accrual(attrs, state, t, base);
    ContractState {
        status_date: t,
        accrued_interest: accrued,
        nominal_rate: attrs.rate_reset_next.unwrap_or(state.nominal_rate),
        ..*state
    }
}

pub(crate) fn stf_fee_payment(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
    base: f64,
) -> ContractState {
    let accrued = state.accrued_interest + accrual(attrs, state, t, base);
    ContractState {
        status_date: t,
        accrued_interest: accrued,
        accrued_fees: 0.0,
        ..*state
    }
}

pub(crate) fn stf_scaling(
    ctx: &SimContext,
    event: &ContractEvent,
    state: &ContractState,
    t: ActusDateTime,
) -> Result<ContractState, EngineError> {
    let attrs = ctx.attrs;
    let mut next = accrue_on_notional(attrs, state, t);
    let effect = attrs.scaling_effect;
    if !effect.scales_interest() && !effect.scales_notional() {
        return Ok(next);
    }
    let market_object = attrs.scaling_market_object.as_deref().unwrap_or_default();
    let index = ctx.observe(market_object, event.event_time)?;
    let base = attrs.scaling_index_at_status_date.unwrap_or(0.0);
    if base == 0.0 {
        return Err(ctx.numeric_domain(event, "scaling_index_at_status_date is zero"));
    }
    if effect.scales_notional() {
        next.notional_scaling = index / base;
    }
    if effect.scales_interest() {
        next.interest_scaling = index / base;
    }
    Ok(next)
}

pub(crate) fn stf_prepayment(
    ctx: &SimContext,
    event: &ContractEvent,
    state: &ContractState,
    t: ActusDateTime,
) -> ContractState {
    let amount = ctx.callout_amount(EventType::Pp, event.event_time);
    let accrued = accrue_on_notional(ctx.attrs, state, t);
    ContractState {
        notional: accrued.notional - ctx.attrs.role_sign() * amount,
        ..accrued
    }
}

pub(crate) fn stf_maturity(state: &ContractState, t: ActusDateTime) -> ContractState {
    // The nominal rate survives maturity; amounts are settled.
    ContractState {
        status_date: t,
        notional: 0.0,
        accrued_interest: 0.0,
        accrued_fees: 0.0,
        next_principal_payment: 0.0,
        interest_calc_base: 0.0,
        ..*state
    }
}

pub(crate) fn stf_termination(state: &ContractState, t: ActusDateTime) -> ContractState {
    stf_maturity(state, t)
}

pub(crate) fn stf_credit_event(
    ctx: &SimContext,
    state: &ContractState,
    t: ActusDateTime,
) -> ContractState {
    let severity = ctx.callout_amount(EventType::Ce, t);
    let performance = if severity == 1.0 {
        ContractPerformance::Dl
    } else if severity == 2.0 {
        ContractPerformance::Dq
    } else {
        ContractPerformance::Df
    };
    ContractState {
        performance,
        ..accrue_on_notional(ctx.attrs, state, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::observers::market::ConstantObserver;
    use actus_core::types::enums::{ContractRole, ContractType, DayCountConvention};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn pam_attrs() -> ContractAttributes {
        let mut attrs = ContractAttributes::new(
            "PAM-TEST",
            ContractType::Pam,
            ContractRole::Rpa,
            d(2024, 1, 1),
            "USD",
        );
        attrs.initial_exchange_date = Some(d(2024, 1, 15));
        attrs.maturity_date = Some(d(2025, 1, 15));
        attrs.notional_principal = Some(100_000.0);
        attrs.nominal_interest_rate = Some(0.05);
        attrs.day_count_convention = Some(DayCountConvention::ThirtyE360);
        attrs.interest_payment_cycle = "6M".parse().ok();
        attrs
    }

    fn ctx<'a>(attrs: &'a ContractAttributes, market: &'a ConstantObserver) -> SimContext<'a> {
        SimContext {
            attrs,
            market,
            behavior: None,
            children: None,
        }
    }

    #[test]
    fn test_schedule_shape() {
        let attrs = pam_attrs();
        let market = ConstantObserver::new(0.0);
        let events = Pam.schedule(&ctx(&attrs, &market)).unwrap();
        let kinds: Vec<(EventType, ActusDateTime)> =
            events.iter().map(|e| (e.event_kind, e.event_time)).collect();
        assert!(kinds.contains(&(EventType::Ied, d(2024, 1, 15))));
        assert!(kinds.contains(&(EventType::Ip, d(2024, 7, 15))));
        assert!(kinds.contains(&(EventType::Md, d(2025, 1, 15))));
        // No IP event at maturity: the final accrual is paid by MD itself.
        assert!(!kinds.contains(&(EventType::Ip, d(2025, 1, 15))));
    }

    #[test]
    fn test_pre_existing_contract_skips_ied() {
        let mut attrs = pam_attrs();
        attrs.status_date = d(2024, 6, 1);
        let market = ConstantObserver::new(0.0);
        let events = Pam.schedule(&ctx(&attrs, &market)).unwrap();
        assert!(!events.iter().any(|e| e.event_kind == EventType::Ied));
        // But the state starts as if the exchange had happened.
        let state = Pam.initial_state(&ctx(&attrs, &market)).unwrap();
        assert_relative_eq!(state.notional, 100_000.0);
        assert_eq!(state.nominal_rate, 0.05);
        // Interest accrued from IED to SD: 4.5 months at 30E/360.
        assert_relative_eq!(state.accrued_interest, 100_000.0 * 0.05 * 136.0 / 360.0, epsilon = 1e-6);
    }

    #[test]
    fn test_stf_ied_sets_funding() {
        let attrs = pam_attrs();
        let state = stf_initial_exchange(&attrs, d(2024, 1, 15));
        assert_eq!(state.notional, 100_000.0);
        assert_eq!(state.nominal_rate, 0.05);
        assert_eq!(state.accrued_interest, 0.0);
        assert_eq!(state.notional_scaling, 1.0);
    }

    #[test]
    fn test_stf_ied_liability_sign() {
        let mut attrs = pam_attrs();
        attrs.contract_role = ContractRole::Rpl;
        let state = stf_initial_exchange(&attrs, d(2024, 1, 15));
        assert_eq!(state.notional, -100_000.0);
    }

    #[test]
    fn test_pof_interest_payment() {
        let attrs = pam_attrs();
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        let payoff = pof_interest_payment(&attrs, &state, d(2024, 7, 15), state.notional);
        assert_relative_eq!(payoff, 2_500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pof_maturity_includes_final_accrual() {
        let attrs = pam_attrs();
        let mut state = ContractState::new(d(2024, 7, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        let payoff = pof_maturity(&attrs, &state, d(2025, 1, 15), state.notional);
        assert_relative_eq!(payoff, 102_500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stf_maturity_preserves_rate() {
        let mut state = ContractState::new(d(2024, 7, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        state.accrued_interest = 1_000.0;
        let next = stf_maturity(&state, d(2025, 1, 15));
        assert_eq!(next.notional, 0.0);
        assert_eq!(next.accrued_interest, 0.0);
        assert_eq!(next.nominal_rate, 0.05);
    }

    #[test]
    fn test_stf_rate_reset_observes_and_clamps() {
        let mut attrs = pam_attrs();
        attrs.rate_reset_market_object = Some("UST-1Y".to_string());
        attrs.rate_reset_multiplier = Some(1.0);
        attrs.rate_reset_spread = Some(0.005);
        attrs.rate_reset_cap = Some(0.07);
        let market = ConstantObserver::new(0.08);
        let c = ctx(&attrs, &market);

        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        let event = ContractEvent::scheduled(EventType::Rr, d(2024, 7, 15), "USD");
        let next = stf_rate_reset(&c, &event, &state, d(2024, 7, 15)).unwrap();
        // 0.08 * 1.0 + 0.005 = 0.085, capped at 0.07.
        assert_eq!(next.nominal_rate, 0.07);
        // Interest up to the reset accrued at the old rate.
        assert_relative_eq!(next.accrued_interest, 2_500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stf_capitalization_moves_interest_to_notional() {
        let attrs = pam_attrs();
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        let next = stf_capitalization(&attrs, &state, d(2024, 7, 15), state.notional);
        assert_relative_eq!(next.notional, 102_500.0, epsilon = 1e-9);
        assert_eq!(next.accrued_interest, 0.0);
    }

    #[test]
    fn test_pof_fee_notional_basis() {
        let mut attrs = pam_attrs();
        attrs.fee_basis = Some(FeeBasis::Notional);
        attrs.fee_rate = Some(0.01);
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        let payoff = pof_fee(&attrs, &state, d(2024, 7, 15));
        assert_relative_eq!(payoff, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pof_penalty_types() {
        let mut attrs = pam_attrs();
        attrs.penalty_rate = Some(0.02);
        let market = ConstantObserver::new(0.03);
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        let event = ContractEvent::scheduled(EventType::Py, d(2024, 7, 15), "USD");

        attrs.penalty_type = Some(PenaltyType::Absolute);
        let c = ctx(&attrs, &market);
        assert_eq!(pof_penalty(&c, &event, &state, d(2024, 7, 15)).unwrap(), 0.02);

        attrs.penalty_type = Some(PenaltyType::RelativeToNotional);
        let c = ctx(&attrs, &market);
        assert_relative_eq!(
            pof_penalty(&c, &event, &state, d(2024, 7, 15)).unwrap(),
            1_000.0,
            epsilon = 1e-9
        );

        // Differential: rate 5% against observed 3% over half a year.
        attrs.penalty_type = Some(PenaltyType::RateDifferential);
        attrs.rate_reset_market_object = Some("MKT".to_string());
        let c = ctx(&attrs, &market);
        assert_relative_eq!(
            pof_penalty(&c, &event, &state, d(2024, 7, 15)).unwrap(),
            1_000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_scaling_requires_baseline() {
        let mut attrs = pam_attrs();
        attrs.scaling_effect = "IN0".parse().unwrap();
        attrs.scaling_market_object = Some("CPI".to_string());
        let market = ConstantObserver::new(110.0);
        let c = ctx(&attrs, &market);
        let state = ContractState::new(d(2024, 1, 15));
        let event = ContractEvent::scheduled(EventType::Sc, d(2024, 7, 15), "USD");
        // Missing baseline is a numeric-domain failure with event context.
        let err = stf_scaling(&c, &event, &state, d(2024, 7, 15)).unwrap_err();
        assert!(matches!(err, EngineError::NumericDomain { .. }));

        attrs.scaling_index_at_status_date = Some(100.0);
        let c = ctx(&attrs, &market);
        let next = stf_scaling(&c, &event, &state, d(2024, 7, 15)).unwrap();
        assert_relative_eq!(next.notional_scaling, 1.1, epsilon = 1e-12);
        assert_relative_eq!(next.interest_scaling, 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_purchase_window_removes_ied() {
        let mut attrs = pam_attrs();
        attrs.purchase_date = Some(d(2024, 6, 1));
        attrs.price_at_purchase_date = Some(99_000.0);
        let market = ConstantObserver::new(0.0);
        let events = Pam.schedule(&ctx(&attrs, &market)).unwrap();
        assert!(!events.iter().any(|e| e.event_kind == EventType::Ied));
        assert!(events.iter().any(|e| e.event_kind == EventType::Prd));
        assert!(events.iter().all(|e| e.event_time >= d(2024, 6, 1)));
    }

    #[test]
    fn test_termination_truncates_schedule() {
        let mut attrs = pam_attrs();
        attrs.termination_date = Some(d(2024, 8, 1));
        let market = ConstantObserver::new(0.0);
        let events = Pam.schedule(&ctx(&attrs, &market)).unwrap();
        assert!(events.iter().all(|e| e.event_time <= d(2024, 8, 1)));
        assert!(!events.iter().any(|e| e.event_kind == EventType::Md));
    }
}
