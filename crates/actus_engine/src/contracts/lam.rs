//! Linear amortizer (LAM) contracts.
//!
//! LAM pays a fixed principal instalment (`Prnxt`) on the redemption cycle;
//! whatever remains at maturity is redeemed by the maturity event. The
//! notional never crosses zero: the last instalment is capped at the
//! remaining amount.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::{EventType, InterestCalculationBase};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::pam::{
    self, initial_exchange, initial_principal_state, pof_fee, pof_interest_payment, pof_maturity,
    pof_penalty, pof_prepayment, pof_purchase, pof_termination, push_contractual_events,
    push_fee_events, push_interest_events, push_rate_reset_events, push_scaling_events,
    require_funding_terms,
};
use crate::contracts::{apply_window, merge_callouts, SimContext, VariantLogic};
use crate::functions::{accrual, accrue_on_base, clamp_rate, interest_base};
use crate::schedule::{expand_cycle, EventBuilder};

/// Linear amortizer variant record.
pub(crate) struct Lam;

impl VariantLogic for Lam {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        validate_amortizer(attrs)
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        amortizer_schedule(ctx)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        amortizer_initial_state(ctx.attrs)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        if event.event_kind == EventType::Pr {
            let instalment = clamp_to_remaining(state.next_principal_payment, state.notional);
            return Ok(state.notional_scaling * instalment);
        }
        amortizer_payoff(event, state, ctx)
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        if event.event_kind == EventType::Pr {
            return Ok(stf_linear_redemption(ctx.attrs, state, event.calculation_time));
        }
        amortizer_transition(event, state, ctx)
    }
}

// ---------------------------------------------------------------------------
// Shared amortizer machinery (LAM, NAM, ANN).
// ---------------------------------------------------------------------------

pub(crate) fn validate_amortizer(attrs: &ContractAttributes) -> Result<(), EngineError> {
    require_funding_terms(attrs)?;
    if attrs.maturity_date.is_none()
        && (attrs.principal_redemption_cycle.is_none()
            || attrs.next_principal_redemption_amount.is_none())
    {
        return Err(attrs.invalid(
            "either maturity_date or a principal redemption cycle with an amount is required",
        ));
    }
    Ok(())
}

/// The contract's maturity: explicit (the amortization end date stands in
/// when no maturity is given), or derived as the date the instalment
/// schedule exhausts the notional.
pub(crate) fn effective_maturity(
    attrs: &ContractAttributes,
) -> Result<ActusDateTime, EngineError> {
    if let Some(md) = attrs.maturity_date.or(attrs.amortization_date) {
        return Ok(md);
    }
    let ied = initial_exchange(attrs)?;
    let cycle = attrs
        .principal_redemption_cycle
        .ok_or_else(|| attrs.invalid("principal_redemption_cycle is required"))?;
    let prnxt = attrs
        .next_principal_redemption_amount
        .ok_or_else(|| attrs.invalid("next_principal_redemption_amount is required"))?;
    if prnxt <= 0.0 {
        return Err(attrs.invalid("next_principal_redemption_amount must be positive"));
    }
    let notional = attrs.notional_principal.unwrap_or(0.0).abs();
    let anchor = attrs
        .principal_redemption_anchor
        .unwrap_or_else(|| cycle.date_at(ied, 1, attrs.end_of_month_convention));
    let instalments = (notional / prnxt).ceil().max(1.0) as u32;
    Ok(cycle.date_at(anchor, instalments - 1, attrs.end_of_month_convention))
}

/// PR dates strictly inside `(ied, md)`; the final redemption is the
/// maturity event itself.
pub(crate) fn redemption_dates(
    attrs: &ContractAttributes,
    ied: ActusDateTime,
    md: ActusDateTime,
) -> Vec<ActusDateTime> {
    let Some(cycle) = attrs.principal_redemption_cycle else {
        return Vec::new();
    };
    let anchor = attrs
        .principal_redemption_anchor
        .unwrap_or_else(|| cycle.date_at(ied, 1, attrs.end_of_month_convention));
    expand_cycle(anchor, Some(&cycle), md, attrs.end_of_month_convention)
        .into_iter()
        .filter(|&d| d > ied && d < md)
        .collect()
}

pub(crate) fn amortizer_schedule(ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
    let attrs = ctx.attrs;
    let ied = initial_exchange(attrs)?;
    let md = effective_maturity(attrs)?;
    let mut builder = EventBuilder::new(attrs);

    if ied >= attrs.status_date {
        builder.push(EventType::Ied, ied);
    }
    for date in redemption_dates(attrs, ied, md) {
        builder.push(EventType::Pr, date);
    }
    push_interest_events(&mut builder, attrs, ied, md);
    push_rate_reset_events(&mut builder, attrs, ied, md);
    push_fee_events(&mut builder, attrs, ied, md);
    push_scaling_events(&mut builder, attrs, ied, md);
    push_base_refixing_events(&mut builder, attrs, ied, md);
    push_contractual_events(&mut builder, attrs);
    builder.push_unadjusted(EventType::Md, md);

    let mut events = builder.into_events();
    merge_callouts(&mut events, ctx, &[EventType::Pp, EventType::Ce]);
    apply_window(&mut events, attrs);
    Ok(events)
}

/// IPCB refixing events, lagged-base mode only.
pub(crate) fn push_base_refixing_events(
    builder: &mut EventBuilder,
    attrs: &ContractAttributes,
    ied: ActusDateTime,
    end: ActusDateTime,
) {
    if attrs.interest_calculation_base != Some(InterestCalculationBase::NtLagged) {
        return;
    }
    let Some(cycle) = attrs.interest_calculation_base_cycle else {
        return;
    };
    let anchor = attrs.interest_calculation_base_anchor.unwrap_or(ied);
    for date in expand_cycle(anchor, Some(&cycle), end, attrs.end_of_month_convention) {
        if date > ied && date < end {
            builder.push(EventType::Ipcb, date);
        }
    }
}

/// The signed instalment amount at inception.
pub(crate) fn initial_instalment(attrs: &ContractAttributes) -> Result<f64, EngineError> {
    let sign = attrs.role_sign();
    if let Some(prnxt) = attrs.next_principal_redemption_amount {
        return Ok(sign * prnxt);
    }
    let ied = initial_exchange(attrs)?;
    let md = effective_maturity(attrs)?;
    let periods = redemption_dates(attrs, ied, md).len() + 1;
    Ok(sign * attrs.notional_principal.unwrap_or(0.0) / periods as f64)
}

/// The signed interest calculation base at inception.
pub(crate) fn initial_base(attrs: &ContractAttributes, notional: f64) -> f64 {
    match (
        attrs.interest_calculation_base,
        attrs.interest_calculation_base_amount,
    ) {
        (Some(InterestCalculationBase::NtIed), Some(amount)) => attrs.role_sign() * amount,
        _ => notional,
    }
}

pub(crate) fn amortizer_initial_state(
    attrs: &ContractAttributes,
) -> Result<ContractState, EngineError> {
    let instalment = initial_instalment(attrs)?;
    initial_principal_state(attrs, |state| {
        state.next_principal_payment = instalment;
        state.interest_calc_base = initial_base(attrs, state.notional);
    })
}

/// The payoff arms every amortizer shares (everything except PR).
pub(crate) fn amortizer_payoff(
    event: &ContractEvent,
    state: &ContractState,
    ctx: &SimContext,
) -> Result<f64, EngineError> {
    let attrs = ctx.attrs;
    let t = event.calculation_time;
    let base = interest_base(state);
    Ok(match event.event_kind {
        EventType::Ied => pam::pof_initial_exchange(attrs, state),
        EventType::Ip => pof_interest_payment(attrs, state, t, base),
        EventType::Md => pof_maturity(attrs, state, t, base),
        EventType::Fp => pof_fee(attrs, state, t),
        EventType::Pp => pof_prepayment(ctx, event),
        EventType::Py => pof_penalty(ctx, event, state, t)?,
        EventType::Prd => pof_purchase(attrs, state, t, base),
        EventType::Td => pof_termination(attrs, state, t, base),
        _ => 0.0,
    })
}

/// The transition arms every amortizer shares (everything except PR and the
/// annuity refits).
pub(crate) fn amortizer_transition(
    event: &ContractEvent,
    state: &ContractState,
    ctx: &SimContext,
) -> Result<ContractState, EngineError> {
    let attrs = ctx.attrs;
    let t = event.calculation_time;
    let base = interest_base(state);
    Ok(match event.event_kind {
        EventType::Ied => stf_initial_exchange_amortizer(attrs)?,
        EventType::Ip => {
            let paid = pam::stf_interest_payment(attrs, state, t);
            refix_base_after_notional_change(attrs, paid)
        }
        EventType::Ipci => {
            let capitalized = pam::stf_capitalization(attrs, state, t, base);
            refix_base_after_notional_change(attrs, capitalized)
        }
        EventType::Rr => {
            let accrued = accrue_on_base(attrs, state, t);
            let market_object = attrs
                .rate_reset_market_object
                .as_deref()
                .unwrap_or_default();
            let observed = ctx.observe(market_object, event.event_time)?;
            let multiplier = attrs.rate_reset_multiplier.unwrap_or(1.0);
            let spread = attrs.rate_reset_spread.unwrap_or(0.0);
            ContractState {
                nominal_rate: clamp_rate(attrs, observed * multiplier + spread),
                ..accrued
            }
        }
        EventType::Rrf => pam::stf_rate_fixing(attrs, state, t, base),
        EventType::Fp => pam::stf_fee_payment(attrs, state, t, base),
        EventType::Sc => pam::stf_scaling(ctx, event, state, t)?,
        EventType::Ipcb => {
            // Lagged base refixes to the current notional.
            let accrued = accrue_on_base(attrs, state, t);
            ContractState {
                interest_calc_base: accrued.notional,
                ..accrued
            }
        }
        EventType::Pp => {
            let moved = pam::stf_prepayment(ctx, event, state, t);
            refix_base_after_notional_change(attrs, moved)
        }
        EventType::Md => pam::stf_maturity(state, t),
        EventType::Td => pam::stf_termination(state, t),
        EventType::Ce => pam::stf_credit_event(ctx, state, t),
        _ => accrue_on_base(attrs, state, t),
    })
}

pub(crate) fn stf_initial_exchange_amortizer(
    attrs: &ContractAttributes,
) -> Result<ContractState, EngineError> {
    let ied = initial_exchange(attrs)?;
    let mut state = pam::stf_initial_exchange(attrs, ied);
    state.maturity_date = Some(effective_maturity(attrs)?);
    state.next_principal_payment = initial_instalment(attrs)?;
    state.interest_calc_base = initial_base(attrs, state.notional);
    Ok(state)
}

/// LAM redemption: the notional falls by the instalment, capped so it cannot
/// cross zero.
pub(crate) fn stf_linear_redemption(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
) -> ContractState {
    let accrued = accrue_on_base(attrs, state, t);
    let instalment = clamp_to_remaining(accrued.next_principal_payment, accrued.notional);
    let next = ContractState {
        notional: accrued.notional - instalment,
        ..accrued
    };
    refix_base_after_notional_change(attrs, next)
}

/// Caps a redemption at the remaining notional, preserving signs.
pub(crate) fn clamp_to_remaining(amount: f64, notional: f64) -> f64 {
    if amount.abs() > notional.abs() {
        notional
    } else {
        amount
    }
}

/// In NT mode the interest base tracks the notional after every change.
pub(crate) fn refix_base_after_notional_change(
    attrs: &ContractAttributes,
    state: ContractState,
) -> ContractState {
    match attrs.interest_calculation_base {
        None | Some(InterestCalculationBase::Nt) => ContractState {
            interest_calc_base: state.notional,
            ..state
        },
        _ => state,
    }
}

/// The interest accrued by a redemption period on the current base.
pub(crate) fn period_interest(
    attrs: &ContractAttributes,
    state: &ContractState,
    t: ActusDateTime,
) -> f64 {
    state.accrued_interest + accrual(attrs, state, t, interest_base(state))
}
