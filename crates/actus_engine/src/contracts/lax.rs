//! Exotic linear amortizer (LAX) contracts.
//!
//! LAX generalizes LAM with array schedules: the redemption amounts, rates
//! and cycles are given per segment rather than as a single cycle. Segments
//! may increase the principal (PI events) as well as redeem it (PR events).

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::{EventType, FixedVariable, IncreaseDecrease};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::lam::{
    clamp_to_remaining, initial_base, refix_base_after_notional_change,
};
use crate::contracts::pam::{
    self, initial_exchange, initial_principal_state, maturity, push_contractual_events,
    push_fee_events, require_funding_terms,
};
use crate::contracts::{apply_window, merge_callouts, SimContext, VariantLogic};
use crate::functions::{accrue_on_base, clamp_rate};
use crate::schedule::{expand_array, EventBuilder};

/// Exotic linear amortizer variant record.
pub(crate) struct Lax;

impl VariantLogic for Lax {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        require_funding_terms(attrs)?;
        if attrs.maturity_date.is_none() {
            return Err(attrs.invalid("maturity_date is required"));
        }
        if attrs.array_pr_anchor.is_empty() {
            return Err(attrs.invalid("array_pr_anchor is required"));
        }
        if attrs.array_pr_next.len() != attrs.array_pr_anchor.len() {
            return Err(attrs.invalid("array_pr_next must match array_pr_anchor"));
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

        // Redemption events from the array segments; the segment direction
        // decides PR versus PI. The final redemption folds into maturity.
        for date in expand_array(
            &attrs.array_pr_anchor,
            &attrs.array_pr_cycle,
            md,
            attrs.end_of_month_convention,
        ) {
            if date <= ied || date >= md {
                continue;
            }
            let kind = match segment_direction(attrs, date) {
                IncreaseDecrease::Increase => EventType::Pi,
                IncreaseDecrease::Decrease => EventType::Pr,
            };
            builder.push(kind, date);
        }

        // Interest events from the array (or the scalar cycle as fallback).
        if attrs.array_ip_anchor.is_empty() {
            pam::push_interest_events(&mut builder, attrs, ied, md);
        } else {
            for date in expand_array(
                &attrs.array_ip_anchor,
                &attrs.array_ip_cycle,
                md,
                attrs.end_of_month_convention,
            ) {
                if date > ied && date < md {
                    builder.push(EventType::Ip, date);
                }
            }
        }

        // Rate events from the array: fixed segments fix, variable segments
        // observe.
        for date in expand_array(
            &attrs.array_rr_anchor,
            &attrs.array_rr_cycle,
            md,
            attrs.end_of_month_convention,
        ) {
            if date <= ied || date >= md {
                continue;
            }
            let kind = match rate_segment(attrs, date).1 {
                FixedVariable::Fixed => EventType::Rrf,
                FixedVariable::Variable => EventType::Rr,
            };
            builder.push(kind, date);
        }

        push_fee_events(&mut builder, attrs, ied, md);
        push_contractual_events(&mut builder, attrs);
        builder.push_unadjusted(EventType::Md, md);

        let mut events = builder.into_events();
        merge_callouts(&mut events, ctx, &[EventType::Pp, EventType::Ce]);
        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let instalment = attrs.role_sign()
            * attrs
                .next_principal_redemption_amount
                .or_else(|| attrs.array_pr_next.first().copied())
                .unwrap_or(0.0);
        initial_principal_state(attrs, |state| {
            state.next_principal_payment = instalment;
            state.interest_calc_base = initial_base(attrs, state.notional);
        })
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        match event.event_kind {
            EventType::Pr => {
                let amount = attrs.role_sign() * segment_amount(attrs, event.event_time);
                Ok(state.notional_scaling * clamp_to_remaining(amount, state.notional))
            }
            EventType::Pi => {
                let amount = attrs.role_sign() * segment_amount(attrs, event.event_time);
                Ok(-state.notional_scaling * amount)
            }
            _ => crate::contracts::lam::amortizer_payoff(event, state, ctx),
        }
    }

    fn transition(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let t = event.calculation_time;
        match event.event_kind {
            EventType::Pr | EventType::Pi => {
                let accrued = accrue_on_base(attrs, state, t);
                let amount = attrs.role_sign() * segment_amount(attrs, event.event_time);
                let delta = if event.event_kind == EventType::Pr {
                    clamp_to_remaining(amount, accrued.notional)
                } else {
                    -amount
                };
                let next = ContractState {
                    notional: accrued.notional - delta,
                    next_principal_payment: amount,
                    ..accrued
                };
                Ok(refix_base_after_notional_change(attrs, next))
            }
            EventType::Rr => {
                let accrued = accrue_on_base(attrs, state, t);
                let (spread, _) = rate_segment(attrs, event.event_time);
                let market_object = attrs
                    .rate_reset_market_object
                    .as_deref()
                    .unwrap_or_default();
                let observed = ctx.observe(market_object, event.event_time)?;
                let multiplier = attrs.rate_reset_multiplier.unwrap_or(1.0);
                Ok(ContractState {
                    nominal_rate: clamp_rate(attrs, observed * multiplier + spread),
                    ..accrued
                })
            }
            EventType::Rrf => {
                let accrued = accrue_on_base(attrs, state, t);
                let (rate, _) = rate_segment(attrs, event.event_time);
                Ok(ContractState {
                    nominal_rate: rate,
                    ..accrued
                })
            }
            EventType::Ip => {
                let paid = pam::stf_interest_payment(attrs, state, t);
                Ok(refix_base_after_notional_change(attrs, paid))
            }
            _ => crate::contracts::lam::amortizer_transition(event, state, ctx),
        }
    }
}

/// The redemption amount of the segment covering `date`: the last anchor at
/// or before it.
fn segment_amount(attrs: &ContractAttributes, date: ActusDateTime) -> f64 {
    segment_index(&attrs.array_pr_anchor, date)
        .and_then(|i| attrs.array_pr_next.get(i).copied())
        .unwrap_or(0.0)
}

fn segment_direction(attrs: &ContractAttributes, date: ActusDateTime) -> IncreaseDecrease {
    segment_index(&attrs.array_pr_anchor, date)
        .and_then(|i| attrs.array_increase_decrease.get(i).copied())
        .unwrap_or(IncreaseDecrease::Decrease)
}

/// The `(rate-or-spread, fixed/variable)` of the rate segment covering
/// `date`.
fn rate_segment(attrs: &ContractAttributes, date: ActusDateTime) -> (f64, FixedVariable) {
    let index = segment_index(&attrs.array_rr_anchor, date);
    let rate = index
        .and_then(|i| attrs.array_rate.get(i).copied())
        .unwrap_or(0.0);
    let fixed_variable = index
        .and_then(|i| attrs.array_fixed_variable.get(i).copied())
        .unwrap_or(FixedVariable::Fixed);
    (rate, fixed_variable)
}

fn segment_index(anchors: &[ActusDateTime], date: ActusDateTime) -> Option<usize> {
    anchors
        .iter()
        .rposition(|&anchor| anchor <= date)
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

    fn lax_attrs() -> ContractAttributes {
        let mut attrs = ContractAttributes::new(
            "LAX-TEST",
            ContractType::Lax,
            ContractRole::Rpa,
            d(2024, 1, 1),
            "USD",
        );
        attrs.initial_exchange_date = Some(d(2024, 1, 15));
        attrs.maturity_date = Some(d(2025, 1, 15));
        attrs.notional_principal = Some(100_000.0);
        attrs.nominal_interest_rate = Some(0.05);
        attrs.day_count_convention = Some(DayCountConvention::ThirtyE360);
        attrs.array_pr_anchor = vec![d(2024, 4, 15), d(2024, 10, 15)];
        attrs.array_pr_cycle = vec!["3M".parse().unwrap(), "3M".parse().unwrap()];
        attrs.array_pr_next = vec![10_000.0, 20_000.0];
        attrs.array_increase_decrease =
            vec![IncreaseDecrease::Decrease, IncreaseDecrease::Decrease];
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
    fn test_segment_lookup() {
        let attrs = lax_attrs();
        assert_eq!(segment_amount(&attrs, d(2024, 4, 15)), 10_000.0);
        assert_eq!(segment_amount(&attrs, d(2024, 7, 15)), 10_000.0);
        assert_eq!(segment_amount(&attrs, d(2024, 10, 15)), 20_000.0);
        assert_eq!(segment_amount(&attrs, d(2024, 1, 1)), 0.0);
    }

    #[test]
    fn test_schedule_uses_segment_amounts() {
        let attrs = lax_attrs();
        let market = ConstantObserver::new(0.0);
        let events = Lax.schedule(&ctx(&attrs, &market)).unwrap();
        let pr_dates: Vec<ActusDateTime> = events
            .iter()
            .filter(|e| e.event_kind == EventType::Pr)
            .map(|e| e.event_time)
            .collect();
        assert_eq!(pr_dates, vec![d(2024, 4, 15), d(2024, 7, 15), d(2024, 10, 15)]);
    }

    #[test]
    fn test_redemption_amounts_step_up() {
        let attrs = lax_attrs();
        let market = ConstantObserver::new(0.0);
        let c = ctx(&attrs, &market);
        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        state.interest_calc_base = 100_000.0;

        let pr1 = ContractEvent::scheduled(EventType::Pr, d(2024, 4, 15), "USD");
        assert_relative_eq!(Lax.payoff(&pr1, &state, &c).unwrap(), 10_000.0, epsilon = 1e-9);
        state = Lax.transition(&pr1, &state, &c).unwrap();
        assert_relative_eq!(state.notional, 90_000.0, epsilon = 1e-9);

        let pr2 = ContractEvent::scheduled(EventType::Pr, d(2024, 10, 15), "USD");
        assert_relative_eq!(Lax.payoff(&pr2, &state, &c).unwrap(), 20_000.0, epsilon = 1e-9);
        state = Lax.transition(&pr2, &state, &c).unwrap();
        assert_relative_eq!(state.notional, 70_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_principal_increase_segment() {
        let mut attrs = lax_attrs();
        attrs.array_increase_decrease =
            vec![IncreaseDecrease::Increase, IncreaseDecrease::Decrease];
        let market = ConstantObserver::new(0.0);
        let c = ctx(&attrs, &market);

        let events = Lax.schedule(&c).unwrap();
        assert!(events.iter().any(|e| e.event_kind == EventType::Pi));

        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.interest_calc_base = 100_000.0;
        let pi = ContractEvent::scheduled(EventType::Pi, d(2024, 4, 15), "USD");
        // A principal increase is a further disbursement.
        assert_relative_eq!(Lax.payoff(&pi, &state, &c).unwrap(), -10_000.0, epsilon = 1e-9);
        let next = Lax.transition(&pi, &state, &c).unwrap();
        assert_relative_eq!(next.notional, 110_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_rate_segment_fixes() {
        let mut attrs = lax_attrs();
        attrs.array_rr_anchor = vec![d(2024, 7, 15)];
        attrs.array_rr_cycle = vec!["6M".parse().unwrap()];
        attrs.array_rate = vec![0.08];
        attrs.array_fixed_variable = vec![FixedVariable::Fixed];
        let market = ConstantObserver::new(0.0);
        let c = ctx(&attrs, &market);

        let events = Lax.schedule(&c).unwrap();
        assert!(events.iter().any(|e| e.event_kind == EventType::Rrf));

        let mut state = ContractState::new(d(2024, 1, 15));
        state.notional = 100_000.0;
        state.nominal_rate = 0.05;
        state.interest_calc_base = 100_000.0;
        let rrf = ContractEvent::scheduled(EventType::Rrf, d(2024, 7, 15), "USD");
        let next = Lax.transition(&rrf, &state, &c).unwrap();
        assert_eq!(next.nominal_rate, 0.08);
    }
}
