//! Undefined maturity profile (UMP) contracts.
//!
//! UMP models savings-style positions: deposits (PI) and withdrawals (PR)
//! arrive from a behavioral observer rather than a schedule, while interest
//! accrues and capitalizes on a cycle. Without a maturity date the contract
//! runs to the horizon date or to its last observed event.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::EventType;
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::pam::{
    self, initial_exchange, initial_principal_state, pof_fee, pof_maturity, push_contractual_events,
    push_fee_events, push_rate_reset_events, require_funding_terms,
};
use crate::contracts::{apply_window, merge_callouts, SimContext, VariantLogic};
use crate::functions::accrue_on_notional;
use crate::schedule::{expand_cycle, EventBuilder};

/// Undefined maturity profile variant record.
pub(crate) struct Ump;

impl VariantLogic for Ump {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        require_funding_terms(attrs)
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let ied = initial_exchange(attrs)?;
        let callouts = ctx.callouts();
        let end = attrs
            .maturity_date
            .or(attrs.horizon_date)
            .or_else(|| callouts.iter().map(|c| c.time).max());
        let mut builder = EventBuilder::new(attrs);

        if ied >= attrs.status_date {
            builder.push(EventType::Ied, ied);
        }
        if let (Some(cycle), Some(end)) = (attrs.interest_payment_cycle, end) {
            let anchor = attrs
                .interest_payment_anchor
                .unwrap_or_else(|| cycle.date_at(ied, 1, attrs.end_of_month_convention));
            for date in expand_cycle(anchor, Some(&cycle), end, attrs.end_of_month_convention) {
                if date > ied && date < end {
                    builder.push(EventType::Ipci, date);
                }
            }
        }
        if let Some(end) = end {
            push_rate_reset_events(&mut builder, attrs, ied, end);
            push_fee_events(&mut builder, attrs, ied, end);
            // A maturity or horizon closes the position and returns the
            // balance.
            builder.push_unadjusted(EventType::Md, end);
        }
        push_contractual_events(&mut builder, attrs);

        let mut events = builder.into_events();
        merge_callouts(&mut events, ctx, &[EventType::Pr, EventType::Pi, EventType::Ce]);
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
            EventType::Ied => pam::pof_initial_exchange(attrs, state),
            // Withdrawals pay out, deposits pay in.
            EventType::Pr => attrs.role_sign() * ctx.callout_amount(EventType::Pr, event.event_time),
            EventType::Pi => {
                -attrs.role_sign() * ctx.callout_amount(EventType::Pi, event.event_time)
            }
            EventType::Md => pof_maturity(attrs, state, t, state.notional),
            EventType::Fp => pof_fee(attrs, state, t),
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
            EventType::Ied => pam::stf_initial_exchange(attrs, t),
            EventType::Ipci => pam::stf_capitalization(attrs, state, t, state.notional),
            EventType::Rr => pam::stf_rate_reset(ctx, event, state, t)?,
            EventType::Rrf => pam::stf_rate_fixing(attrs, state, t, state.notional),
            EventType::Fp => pam::stf_fee_payment(attrs, state, t, state.notional),
            EventType::Pr => {
                let amount = ctx.callout_amount(EventType::Pr, event.event_time);
                let accrued = accrue_on_notional(attrs, state, t);
                ContractState {
                    notional: accrued.notional - attrs.role_sign() * amount,
                    ..accrued
                }
            }
            EventType::Pi => {
                let amount = ctx.callout_amount(EventType::Pi, event.event_time);
                let accrued = accrue_on_notional(attrs, state, t);
                ContractState {
                    notional: accrued.notional + attrs.role_sign() * amount,
                    ..accrued
                }
            }
            EventType::Md => pam::stf_maturity(state, t),
            EventType::Ce => pam::stf_credit_event(ctx, state, t),
            _ => accrue_on_notional(attrs, state, t),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::observers::behavior::{BehavioralOverlay, CalloutEvent};
    use actus_core::observers::market::ConstantObserver;
    use actus_core::types::enums::{ContractRole, ContractType, DayCountConvention};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    fn ump_attrs() -> ContractAttributes {
        let mut attrs = ContractAttributes::new(
            "UMP-TEST",
            ContractType::Ump,
            ContractRole::Rpa,
            d(2024, 1, 1),
            "USD",
        );
        attrs.initial_exchange_date = Some(d(2024, 1, 15));
        attrs.notional_principal = Some(10_000.0);
        attrs.nominal_interest_rate = Some(0.02);
        attrs.day_count_convention = Some(DayCountConvention::Actual360);
        attrs
    }

    fn overlay(callouts: &[(ActusDateTime, EventType, f64)]) -> BehavioralOverlay<ConstantObserver> {
        let mut overlay = BehavioralOverlay::new(ConstantObserver::new(0.0));
        for &(time, event_kind, payoff_hint) in callouts {
            overlay.add_callout(
                "UMP-TEST",
                CalloutEvent {
                    time,
                    event_kind,
                    payoff_hint,
                },
            );
        }
        overlay
    }

    #[test]
    fn test_deposit_and_withdrawal_move_balance() {
        let attrs = ump_attrs();
        let behavior = overlay(&[
            (d(2024, 3, 15), EventType::Pi, 5_000.0),
            (d(2024, 9, 15), EventType::Pr, 8_000.0),
        ]);
        let ctx = SimContext {
            attrs: &attrs,
            market: &behavior,
            behavior: Some(&behavior),
            children: None,
        };
        let mut events = Ump.schedule(&ctx).unwrap();
        actus_core::event::sort_events(&mut events);
        let mut state = Ump.initial_state(&ctx).unwrap();
        for event in &events {
            let payoff = Ump.payoff(event, &state, &ctx).unwrap();
            state = Ump.transition(event, &state, &ctx).unwrap();
            match event.event_kind {
                EventType::Pi => assert_relative_eq!(payoff, -5_000.0, epsilon = 1e-9),
                EventType::Pr => assert_relative_eq!(payoff, 8_000.0, epsilon = 1e-9),
                _ => {}
            }
        }
        // 10k + 5k - 8k = 7k; the closing MD event then clears it.
        assert_eq!(state.notional, 0.0);
    }

    #[test]
    fn test_horizon_closes_open_position() {
        let mut attrs = ump_attrs();
        attrs.horizon_date = Some(d(2025, 1, 15));
        let behavior = overlay(&[]);
        let ctx = SimContext {
            attrs: &attrs,
            market: &behavior,
            behavior: Some(&behavior),
            children: None,
        };
        let mut events = Ump.schedule(&ctx).unwrap();
        actus_core::event::sort_events(&mut events);
        assert_eq!(events.last().unwrap().event_kind, EventType::Md);

        let mut state = Ump.initial_state(&ctx).unwrap();
        let mut closing = 0.0;
        for event in &events {
            let payoff = Ump.payoff(event, &state, &ctx).unwrap();
            state = Ump.transition(event, &state, &ctx).unwrap();
            if event.event_kind == EventType::Md {
                closing = payoff;
            }
        }
        // One year at 2% on 10k, A/360 over 366 days.
        assert_relative_eq!(closing, 10_000.0 + 10_000.0 * 0.02 * 366.0 / 360.0, epsilon = 1e-6);
    }

    #[test]
    fn test_without_any_end_the_schedule_is_exchange_only() {
        let attrs = ump_attrs();
        let behavior = overlay(&[]);
        let ctx = SimContext {
            attrs: &attrs,
            market: &behavior,
            behavior: Some(&behavior),
            children: None,
        };
        let events = Ump.schedule(&ctx).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_kind, EventType::Ied);
    }
}
