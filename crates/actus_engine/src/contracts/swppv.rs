//! Plain vanilla interest rate swap (SWPPV) contracts.
//!
//! Two legs on one notional: a fixed leg at the contract rate and a floating
//! leg resetting from the market. The legs accrue separately
//! (`accrued_interest` fixed, `accrued_interest_2` floating); net mode pays
//! the difference at each IP date, gross mode emits one event per leg. At a
//! reset coinciding with a payment the payment runs first, so it uses the
//! rate fixed at the previous reset.

use actus_core::attributes::ContractAttributes;
use actus_core::event::ContractEvent;
use actus_core::state::ContractState;
use actus_core::types::enums::{DeliverySettlement, EventType};
use actus_core::types::error::EngineError;
use actus_core::types::time::ActusDateTime;

use crate::contracts::pam::{initial_exchange, maturity, push_contractual_events};
use crate::contracts::{apply_window, SimContext, VariantLogic};
use crate::functions::{clamp_rate, yf};
use crate::schedule::{expand_cycle, EventBuilder};

/// Plain vanilla swap variant record.
pub(crate) struct Swppv;

impl VariantLogic for Swppv {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        if attrs.initial_exchange_date.is_none() {
            return Err(attrs.invalid("initial_exchange_date is required"));
        }
        if attrs.maturity_date.is_none() {
            return Err(attrs.invalid("maturity_date is required"));
        }
        if attrs.notional_principal.is_none() {
            return Err(attrs.invalid("notional_principal is required"));
        }
        if attrs.nominal_interest_rate.is_none() {
            return Err(attrs.invalid("nominal_interest_rate (fixed leg) is required"));
        }
        if attrs.interest_payment_cycle.is_none() {
            return Err(attrs.invalid("interest_payment_cycle is required"));
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

        let cycle = attrs
            .interest_payment_cycle
            .ok_or_else(|| attrs.invalid("interest_payment_cycle is required"))?;
        let anchor = attrs.interest_payment_anchor.unwrap_or(ied);
        let gross = attrs.delivery_settlement == Some(DeliverySettlement::Settlement);
        for date in expand_cycle(anchor, Some(&cycle), md, attrs.end_of_month_convention) {
            if date <= ied || date >= md {
                continue;
            }
            if gross {
                builder.push(EventType::Ipfx, date);
                builder.push(EventType::Ipfl, date);
            } else {
                builder.push(EventType::Ip, date);
            }
        }

        if let Some(rr_cycle) = attrs.rate_reset_cycle {
            let rr_anchor = attrs
                .rate_reset_anchor
                .unwrap_or_else(|| rr_cycle.date_at(ied, 1, attrs.end_of_month_convention));
            for date in expand_cycle(rr_anchor, Some(&rr_cycle), md, attrs.end_of_month_convention)
            {
                if date > ied && date < md {
                    builder.push(EventType::Rr, date);
                }
            }
        }

        push_contractual_events(&mut builder, attrs);
        builder.push_unadjusted(EventType::Md, md);

        let mut events = builder.into_events();
        apply_window(&mut events, attrs);
        Ok(events)
    }

    fn initial_state(&self, ctx: &SimContext) -> Result<ContractState, EngineError> {
        let attrs = ctx.attrs;
        let mut state = ContractState::new(attrs.status_date);
        state.maturity_date = attrs.maturity_date;
        if initial_exchange(attrs)? < attrs.status_date {
            state = funded_state(attrs, attrs.status_date);
        }
        Ok(state)
    }

    fn payoff(
        &self,
        event: &ContractEvent,
        state: &ContractState,
        ctx: &SimContext,
    ) -> Result<f64, EngineError> {
        let attrs = ctx.attrs;
        let t = event.calculation_time;
        let (fixed, floating) = leg_totals(attrs, state, t);
        Ok(match event.event_kind {
            EventType::Ip | EventType::Md => fixed - floating,
            EventType::Ipfx => fixed,
            EventType::Ipfl => -floating,
            EventType::Td => attrs.role_sign() * attrs.price_at_termination_date.unwrap_or(0.0),
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
            EventType::Ied => funded_state(attrs, t),
            EventType::Ip => ContractState {
                status_date: t,
                accrued_interest: 0.0,
                accrued_interest_2: 0.0,
                ..*state
            },
            EventType::Ipfx => {
                let next = accrue_legs(attrs, state, t);
                ContractState {
                    accrued_interest: 0.0,
                    ..next
                }
            }
            EventType::Ipfl => {
                let next = accrue_legs(attrs, state, t);
                ContractState {
                    accrued_interest_2: 0.0,
                    ..next
                }
            }
            EventType::Rr => {
                // Both legs accrue at the old rates before the reset takes
                // effect.
                let accrued = accrue_legs(attrs, state, t);
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
            EventType::Md | EventType::Td => ContractState {
                status_date: t,
                notional: 0.0,
                accrued_interest: 0.0,
                accrued_interest_2: 0.0,
                ..*state
            },
            _ => accrue_legs(attrs, state, t),
        })
    }
}

fn funded_state(attrs: &ContractAttributes, t: ActusDateTime) -> ContractState {
    let mut state = ContractState::new(t);
    state.maturity_date = attrs.maturity_date;
    state.notional = attrs.role_sign() * attrs.notional_principal.unwrap_or(0.0);
    // The state rate is the floating leg; the fixed leg reads its rate from
    // the attributes.
    state.nominal_rate = attrs
        .nominal_interest_rate_2
        .or(attrs.nominal_interest_rate)
        .unwrap_or(0.0);
    state
}

/// Both legs brought up to `t`: `(fixed, floating)` totals.
fn leg_totals(attrs: &ContractAttributes, state: &ContractState, t: ActusDateTime) -> (f64, f64) {
    let elapsed = yf(attrs, state.status_date, t);
    let fixed_rate = attrs.nominal_interest_rate.unwrap_or(0.0);
    let fixed = state.accrued_interest + elapsed * fixed_rate * state.notional;
    let floating = state.accrued_interest_2 + elapsed * state.nominal_rate * state.notional;
    (fixed, floating)
}

fn accrue_legs(attrs: &ContractAttributes, state: &ContractState, t: ActusDateTime) -> ContractState {
    let (fixed, floating) = leg_totals(attrs, state, t);
    ContractState {
        status_date: t,
        accrued_interest: fixed,
        accrued_interest_2: floating,
        ..*state
    }
}
