//! Call money (CLM) contracts.
//!
//! Call money is an open-ended deposit: interest capitalizes on a cycle and
//! the contract ends when a call (an observed XD event) triggers settlement
//! after the notice period. An explicit maturity date, when present, caps
//! the life as usual.

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

/// Call money variant record.
pub(crate) struct Clm;

impl VariantLogic for Clm {
    fn validate(&self, attrs: &ContractAttributes) -> Result<(), EngineError> {
        require_funding_terms(attrs)
    }

    fn schedule(&self, ctx: &SimContext) -> Result<Vec<ContractEvent>, EngineError> {
        let attrs = ctx.attrs;
        let ied = initial_exchange(attrs)?;
        let callouts = ctx.callouts();
        let end = simulation_end(attrs, callouts.iter().map(|c| c.time));
        let mut builder = EventBuilder::new(attrs);

        if ied >= attrs.status_date {
            builder.push(EventType::Ied, ied);
        }

        // Interest capitalizes while the deposit is open.
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
        }

        // A call fixes the settlement amount; payment follows the notice
        // period. Without a notice period the call settles immediately.
        for callout in &callouts {
            if callout.event_kind == EventType::Xd && callout.time >= attrs.status_date {
                builder.push_unadjusted(EventType::Xd, callout.time);
                if attrs.settlement_period.is_some() {
                    builder.push_unadjusted(EventType::Std, settlement_time(attrs, callout.time));
                }
            }
        }

        if let Some(md) = attrs.maturity_date {
            builder.push_unadjusted(EventType::Md, md);
        }
        push_contractual_events(&mut builder, attrs);

        let mut events = builder.into_events();
        merge_callouts(&mut events, ctx, &[EventType::Ce]);
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
            EventType::Xd if attrs.settlement_period.is_none() => {
                pof_maturity(attrs, state, t, state.notional)
            }
            EventType::Std => state.notional_scaling * state.exercise_amount,
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
            EventType::Xd => {
                if attrs.settlement_period.is_none() {
                    // Immediate settlement: the call pays out and closes.
                    let mut settled = pam::stf_maturity(state, t);
                    settled.exercise_date = Some(t);
                    settled
                } else {
                    let accrued = accrue_on_notional(attrs, state, t);
                    ContractState {
                        exercise_date: Some(t),
                        exercise_amount: accrued.notional + accrued.accrued_interest,
                        ..accrued
                    }
                }
            }
            EventType::Std => ContractState {
                status_date: t,
                notional: 0.0,
                accrued_interest: 0.0,
                exercise_amount: 0.0,
                ..*state
            },
            EventType::Md => pam::stf_maturity(state, t),
            EventType::Ce => pam::stf_credit_event(ctx, state, t),
            _ => accrue_on_notional(attrs, state, t),
        })
    }
}

/// The last date worth scheduling cyclical events for: maturity, the
/// explicit horizon, or the latest observed callout.
fn simulation_end(
    attrs: &ContractAttributes,
    callout_times: impl Iterator<Item = ActusDateTime>,
) -> Option<ActusDateTime> {
    attrs
        .maturity_date
        .or(attrs.horizon_date)
        .or_else(|| callout_times.max())
}

/// Exercise time plus the notice period.
fn settlement_time(attrs: &ContractAttributes, exercise: ActusDateTime) -> ActusDateTime {
    match attrs.settlement_period {
        Some(cycle) => cycle.date_at(exercise, 1, attrs.end_of_month_convention),
        None => exercise,
    }
}
